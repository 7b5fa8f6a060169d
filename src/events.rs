//! Discrete events crossing the simulation boundary, plus the internal signals that connect the
//! projectile pass to explosion resolution and door unlocking.

use bevy::prelude::*;
use serde::Serialize;

use crate::enemy::EnemyKind;
use crate::level::PickupKind;
use crate::projectile::ProjectileKind;
use crate::weapons::WeaponId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Player,
    Enemy(EnemyKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSource {
    Enemy,
    Spike,
    Hazard,
    Projectile,
    Explosion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetachReason {
    /// Pulled within release distance of the anchor.
    Arrived,
    /// Secondary input released before the hook found anything.
    Released,
    /// Jump, dash or weapon switch.
    Cancelled,
    /// The anchored geometry stopped being solid.
    TargetLost,
}

/// Events for scoring, HUD and audio collaborators. Entity ids are serialized as raw bits.
#[derive(Event, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    DamageTaken {
        entity: Entity,
        amount: f32,
        source: DamageSource,
    },
    Died {
        entity: Entity,
        actor: ActorKind,
    },
    PickupCollected {
        kind: PickupKind,
    },
    KeyCollected {
        key_id: String,
    },
    DoorOpened {
        entity: Entity,
        door_id: String,
    },
    LevelExitReached,
    WeaponEquipped {
        weapon: WeaponId,
    },
    ExplosionTriggered {
        at: Vec2,
        radius: f32,
    },
    GrappleAttached {
        target: Entity,
        point: Vec2,
    },
    GrappleDetached {
        reason: DetachReason,
    },
    ShotFired {
        weapon: Option<WeaponId>,
        kind: ProjectileKind,
    },
    DashStarted,
    ReloadStarted {
        weapon: WeaponId,
    },
    ReloadFinished {
        weapon: WeaponId,
    },
}

/// An explosive projectile hit geometry or left the world envelope.
#[derive(Event, Clone, Copy, Debug)]
pub struct Detonation {
    pub projectile: Entity,
    pub at: Vec2,
}

/// A projectile struck a piece of solid geometry this frame.
#[derive(Event, Clone, Copy, Debug)]
pub struct ProjectileImpact {
    pub projectile: Entity,
    pub target: Entity,
    pub weapon: Option<WeaponId>,
}
