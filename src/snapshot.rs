//! End-of-step hand-off: a serializable picture of every live entity plus the events raised
//! during the step, stored in `FrameReport` for renderers, HUDs and audio.

use bevy::prelude::*;
use serde::Serialize;

use crate::app::Expired;
use crate::collision::{Door, Hazardous, Hookable, Orientation, Platform};
use crate::config::SimClock;
use crate::enemy::{Enemy, EnemyKind};
use crate::events::GameEvent;
use crate::grapple::{Grapple, GrapplePhase};
use crate::interaction::{KeyItem, LevelExit, Pickup, Spike};
use crate::level::PickupKind;
use crate::movement::{Collider, MovementState, Velocity};
use crate::player::{Dash, Health, Invulnerability, KeyRing, Player, SpeedBoost};
use crate::projectile::{heading_degrees, Projectile, ProjectileKind};
use crate::state::SimSet;
use crate::weapons::{Arsenal, WeaponId};

pub struct SnapshotPlugin;

impl Plugin for SnapshotPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FrameReport>()
            .add_systems(Update, publish_frame.in_set(SimSet::Output));
    }
}

/// Axis-aligned box in world units, top-left origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn of(transform: &Transform, collider: &Collider) -> Self {
        let size = collider.size();
        let top_left = transform.translation.truncate() - collider.half_extents;
        Self {
            x: top_left.x,
            y: top_left.y,
            width: size.x,
            height: size.y,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WeaponView {
    pub weapon: WeaponId,
    pub ammo: u32,
    pub max_ammo: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PlayerView {
    pub bounds: Bounds,
    pub health: f32,
    pub max_health: f32,
    pub on_ground: bool,
    pub jump_count: u8,
    pub facing: f32,
    pub invulnerable: bool,
    pub dashing: bool,
    pub speed_boosted: bool,
    pub reloading: bool,
    pub current_weapon: WeaponId,
    pub weapons: Vec<WeaponView>,
    pub charge_powerup_owned: bool,
    pub powerup_charge: f32,
    pub red_charge: f32,
    pub purple_charge: f32,
    pub grapple_seeking: bool,
    /// Anchor point while the hook is attached.
    pub grapple_point: Option<Vec2>,
    pub keys: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnemyView {
    pub entity: Entity,
    pub kind: EnemyKind,
    pub bounds: Bounds,
    pub health: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectileView {
    pub entity: Entity,
    pub kind: ProjectileKind,
    pub bounds: Bounds,
    /// Heading in degrees, counter-clockwise from +x with y up.
    pub angle: f32,
    pub charge: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryView {
    Platform {
        bounds: Bounds,
        orientation: Orientation,
        hazardous: bool,
        hookable: bool,
    },
    Door {
        bounds: Bounds,
        id: String,
        open: bool,
        hazardous: bool,
        hookable: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemView {
    Pickup { bounds: Bounds, kind: PickupKind },
    Key { bounds: Bounds, id: String, color: [u8; 3] },
    Spike { bounds: Bounds, instant_kill: bool },
    Exit { bounds: Bounds },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub player: Option<PlayerView>,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub geometry: Vec<GeometryView>,
    pub items: Vec<ItemView>,
}

/// Latest completed step. Overwritten every step; collaborators copy what they need.
#[derive(Resource, Clone, Debug, Default, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub time_ms: u64,
    pub events: Vec<GameEvent>,
    pub snapshot: WorldSnapshot,
}

type PlayerData<'a> = (
    &'a Transform,
    &'a Collider,
    &'a Health,
    &'a MovementState,
    &'a Invulnerability,
    &'a Dash,
    &'a SpeedBoost,
    &'a Arsenal,
    &'a Grapple,
    &'a KeyRing,
);

fn player_view(
    (transform, collider, health, state, invulnerability, dash, boost, arsenal, grapple, keys): PlayerData,
) -> PlayerView {
    let grapple_point = match grapple.phase {
        GrapplePhase::Attached { point, .. } => Some(point),
        _ => None,
    };
    PlayerView {
        bounds: Bounds::of(transform, collider),
        health: health.current,
        max_health: health.max,
        on_ground: state.on_ground,
        jump_count: state.jump_count,
        facing: dash.facing,
        invulnerable: invulnerability.is_active(),
        dashing: dash.is_active(),
        speed_boosted: boost.is_active(),
        reloading: arsenal.is_reloading(),
        current_weapon: arsenal.current,
        weapons: arsenal
            .slots
            .iter()
            .filter(|(weapon, _)| arsenal.owns(**weapon))
            .map(|(weapon, slot)| WeaponView {
                weapon: *weapon,
                ammo: slot.current_ammo,
                max_ammo: slot.max_ammo,
            })
            .collect(),
        charge_powerup_owned: arsenal.charge_powerup,
        powerup_charge: arsenal.charges.powerup.level(),
        red_charge: arsenal.charges.red.level(),
        purple_charge: arsenal.charges.purple.level(),
        grapple_seeking: grapple.is_seeking(),
        grapple_point,
        keys: keys.iter().cloned().collect(),
    }
}

#[allow(clippy::too_many_arguments, clippy::type_complexity)]
fn publish_frame(
    clock: Res<SimClock>,
    mut events: EventReader<GameEvent>,
    mut report: ResMut<FrameReport>,
    player: Query<PlayerData, With<Player>>,
    enemies: Query<(Entity, &Transform, &Collider, &Enemy), Without<Expired>>,
    projectiles: Query<(Entity, &Transform, &Collider, &Velocity, &Projectile), Without<Expired>>,
    platforms: Query<(&Transform, &Collider, &Platform, Has<Hazardous>, Has<Hookable>)>,
    doors: Query<(&Transform, &Collider, &Door, Has<Hazardous>, Has<Hookable>)>,
    pickups: Query<(&Transform, &Collider, &Pickup), Without<Expired>>,
    keys: Query<(&Transform, &Collider, &KeyItem), Without<Expired>>,
    spikes: Query<(&Transform, &Collider, &Spike)>,
    exits: Query<(&Transform, &Collider), With<LevelExit>>,
) {
    let mut snapshot = WorldSnapshot {
        player: player.get_single().ok().map(player_view),
        ..default()
    };

    snapshot.enemies = enemies
        .iter()
        .map(|(entity, transform, collider, enemy)| EnemyView {
            entity,
            kind: enemy.kind,
            bounds: Bounds::of(transform, collider),
            health: enemy.health,
        })
        .collect();

    snapshot.projectiles = projectiles
        .iter()
        .map(|(entity, transform, collider, velocity, projectile)| ProjectileView {
            entity,
            kind: projectile.kind,
            bounds: Bounds::of(transform, collider),
            angle: heading_degrees(velocity.0),
            charge: projectile.charge,
        })
        .collect();

    for (transform, collider, platform, hazardous, hookable) in &platforms {
        snapshot.geometry.push(GeometryView::Platform {
            bounds: Bounds::of(transform, collider),
            orientation: platform.orientation,
            hazardous,
            hookable,
        });
    }
    for (transform, collider, door, hazardous, hookable) in &doors {
        snapshot.geometry.push(GeometryView::Door {
            bounds: Bounds::of(transform, collider),
            id: door.id.clone(),
            open: door.open,
            hazardous,
            hookable,
        });
    }

    for (transform, collider, pickup) in &pickups {
        snapshot.items.push(ItemView::Pickup {
            bounds: Bounds::of(transform, collider),
            kind: pickup.kind,
        });
    }
    for (transform, collider, key) in &keys {
        snapshot.items.push(ItemView::Key {
            bounds: Bounds::of(transform, collider),
            id: key.id.clone(),
            color: key.color,
        });
    }
    for (transform, collider, spike) in &spikes {
        snapshot.items.push(ItemView::Spike {
            bounds: Bounds::of(transform, collider),
            instant_kill: spike.instant_kill,
        });
    }
    for (transform, collider) in &exits {
        snapshot.items.push(ItemView::Exit {
            bounds: Bounds::of(transform, collider),
        });
    }

    *report = FrameReport {
        frame: clock.frame,
        time_ms: clock.now_ms,
        events: events.read().cloned().collect(),
        snapshot,
    };
}
