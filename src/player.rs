//! Player entity: the avatar's components and its damage/heal contracts.
//!
//! Spawning happens through `spawn_player`, called by the level loader, so a level restart builds
//! the player from scratch instead of patching a surviving entity.

use std::collections::BTreeSet;

use bevy::prelude::*;

use crate::config::{SimClock, SimConfig};
use crate::grapple::Grapple;
use crate::level::LevelEntity;
use crate::movement::{Collider, MovementState, Velocity};
use crate::weapons::Arsenal;

/// Marker used by every system that needs to find the avatar.
#[derive(Component)]
pub struct Player;

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Subtracts `amount`, never going below zero. Returns true if this brought health to zero.
    pub fn damage(&mut self, amount: f32) -> bool {
        let was_alive = self.current > 0.0;
        self.current = (self.current - amount.max(0.0)).max(0.0);
        was_alive && self.current <= 0.0
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Invulnerability {
    pub started_ms: Option<u64>,
}

impl Invulnerability {
    pub fn is_active(&self) -> bool {
        self.started_ms.is_some()
    }

    pub fn begin(&mut self, now_ms: u64) {
        self.started_ms = Some(now_ms);
    }

    /// Ends the window once more than `duration_ms` has passed.
    pub fn tick(&mut self, now_ms: u64, duration_ms: u64) {
        if let Some(started) = self.started_ms {
            if now_ms.saturating_sub(started) > duration_ms {
                self.started_ms = None;
            }
        }
    }
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Dash {
    pub started_ms: Option<u64>,
    pub last_trigger_ms: Option<u64>,
    /// +1 facing right, -1 facing left. Updated by horizontal movement intents.
    pub facing: f32,
}

impl Default for Dash {
    fn default() -> Self {
        Self {
            started_ms: None,
            last_trigger_ms: None,
            facing: 1.0,
        }
    }
}

impl Dash {
    pub fn is_active(&self) -> bool {
        self.started_ms.is_some()
    }

    /// Enters the dash unless one is running or the cooldown has not elapsed since the last
    /// trigger.
    pub fn trigger(&mut self, now_ms: u64, cooldown_ms: u64) -> bool {
        if self.is_active() {
            return false;
        }
        if let Some(last) = self.last_trigger_ms {
            if now_ms.saturating_sub(last) <= cooldown_ms {
                return false;
            }
        }
        self.started_ms = Some(now_ms);
        self.last_trigger_ms = Some(now_ms);
        true
    }

    pub fn tick(&mut self, now_ms: u64, duration_ms: u64) {
        if let Some(started) = self.started_ms {
            if now_ms.saturating_sub(started) > duration_ms {
                self.started_ms = None;
            }
        }
    }
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct SpeedBoost {
    pub started_ms: Option<u64>,
}

impl SpeedBoost {
    pub fn is_active(&self) -> bool {
        self.started_ms.is_some()
    }

    pub fn tick(&mut self, now_ms: u64, duration_ms: u64) {
        if let Some(started) = self.started_ms {
            if now_ms.saturating_sub(started) > duration_ms {
                self.started_ms = None;
            }
        }
    }
}

/// Ids of every key collected during the current level.
#[derive(Component, Clone, Debug, Default, Deref, DerefMut)]
pub struct KeyRing(pub BTreeSet<String>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Invulnerable or already dead; nothing changed.
    Blocked,
    Hurt,
    Killed,
}

/// Applies `amount` unless the player is invulnerable, then opens a fresh invulnerability window.
pub fn apply_player_damage(
    health: &mut Health,
    invulnerability: &mut Invulnerability,
    amount: f32,
    now_ms: u64,
) -> DamageOutcome {
    if invulnerability.is_active() || health.is_dead() {
        return DamageOutcome::Blocked;
    }
    invulnerability.begin(now_ms);
    if health.damage(amount) {
        DamageOutcome::Killed
    } else {
        DamageOutcome::Hurt
    }
}

/// Kills the player regardless of remaining health. Invulnerability still protects.
pub fn kill_player(
    health: &mut Health,
    invulnerability: &mut Invulnerability,
    now_ms: u64,
) -> DamageOutcome {
    let amount = health.current;
    apply_player_damage(health, invulnerability, amount, now_ms)
}

pub fn spawn_player(commands: &mut Commands, config: &SimConfig, clock: &SimClock, start: Vec2) -> Entity {
    let invulnerability = Invulnerability {
        started_ms: config.spawn_invulnerable.then_some(clock.now_ms),
    };
    commands
        .spawn((
            (
                Name::new("Player"),
                Player,
                LevelEntity,
                Transform::from_translation(start.extend(1.0)),
                Velocity::default(),
                MovementState::default(),
                Collider::from_size(config.player.size),
            ),
            (
                Health::full(config.player.max_health),
                invulnerability,
                Dash::default(),
                SpeedBoost::default(),
                KeyRing::default(),
                Arsenal::new(config.weapons.clone()),
                Grapple::default(),
            ),
        ))
        .id()
}
