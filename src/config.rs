//! Tuning constants and the deterministic simulation clock.
//!
//! `SimConfig` is built once (usually through `Default`) and read by every system through
//! `Res<SimConfig>`. Nothing in the simulation stores a copy of it on entities, so an embedding
//! application can swap it between levels without touching live components.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::weapons::{default_loadout, WeaponId, WeaponSlot};

#[derive(Resource, Clone, Debug)]
pub struct SimConfig {
    /// Milliseconds the clock advances per step. 16 ms approximates 60 steps per second.
    pub frame_ms: u64,
    /// Added to body vertical velocity every frame (y grows downwards).
    pub gravity: f32,
    /// Lighter gravity applied to every projectile.
    pub projectile_gravity: f32,
    pub grid_size: f32,
    /// World size used when a level definition does not provide one.
    pub default_world_size: Vec2,
    /// Time for any charge tracker to saturate at level 1.
    pub charge_duration_ms: u64,
    /// Start each level inside an invulnerability window.
    pub spawn_invulnerable: bool,
    pub player: PlayerTuning,
    pub dash: DashTuning,
    pub sniper: SniperTuning,
    pub arc: ArcTuning,
    pub hook: HookTuning,
    pub chaser: ChaserTuning,
    pub patrol: PatrolTuning,
    pub contact: ContactTuning,
    pub items: ItemTuning,
    pub explosion: ExplosionTuning,
    pub weapons: BTreeMap<WeaponId, WeaponSlot>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let grid_size = 50.0;
        Self {
            frame_ms: 16,
            gravity: 0.5,
            projectile_gravity: 0.2,
            grid_size,
            default_world_size: Vec2::new(2400.0, 1800.0),
            charge_duration_ms: 2000,
            spawn_invulnerable: true,
            player: PlayerTuning::default(),
            dash: DashTuning::default(),
            sniper: SniperTuning::default(),
            arc: ArcTuning::default(),
            hook: HookTuning {
                range: 6.0 * grid_size,
                ..default()
            },
            chaser: ChaserTuning::default(),
            patrol: PatrolTuning::default(),
            contact: ContactTuning::default(),
            items: ItemTuning::default(),
            explosion: ExplosionTuning::default(),
            weapons: default_loadout(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlayerTuning {
    pub size: Vec2,
    /// Horizontal units per frame.
    pub speed: f32,
    pub max_health: f32,
    pub jump_impulse: f32,
    pub max_jumps: u8,
    pub invulnerability_ms: u64,
    pub speed_boost_multiplier: f32,
    pub speed_boost_ms: u64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: Vec2::new(35.0, 45.0),
            speed: 5.0,
            max_health: 100.0,
            jump_impulse: -12.0,
            max_jumps: 2,
            invulnerability_ms: 2000,
            speed_boost_multiplier: 1.5,
            speed_boost_ms: 5000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct DashTuning {
    pub multiplier: f32,
    pub duration_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for DashTuning {
    fn default() -> Self {
        Self {
            multiplier: 3.0,
            duration_ms: 150,
            cooldown_ms: 1000,
        }
    }
}

/// Charged-sniper interpolation bounds (level 0 maps to `min_*`, level 1 to `max_*`).
#[derive(Clone, Debug)]
pub struct SniperTuning {
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_damage: f32,
    pub max_damage: f32,
    pub size: Vec2,
}

impl Default for SniperTuning {
    fn default() -> Self {
        Self {
            min_speed: 20.0,
            max_speed: 50.0,
            min_damage: 2.0,
            max_damage: 10.0,
            size: Vec2::new(20.0, 10.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ArcTuning {
    pub speed_factor: f32,
    pub max_height: f32,
    pub size: Vec2,
}

impl Default for ArcTuning {
    fn default() -> Self {
        Self {
            speed_factor: 0.05,
            max_height: 200.0,
            size: Vec2::splat(18.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HookTuning {
    /// Maximum distance between the player center and the hook endpoint.
    pub range: f32,
    pub pull_speed: f32,
    /// Side of the square tested against hookable geometry.
    pub detection_size: f32,
    pub release_distance: f32,
}

impl Default for HookTuning {
    fn default() -> Self {
        Self {
            range: 300.0,
            pull_speed: 25.0,
            detection_size: 30.0,
            release_distance: 10.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChaserTuning {
    pub size: Vec2,
    pub speed: f32,
    pub health: f32,
    pub detection_range: f32,
    /// Horizontal gap below which the chaser stops stepping towards the player.
    pub stop_distance: f32,
}

impl Default for ChaserTuning {
    fn default() -> Self {
        Self {
            size: Vec2::splat(40.0),
            speed: 2.0,
            health: 3.0,
            detection_range: 300.0,
            stop_distance: 5.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PatrolTuning {
    pub size: Vec2,
    pub speed: f32,
    pub health: f32,
    pub half_range: f32,
}

impl Default for PatrolTuning {
    fn default() -> Self {
        Self {
            size: Vec2::splat(35.0),
            speed: 1.5,
            health: 2.0,
            half_range: 100.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ContactTuning {
    pub enemy_damage: f32,
    pub spike_damage: f32,
    pub health_pickup: f32,
    /// Inflation applied to the player rect when testing "touching" contacts.
    pub touch_margin: f32,
}

impl Default for ContactTuning {
    fn default() -> Self {
        Self {
            enemy_damage: 10.0,
            spike_damage: 20.0,
            health_pickup: 25.0,
            touch_margin: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ItemTuning {
    pub spike_size: Vec2,
    pub key_size: Vec2,
    pub score_pickup_size: Vec2,
    pub pickup_size: Vec2,
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            spike_size: Vec2::new(30.0, 20.0),
            key_size: Vec2::splat(20.0),
            score_pickup_size: Vec2::splat(20.0),
            pickup_size: Vec2::splat(25.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExplosionTuning {
    pub shrapnel_count: u32,
    pub shrapnel_speed: f32,
    pub shrapnel_damage: f32,
    pub shrapnel_bounces: u32,
    pub shrapnel_size: Vec2,
    pub area_radius: f32,
    pub area_damage: f32,
}

impl Default for ExplosionTuning {
    fn default() -> Self {
        Self {
            shrapnel_count: 8,
            shrapnel_speed: 15.0,
            shrapnel_damage: 1.0,
            shrapnel_bounces: 2,
            shrapnel_size: Vec2::splat(6.0),
            area_radius: 80.0,
            area_damage: 2.0,
        }
    }
}

/// Frame counter plus a millisecond timestamp. Every ability timer compares against `now_ms`
/// instead of the host clock, so a step always observes the same time for all entities.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimClock {
    pub frame: u64,
    pub now_ms: u64,
}

impl SimClock {
    pub fn advance(&mut self, frame_ms: u64) {
        self.frame += 1;
        self.now_ms += frame_ms;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub(crate) fn advance_clock(config: Res<SimConfig>, mut clock: ResMut<SimClock>) {
    clock.advance(config.frame_ms);
}
