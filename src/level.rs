//! Level orchestration: validates a level definition handed over by the loading collaborator,
//! then replaces every level entity with freshly spawned ones.
//!
//! The definition is plain serde data. Rect geometry (platforms, doors, exit) and spikes use
//! top-left coordinates as authored; actors, pickups and keys are placed by their center.

use std::collections::BTreeSet;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::{Door, Hazardous, Hookable, Orientation, Platform, Solid, SolidGeometry};
use crate::config::{SimClock, SimConfig};
use crate::enemy::{spawn_enemy, Behavior, EnemyKind};
use crate::error::ConfigError;
use crate::input::PlayerIntents;
use crate::interaction::{KeyItem, LevelExit, Pickup, Spike};
use crate::movement::Collider;
use crate::player::spawn_player;
use crate::state::GameState;
use crate::weapons::WeaponId;

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelBounds>().add_systems(
            Update,
            spawn_pending_level.run_if(resource_exists::<PendingLevel>),
        );
    }
}

/// Tags everything that belongs to the running level so a restart can sweep it.
#[derive(Component, Default)]
pub struct LevelEntity;

/// World size of the running level. Projectiles are culled once they leave the envelope
/// `[-width, 2 * width] x [-height, 2 * height]`.
#[derive(Resource, Clone, Copy, Debug)]
pub struct LevelBounds {
    pub size: Vec2,
}

impl Default for LevelBounds {
    fn default() -> Self {
        Self {
            size: SimConfig::default().default_world_size,
        }
    }
}

impl LevelBounds {
    pub fn in_envelope(&self, rect: Rect) -> bool {
        let Vec2 { x: w, y: h } = self.size;
        !(rect.max.x < -w || rect.min.x > 2.0 * w || rect.max.y < -h || rect.min.y > 2.0 * h)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RectDef {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectDef {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y) + self.size() * 0.5
    }

    /// Raises non-positive dimensions to one unit.
    pub fn clamped(&self, what: &str) -> Self {
        let mut rect = *self;
        if rect.width < 1.0 || rect.height < 1.0 {
            warn!(
                "{} size {}x{} out of range; clamped to at least 1x1",
                what, rect.width, rect.height
            );
            rect.width = rect.width.max(1.0);
            rect.height = rect.height.max(1.0);
        }
        rect
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformDef {
    #[serde(flatten)]
    pub rect: RectDef,
    pub orientation: Orientation,
    pub hazardous: bool,
    pub hookable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnemyDef {
    Chaser {
        position: Vec2,
        #[serde(default)]
        detection_range: Option<f32>,
    },
    Patrol {
        position: Vec2,
        /// Half-width of the patrol, measured from the spawn x.
        #[serde(default)]
        range: Option<f32>,
    },
}

impl EnemyDef {
    pub fn kind(&self) -> EnemyKind {
        match self {
            EnemyDef::Chaser { .. } => EnemyKind::Chaser,
            EnemyDef::Patrol { .. } => EnemyKind::Patrol,
        }
    }

    pub fn position(&self) -> Vec2 {
        match self {
            EnemyDef::Chaser { position, .. } | EnemyDef::Patrol { position, .. } => *position,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    Score,
    Health,
    Speed,
    ChargePowerup,
    BlueWeaponPowerup,
    RedWeaponPowerup,
    PurpleWeaponPowerup,
}

impl PickupKind {
    pub fn weapon(&self) -> Option<WeaponId> {
        match self {
            PickupKind::BlueWeaponPowerup => Some(WeaponId::Blue),
            PickupKind::RedWeaponPowerup => Some(WeaponId::Red),
            PickupKind::PurpleWeaponPowerup => Some(WeaponId::Purple),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickupDef {
    pub kind: PickupKind,
    pub position: Vec2,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDef {
    /// Top-left corner.
    pub position: Vec2,
    #[serde(default)]
    pub instant_kill: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyDef {
    pub id: String,
    pub position: Vec2,
    #[serde(default)]
    pub color: [u8; 3],
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorDef {
    pub id: String,
    #[serde(flatten)]
    pub rect: RectDef,
    pub required_key_id: Option<String>,
    pub required_weapon: Option<String>,
    pub hazardous: bool,
    pub hookable: bool,
}

/// Level description supplied by the loading collaborator. Every list is optional; missing
/// flags default to inert values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDefinition {
    pub world_size: Option<Vec2>,
    pub player_start: Option<Vec2>,
    pub platforms: Vec<PlatformDef>,
    pub enemies: Vec<EnemyDef>,
    pub pickups: Vec<PickupDef>,
    pub obstacles: Vec<ObstacleDef>,
    pub keys: Vec<KeyDef>,
    pub doors: Vec<DoorDef>,
    pub exit: Option<RectDef>,
}

/// A definition that passed validation, with out-of-range values already clamped.
#[derive(Clone, Debug)]
pub struct ValidatedLevel {
    pub world_size: Vec2,
    pub player_start: Vec2,
    pub exit: RectDef,
    pub platforms: Vec<PlatformDef>,
    pub enemies: Vec<EnemyDef>,
    pub pickups: Vec<PickupDef>,
    pub obstacles: Vec<ObstacleDef>,
    pub keys: Vec<KeyDef>,
    pub doors: Vec<(DoorDef, Option<WeaponId>)>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn clamp_range(value: Option<f32>, what: &str) -> Option<f32> {
    value.map(|range| {
        if range >= 0.0 {
            range
        } else {
            warn!("{} {} out of range; clamped to 0", what, range);
            0.0
        }
    })
}

impl LevelDefinition {
    pub fn validate(&self, config: &SimConfig) -> Result<ValidatedLevel, ConfigError> {
        let player_start = self.player_start.ok_or(ConfigError::MissingPlayerStart)?;
        let exit = self.exit.ok_or(ConfigError::MissingExit)?.clamped("exit");

        let mut door_ids = BTreeSet::new();
        let mut doors = Vec::with_capacity(self.doors.len());
        for door in &self.doors {
            if !door.id.is_empty() && !door_ids.insert(door.id.clone()) {
                return Err(ConfigError::DuplicateDoorId(door.id.clone()));
            }
            let weapon = match non_empty(&door.required_weapon) {
                Some(name) => Some(WeaponId::parse(name).ok_or_else(|| {
                    ConfigError::UnknownWeapon {
                        door: door.id.clone(),
                        weapon: name.to_owned(),
                    }
                })?),
                None => None,
            };
            let mut door = door.clone();
            door.rect = door.rect.clamped("door");
            door.required_key_id = non_empty(&door.required_key_id).map(str::to_owned);
            doors.push((door, weapon));
        }

        let world_size = self
            .world_size
            .unwrap_or(config.default_world_size)
            .max(Vec2::ONE);

        Ok(ValidatedLevel {
            world_size,
            player_start,
            exit,
            platforms: self
                .platforms
                .iter()
                .map(|platform| PlatformDef {
                    rect: platform.rect.clamped("platform"),
                    ..platform.clone()
                })
                .collect(),
            enemies: self
                .enemies
                .iter()
                .map(|enemy| match enemy {
                    EnemyDef::Chaser {
                        position,
                        detection_range,
                    } => EnemyDef::Chaser {
                        position: *position,
                        detection_range: clamp_range(*detection_range, "detection range"),
                    },
                    EnemyDef::Patrol { position, range } => EnemyDef::Patrol {
                        position: *position,
                        range: clamp_range(*range, "patrol range"),
                    },
                })
                .collect(),
            pickups: self.pickups.clone(),
            obstacles: self.obstacles.clone(),
            keys: self.keys.clone(),
            doors,
        })
    }
}

/// Level waiting to be spawned on the next update.
#[derive(Resource)]
pub struct PendingLevel(pub ValidatedLevel);

/// Validates `definition` and schedules it to replace whatever level is running. On error the
/// world is left untouched and the simulation does not start.
pub fn start_level(world: &mut World, definition: &LevelDefinition) -> Result<(), ConfigError> {
    let validated = {
        let config = world.get_resource_or_insert_with(SimConfig::default);
        definition.validate(&config)?
    };
    world.insert_resource(PendingLevel(validated));
    if let Some(mut next) = world.get_resource_mut::<NextState<GameState>>() {
        next.set(GameState::Loading);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn spawn_pending_level(
    mut commands: Commands,
    pending: Res<PendingLevel>,
    config: Res<SimConfig>,
    existing: Query<Entity, With<LevelEntity>>,
    mut clock: ResMut<SimClock>,
    mut intents: ResMut<PlayerIntents>,
    mut geometry: ResMut<SolidGeometry>,
    mut bounds: ResMut<LevelBounds>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for entity in &existing {
        commands.entity(entity).despawn_recursive();
    }
    clock.reset();
    intents.clear();
    geometry.clear();

    let level = &pending.0;
    bounds.size = level.world_size;

    spawn_player(&mut commands, &config, &clock, level.player_start);

    for platform in &level.platforms {
        let mut entity = commands.spawn((
            Name::new("Platform"),
            LevelEntity,
            Solid,
            Platform {
                orientation: platform.orientation,
            },
            Transform::from_translation(platform.rect.center().extend(0.0)),
            Collider::from_size(platform.rect.size()),
        ));
        if platform.hazardous {
            entity.insert(Hazardous);
        }
        if platform.hookable {
            entity.insert(Hookable);
        }
    }

    for (door, weapon) in &level.doors {
        let mut entity = commands.spawn((
            Name::new(format!("Door {}", door.id)),
            LevelEntity,
            Solid,
            Door {
                id: door.id.clone(),
                open: false,
                required_key: door.required_key_id.clone(),
                required_weapon: *weapon,
            },
            Transform::from_translation(door.rect.center().extend(0.0)),
            Collider::from_size(door.rect.size()),
        ));
        if door.hazardous {
            entity.insert(Hazardous);
        }
        if door.hookable {
            entity.insert(Hookable);
        }
    }

    for enemy in &level.enemies {
        let position = enemy.position();
        let behavior = match enemy {
            EnemyDef::Chaser {
                detection_range, ..
            } => Behavior::Chaser {
                detection_range: detection_range.unwrap_or(config.chaser.detection_range),
            },
            EnemyDef::Patrol { range, .. } => Behavior::Patrol {
                origin_x: position.x,
                half_range: range.unwrap_or(config.patrol.half_range),
                direction: 1.0,
            },
        };
        spawn_enemy(&mut commands, &config, enemy.kind(), position, behavior);
    }

    for pickup in &level.pickups {
        let size = if pickup.kind == PickupKind::Score {
            config.items.score_pickup_size
        } else {
            config.items.pickup_size
        };
        commands.spawn((
            Name::new(format!("{:?}", pickup.kind)),
            LevelEntity,
            Pickup { kind: pickup.kind },
            Transform::from_translation(pickup.position.extend(0.5)),
            Collider::from_size(size),
        ));
    }

    for obstacle in &level.obstacles {
        let size = config.items.spike_size;
        commands.spawn((
            Name::new("Spike"),
            LevelEntity,
            Spike {
                instant_kill: obstacle.instant_kill,
            },
            Transform::from_translation((obstacle.position + size * 0.5).extend(0.5)),
            Collider::from_size(size),
        ));
    }

    for key in &level.keys {
        commands.spawn((
            Name::new(format!("Key {}", key.id)),
            LevelEntity,
            KeyItem {
                id: key.id.clone(),
                color: key.color,
            },
            Transform::from_translation(key.position.extend(0.5)),
            Collider::from_size(config.items.key_size),
        ));
    }

    commands.spawn((
        Name::new("LevelExit"),
        LevelEntity,
        LevelExit,
        Transform::from_translation(level.exit.center().extend(0.0)),
        Collider::from_size(level.exit.size()),
    ));

    info!(
        "Level spawned: {} platforms, {} doors, {} enemies, {} pickups, {} spikes, {} keys",
        level.platforms.len(),
        level.doors.len(),
        level.enemies.len(),
        level.pickups.len(),
        level.obstacles.len(),
        level.keys.len()
    );

    commands.remove_resource::<PendingLevel>();
    next_state.set(GameState::Playing);
}
