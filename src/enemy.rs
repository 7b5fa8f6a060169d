//! Hostile actors. Both kinds share the player's body integration; only the horizontal intent
//! differs between the chaser and the patrol behaviour.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::app::Expired;
use crate::collision::SolidGeometry;
use crate::config::SimConfig;
use crate::events::{ActorKind, DamageSource, GameEvent};
use crate::level::LevelEntity;
use crate::movement::{step_body, Collider, MovementState, Velocity};
use crate::player::Player;
use crate::state::SimSet;

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, drive_enemies.in_set(SimSet::Enemies));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Chaser,
    Patrol,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub health: f32,
}

impl Enemy {
    /// Subtracts `amount`. Returns true only on the hit that brings health to zero or below, so
    /// a corpse hit twice in one frame reports a single death.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        let was_alive = self.health > 0.0;
        self.health -= amount;
        was_alive && self.health <= 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub enum Behavior {
    Chaser {
        detection_range: f32,
    },
    Patrol {
        origin_x: f32,
        half_range: f32,
        /// +1 or -1.
        direction: f32,
    },
}

impl Behavior {
    /// Horizontal displacement wanted this frame.
    pub fn horizontal_step(&self, center: Vec2, player: Option<Vec2>, config: &SimConfig) -> f32 {
        match *self {
            Behavior::Chaser { detection_range } => {
                let Some(target) = player else {
                    return 0.0;
                };
                let dx = target.x - center.x;
                if center.distance(target) > detection_range
                    || dx.abs() <= config.chaser.stop_distance
                {
                    return 0.0;
                }
                dx.signum() * config.chaser.speed
            }
            Behavior::Patrol { direction, .. } => direction * config.patrol.speed,
        }
    }

    /// Turns a patrol around once it has passed either end of its range or walked into a wall.
    pub fn after_move(&mut self, center_x: f32, blocked: bool) {
        if let Behavior::Patrol {
            origin_x,
            half_range,
            direction,
        } = self
        {
            if *direction > 0.0 && center_x > *origin_x + *half_range {
                *direction = -1.0;
            } else if *direction < 0.0 && center_x < *origin_x - *half_range {
                *direction = 1.0;
            } else if blocked {
                *direction = -*direction;
            }
        }
    }
}

pub fn spawn_enemy(
    commands: &mut Commands,
    config: &SimConfig,
    kind: EnemyKind,
    position: Vec2,
    behavior: Behavior,
) -> Entity {
    let (size, health) = match kind {
        EnemyKind::Chaser => (config.chaser.size, config.chaser.health),
        EnemyKind::Patrol => (config.patrol.size, config.patrol.health),
    };
    commands
        .spawn((
            Name::new(format!("{kind:?}")),
            LevelEntity,
            Enemy { kind, health },
            behavior,
            Transform::from_translation(position.extend(1.0)),
            Velocity::default(),
            MovementState::default(),
            Collider::from_size(size),
        ))
        .id()
}

/// Damages an enemy and, on death, queues its removal and reports it.
pub fn damage_enemy(
    commands: &mut Commands,
    events: &mut EventWriter<GameEvent>,
    entity: Entity,
    enemy: &mut Enemy,
    amount: f32,
    source: DamageSource,
) {
    if enemy.is_dead() {
        return;
    }
    events.send(GameEvent::DamageTaken {
        entity,
        amount,
        source,
    });
    if enemy.take_damage(amount) {
        commands.entity(entity).insert(Expired);
        events.send(GameEvent::Died {
            entity,
            actor: ActorKind::Enemy(enemy.kind),
        });
        debug!("{:?} {:?} destroyed", enemy.kind, entity);
    }
}

fn drive_enemies(
    config: Res<SimConfig>,
    geometry: Res<SolidGeometry>,
    player: Query<&Transform, (With<Player>, Without<Enemy>)>,
    mut enemies: Query<
        (
            &mut Transform,
            &mut Velocity,
            &mut MovementState,
            &mut Behavior,
            &Collider,
        ),
        (With<Enemy>, Without<Expired>),
    >,
) {
    let player_center = player
        .get_single()
        .ok()
        .map(|transform| transform.translation.truncate());

    for (mut transform, mut velocity, mut state, mut behavior, collider) in &mut enemies {
        let mut center = transform.translation.truncate();
        velocity.x = behavior.horizontal_step(center, player_center, &config);

        let mut body_velocity = velocity.0;
        let contacts = step_body(
            &mut center,
            &mut body_velocity,
            &mut state,
            collider.half_extents,
            config.gravity,
            &geometry,
        );
        velocity.0 = body_velocity;
        behavior.after_move(center.x, contacts.blocked_x);
        transform.translation = center.extend(transform.translation.z);
    }
}
