//! Projectiles: spawn parameters for every shot kind and the per-frame flight pass.
//!
//! All kinds fall under the lighter projectile gravity. What happens on contact with solid
//! geometry depends on the kind: standard and sniper rounds are removed, shrapnel bounces while
//! it has budget left, and explosive rounds raise a `Detonation` and leave their own removal to
//! the explosion pass.

use bevy::prelude::*;
use serde::Serialize;

use crate::app::Expired;
use crate::collision::{body_rect, overlaps, SolidGeometry, CONTACT_EPSILON};
use crate::config::{ArcTuning, SimConfig, SniperTuning};
use crate::enemy::Enemy;
use crate::events::{Detonation, ProjectileImpact};
use crate::level::{LevelBounds, LevelEntity};
use crate::movement::{Collider, Velocity};
use crate::state::SimSet;
use crate::weapons::{ShotOrder, WeaponId};

pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, advance_projectiles.in_set(SimSet::Projectiles));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Standard,
    ChargedSniper,
    ArcExplosive,
    Shrapnel,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub damage: f32,
    /// Charge level at the moment of firing; zero for uncharged kinds.
    pub charge: f32,
    pub bounces_left: u32,
    pub explosive: bool,
    /// Weapon that fired the round. Power-up shots and shrapnel carry none.
    pub weapon: Option<WeaponId>,
}

/// Everything needed to put a projectile into the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpec {
    pub kind: ProjectileKind,
    pub origin: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub charge: f32,
    pub bounces: u32,
    pub size: Vec2,
    pub weapon: Option<WeaponId>,
}

impl ProjectileSpec {
    /// Resolves a committed shot into launch parameters. Without an aim point the shot travels
    /// horizontally in the `facing` direction.
    pub fn from_shot(
        order: ShotOrder,
        origin: Vec2,
        aim: Option<Vec2>,
        facing: f32,
        config: &SimConfig,
    ) -> Self {
        let direction = aim_direction(origin, aim, facing);
        let base = Self {
            kind: ProjectileKind::Standard,
            origin,
            velocity: Vec2::ZERO,
            damage: 0.0,
            charge: 0.0,
            bounces: 0,
            size: config.sniper.size,
            weapon: order.weapon(),
        };

        match order {
            ShotOrder::Standard {
                speed,
                damage,
                size,
                ..
            } => Self {
                velocity: direction * speed,
                damage,
                size,
                ..base
            },
            ShotOrder::Sniper { charge } => {
                let (speed, damage) = sniper_profile(&config.sniper, charge);
                Self {
                    kind: ProjectileKind::ChargedSniper,
                    velocity: direction * speed,
                    damage,
                    charge,
                    ..base
                }
            }
            ShotOrder::PowerShot { charge } => {
                let (speed, _) = sniper_profile(&config.sniper, charge);
                Self {
                    kind: ProjectileKind::ChargedSniper,
                    velocity: direction * speed,
                    damage: config.sniper.max_damage,
                    charge,
                    ..base
                }
            }
            ShotOrder::Arc { charge } => {
                let target = aim.unwrap_or(origin + Vec2::new(facing * 100.0, 0.0));
                Self {
                    kind: ProjectileKind::ArcExplosive,
                    velocity: arc_velocity(origin, target, charge, &config.arc),
                    charge,
                    size: config.arc.size,
                    ..base
                }
            }
        }
    }

    /// One fragment of an explosion, `index` of `count` evenly spaced around the circle.
    pub fn shrapnel(at: Vec2, index: u32, config: &SimConfig) -> Self {
        let tuning = &config.explosion;
        let count = tuning.shrapnel_count.max(1);
        let angle = std::f32::consts::TAU * index as f32 / count as f32;
        Self {
            kind: ProjectileKind::Shrapnel,
            origin: at,
            velocity: Vec2::from_angle(angle) * tuning.shrapnel_speed,
            damage: tuning.shrapnel_damage,
            charge: 0.0,
            bounces: tuning.shrapnel_bounces,
            size: tuning.shrapnel_size,
            weapon: None,
        }
    }
}

pub fn aim_direction(origin: Vec2, aim: Option<Vec2>, facing: f32) -> Vec2 {
    let fallback = Vec2::new(if facing < 0.0 { -1.0 } else { 1.0 }, 0.0);
    aim.map(|point| (point - origin).normalize_or_zero())
        .filter(|direction| *direction != Vec2::ZERO)
        .unwrap_or(fallback)
}

/// Speed and damage of a charged sniper round, linear in the charge level.
pub fn sniper_profile(tuning: &SniperTuning, charge: f32) -> (f32, f32) {
    let charge = charge.clamp(0.0, 1.0);
    (
        tuning.min_speed + (tuning.max_speed - tuning.min_speed) * charge,
        tuning.min_damage + (tuning.max_damage - tuning.min_damage) * charge,
    )
}

/// Launch velocity of an arc shot. Both axes scale by `0.5 + 0.5 * charge`: the horizontal
/// component follows the distance to the aim point, the vertical one the configured apex height.
pub fn arc_velocity(origin: Vec2, target: Vec2, charge: f32, tuning: &ArcTuning) -> Vec2 {
    let scale = 0.5 + 0.5 * charge.clamp(0.0, 1.0);
    Vec2::new(
        (target.x - origin.x) * tuning.speed_factor * scale,
        -(tuning.max_height / 10.0) * scale,
    )
}

/// Heading in degrees with y pointing up, as renderers expect.
pub fn heading_degrees(velocity: Vec2) -> f32 {
    (-velocity.y).atan2(velocity.x).to_degrees()
}

pub fn spawn_projectile(commands: &mut Commands, spec: ProjectileSpec) -> Entity {
    commands
        .spawn((
            Name::new("Projectile"),
            LevelEntity,
            Projectile {
                kind: spec.kind,
                damage: spec.damage,
                charge: spec.charge,
                bounces_left: spec.bounces,
                explosive: spec.kind == ProjectileKind::ArcExplosive,
                weapon: spec.weapon,
            },
            Transform::from_translation(spec.origin.extend(2.0)),
            Velocity(spec.velocity),
            Collider::from_size(spec.size),
        ))
        .id()
}

/// Moves a bouncing round along one axis (0 = x, 1 = y). The component is reflected at most once,
/// and only by shapes whose near edge the round crossed while travelling towards it; the round is
/// then placed one unit clear of the nearest such edge.
fn bounce_axis(
    center: &mut Vec2,
    velocity: &mut Vec2,
    half: Vec2,
    geometry: &SolidGeometry,
    axis: usize,
) -> bool {
    let speed = velocity[axis];
    if speed == 0.0 {
        return false;
    }
    let before = body_rect(*center, half);
    center[axis] += speed;
    let after = body_rect(*center, half);

    let stop = geometry
        .shapes()
        .iter()
        .filter(|shape| overlaps(after, shape.rect))
        .filter_map(|shape| {
            if speed > 0.0 && before.max[axis] <= shape.rect.min[axis] + CONTACT_EPSILON {
                Some(shape.rect.min[axis] - half[axis] - 1.0)
            } else if speed < 0.0 && before.min[axis] >= shape.rect.max[axis] - CONTACT_EPSILON {
                Some(shape.rect.max[axis] + half[axis] + 1.0)
            } else {
                None
            }
        })
        .reduce(|a, b| if speed > 0.0 { a.min(b) } else { a.max(b) });

    let Some(edge) = stop else {
        return false;
    };
    center[axis] = edge;
    velocity[axis] = -speed;
    true
}

/// One frame of a round that still has bounce budget: x first, then y, like body movement.
/// Returns whether either component was reflected.
pub fn bounce_step(
    center: &mut Vec2,
    velocity: &mut Vec2,
    half: Vec2,
    geometry: &SolidGeometry,
) -> bool {
    let horizontal = bounce_axis(center, velocity, half, geometry, 0);
    let vertical = bounce_axis(center, velocity, half, geometry, 1);
    horizontal || vertical
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Contact {
    None,
    Detonate,
    Destroy,
}

fn contact_response(projectile: &Projectile, hit: bool) -> Contact {
    if !hit {
        Contact::None
    } else if projectile.explosive {
        Contact::Detonate
    } else {
        Contact::Destroy
    }
}

#[allow(clippy::too_many_arguments)]
fn advance_projectiles(
    mut commands: Commands,
    config: Res<SimConfig>,
    geometry: Res<SolidGeometry>,
    bounds: Res<LevelBounds>,
    mut detonations: EventWriter<Detonation>,
    mut impacts: EventWriter<ProjectileImpact>,
    mut query: Query<
        (Entity, &mut Transform, &mut Velocity, &mut Projectile, &Collider),
        Without<Expired>,
    >,
    enemies: Query<(&Transform, &Collider), (With<Enemy>, Without<Projectile>, Without<Expired>)>,
) {
    for (entity, mut transform, mut velocity, mut projectile, collider) in &mut query {
        let half = collider.half_extents;
        velocity.y += config.projectile_gravity;

        if projectile.kind == ProjectileKind::Shrapnel && projectile.bounces_left > 0 {
            let mut center = transform.translation.truncate();
            if bounce_step(&mut center, &mut velocity.0, half, &geometry) {
                projectile.bounces_left -= 1;
            }
            transform.translation = center.extend(transform.translation.z);
            if !bounds.in_envelope(body_rect(center, half)) {
                commands.entity(entity).insert(Expired);
            }
            continue;
        }

        let center = transform.translation.truncate() + velocity.0;
        let rect = body_rect(center, half);

        let hits: Vec<_> = geometry
            .shapes()
            .iter()
            .filter(|shape| overlaps(rect, shape.rect))
            .copied()
            .collect();
        for shape in &hits {
            impacts.send(ProjectileImpact {
                projectile: entity,
                target: shape.entity,
                weapon: projectile.weapon,
            });
        }

        // Explosive rounds also go off against enemies; other kinds are resolved by the
        // interaction pass.
        let struck_enemy = projectile.explosive
            && enemies.iter().any(|(enemy_transform, enemy_collider)| {
                overlaps(
                    rect,
                    body_rect(
                        enemy_transform.translation.truncate(),
                        enemy_collider.half_extents,
                    ),
                )
            });

        match contact_response(&projectile, !hits.is_empty() || struck_enemy) {
            Contact::Detonate => {
                transform.translation = center.extend(transform.translation.z);
                detonations.send(Detonation {
                    projectile: entity,
                    at: center,
                });
                continue;
            }
            Contact::Destroy => {
                commands.entity(entity).insert(Expired);
            }
            Contact::None => {}
        }

        transform.translation = center.extend(transform.translation.z);

        if !bounds.in_envelope(body_rect(center, half)) {
            if projectile.explosive {
                detonations.send(Detonation {
                    projectile: entity,
                    at: center,
                });
            } else {
                commands.entity(entity).insert(Expired);
            }
        }
    }
}
