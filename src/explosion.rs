//! Turns detonation signals into shrapnel and area damage.

use bevy::prelude::*;

use crate::app::Expired;
use crate::config::SimConfig;
use crate::enemy::{damage_enemy, Enemy};
use crate::events::{DamageSource, Detonation, GameEvent};
use crate::projectile::{spawn_projectile, ProjectileSpec};
use crate::state::SimSet;

pub struct ExplosionPlugin;

impl Plugin for ExplosionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, resolve_detonations.in_set(SimSet::Explosions));
    }
}

/// Enemies caught in a blast of `radius` centered on `at`.
pub fn in_blast(at: Vec2, radius: f32, center: Vec2) -> bool {
    at.distance(center) <= radius
}

fn resolve_detonations(
    mut commands: Commands,
    config: Res<SimConfig>,
    mut detonations: EventReader<Detonation>,
    mut events: EventWriter<GameEvent>,
    mut enemies: Query<(Entity, &Transform, &mut Enemy), Without<Expired>>,
) {
    let mut resolved: Vec<Entity> = Vec::new();
    for detonation in detonations.read() {
        if resolved.contains(&detonation.projectile) {
            continue;
        }
        resolved.push(detonation.projectile);

        if let Some(mut projectile) = commands.get_entity(detonation.projectile) {
            projectile.insert(Expired);
        }

        let tuning = &config.explosion;
        for index in 0..tuning.shrapnel_count {
            spawn_projectile(
                &mut commands,
                ProjectileSpec::shrapnel(detonation.at, index, &config),
            );
        }

        for (entity, transform, mut enemy) in &mut enemies {
            if in_blast(detonation.at, tuning.area_radius, transform.translation.truncate()) {
                damage_enemy(
                    &mut commands,
                    &mut events,
                    entity,
                    &mut enemy,
                    tuning.area_damage,
                    DamageSource::Explosion,
                );
            }
        }

        events.send(GameEvent::ExplosionTriggered {
            at: detonation.at,
            radius: tuning.area_radius,
        });
        debug!(
            "Detonation at {:?}: {} shrapnel",
            detonation.at, tuning.shrapnel_count
        );
    }
}
