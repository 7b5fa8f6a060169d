//! High-level plugin composition.
//!
//! The `SimulationPlugin` glues together every subsystem plugin (geometry, abilities, physics,
//! enemies, projectiles, interactions, output) and fixes the order of one simulation step.
//! Each subsystem owns its own components; this orchestrator merely registers them with the
//! Bevy application.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::abilities::AbilityPlugin;
use crate::collision::CollisionPlugin;
use crate::config::{advance_clock, SimClock, SimConfig};
use crate::enemy::EnemyPlugin;
use crate::events::{Detonation, GameEvent, ProjectileImpact};
use crate::explosion::ExplosionPlugin;
use crate::interaction::InteractionPlugin;
use crate::level::LevelPlugin;
use crate::movement::MovementPlugin;
use crate::projectile::ProjectilePlugin;
use crate::snapshot::SnapshotPlugin;
use crate::state::{GameState, SimSet};

/// Bundles every simulation plugin into a single unit. Insert a custom `SimConfig` before adding
/// the plugin to override the defaults.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<StatesPlugin>() {
            app.add_plugins(StatesPlugin);
        }

        app.init_resource::<SimConfig>()
            .init_resource::<SimClock>()
            .init_state::<GameState>()
            .add_event::<GameEvent>()
            .add_event::<Detonation>()
            .add_event::<ProjectileImpact>()
            .add_plugins((
                LevelPlugin,       // Definition validation + level entity spawning.
                CollisionPlugin,   // Solid geometry registry.
                AbilityPlugin,     // Intents, timers, firing, grapple seeking.
                MovementPlugin,    // Player body integration.
                EnemyPlugin,       // Chaser/patrol bodies.
                ProjectilePlugin,  // Projectile flight + detonation signals.
                ExplosionPlugin,   // Shrapnel + area damage.
                InteractionPlugin, // Contacts, pickups, doors, exit.
                SnapshotPlugin,    // Frame report for collaborators.
            ))
            // One step runs these sets strictly in order, and only while a level is being
            // played. Player transitions resolve before any body moves, and every body moves
            // before collision-driven removals.
            .configure_sets(
                Update,
                (
                    SimSet::Prepare,
                    SimSet::Abilities,
                    SimSet::Physics,
                    SimSet::Enemies,
                    SimSet::Projectiles,
                    SimSet::Explosions,
                    SimSet::Interactions,
                    SimSet::Cleanup,
                    SimSet::Output,
                )
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                (
                    advance_clock.in_set(SimSet::Prepare).before(crate::collision::CollisionSystems),
                    despawn_expired.in_set(SimSet::Cleanup),
                ),
            );
    }
}

/// Removal queue entry. Systems mark entities instead of despawning them mid-scan; the cleanup
/// set despawns everything marked once all scans of the step are done.
#[derive(Component, Default)]
pub struct Expired;

fn despawn_expired(mut commands: Commands, expired: Query<Entity, With<Expired>>) {
    for entity in &expired {
        commands.entity(entity).despawn_recursive();
    }
}
