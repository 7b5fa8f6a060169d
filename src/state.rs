//! Global simulation state definitions. States are stored by Bevy as a resource; switching states
//! simply updates an enum value and triggers on-enter/on-exit schedules.

use bevy::prelude::*;

/// High-level state machine for one level run.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum GameState {
    /// No level has been handed to the simulation yet.
    #[default]
    Idle,
    /// A validated level is being spawned; flips to `Playing` once entities exist.
    Loading,
    Playing,
    /// The player reached the level exit.
    Won,
    /// The player's health dropped to zero.
    GameOver,
}

/// Named system sets that give one simulation step its fixed order. `app.rs` chains them so every
/// player transition resolves before body physics, and all physics before collision-driven
/// removals.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Clock advance and static geometry registry refresh.
    Prepare,
    /// Input intents feeding the player ability state machine.
    Abilities,
    /// Player body integration (gravity + collision, or grapple pull).
    Physics,
    Enemies,
    Projectiles,
    /// Detonation signals turned into shrapnel and area damage.
    Explosions,
    /// Player vs hazards/enemies/pickups/doors/exit, projectiles vs enemies.
    Interactions,
    /// Removal queue flush.
    Cleanup,
    /// Snapshot and event hand-off to external collaborators.
    Output,
}
