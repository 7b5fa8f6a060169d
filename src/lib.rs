//! Real-time 2D action-platformer simulation core, packaged as Bevy plugins.
//!
//! Add `SimulationPlugin` to an `App`, hand it a level with `start_level`, push decoded
//! intents into `PlayerIntents` and read the `FrameReport` resource after every update.
//! Rendering, audio, device input and level persistence stay with the embedding application.

pub mod abilities;
pub mod app;
pub mod charge;
pub mod collision;
pub mod config;
pub mod editor;
pub mod enemy;
pub mod error;
pub mod events;
pub mod explosion;
pub mod grapple;
pub mod input;
pub mod interaction;
pub mod level;
pub mod movement;
pub mod player;
pub mod projectile;
pub mod snapshot;
pub mod state;
pub mod weapons;

pub use app::SimulationPlugin;
pub use config::{SimClock, SimConfig};
pub use error::{ConfigError, PropertyError};
pub use events::GameEvent;
pub use input::{Intent, PlayerIntents};
pub use level::{start_level, LevelDefinition};
pub use snapshot::{FrameReport, WorldSnapshot};
pub use state::GameState;
