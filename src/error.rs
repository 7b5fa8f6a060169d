//! Error types surfaced to callers outside the simulation loop. Gameplay contention (empty
//! magazine, cooldowns, locked doors) is never an error; those paths report through `bool` or
//! `Option` return values instead.

use thiserror::Error;

/// A level definition that cannot be turned into a running simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("level definition has no player start")]
    MissingPlayerStart,
    #[error("level definition has no exit")]
    MissingExit,
    #[error("door '{door}' requires unknown weapon '{weapon}'")]
    UnknownWeapon { door: String, weapon: String },
    #[error("door id '{0}' is used more than once")]
    DuplicateDoorId(String),
}

/// Rejected edit through the `PropertyEditable` capability.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyError {
    #[error("'{entity}' has no property named '{name}'")]
    UnknownProperty { entity: &'static str, name: String },
    #[error("property '{name}' expects {expected}")]
    WrongKind { name: String, expected: &'static str },
    #[error("'{value}' is not an allowed value for '{name}'")]
    NotAnOption { name: String, value: String },
}
