//! Decoded input intents. Device polling lives outside the simulation; collaborators push
//! semantic actions here and the ability systems drain them once per step.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Held direction for this step. Both directions together cancel out.
    MoveLeft,
    MoveRight,
    Jump,
    Dash,
    Reload,
    /// Weapon-select key, 1..=4.
    SelectWeapon(u8),
    PrimaryDown,
    PrimaryUp,
    SecondaryDown,
    SecondaryUp,
    /// Aim point in world coordinates. Persists until replaced.
    AimAt(Vec2),
}

/// Intents queued for the next step plus the last known aim point.
#[derive(Resource, Debug, Default)]
pub struct PlayerIntents {
    queued: Vec<Intent>,
    aim: Option<Vec2>,
}

impl PlayerIntents {
    pub fn push(&mut self, intent: Intent) {
        self.queued.push(intent);
    }

    pub fn extend(&mut self, intents: impl IntoIterator<Item = Intent>) {
        self.queued.extend(intents);
    }

    pub fn aim(&self) -> Option<Vec2> {
        self.aim
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub fn clear(&mut self) {
        self.queued.clear();
        self.aim = None;
    }

    /// Splits the queue into a movement axis and the discrete actions, in arrival order.
    pub fn drain(&mut self) -> FrameIntents {
        let mut frame = FrameIntents::default();
        for intent in self.queued.drain(..) {
            match intent {
                Intent::MoveLeft => frame.left = true,
                Intent::MoveRight => frame.right = true,
                Intent::AimAt(point) => self.aim = Some(point),
                action => frame.actions.push(action),
            }
        }
        frame.aim = self.aim;
        frame
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameIntents {
    left: bool,
    right: bool,
    pub aim: Option<Vec2>,
    pub actions: Vec<Intent>,
}

impl FrameIntents {
    /// -1, 0 or +1.
    pub fn move_axis(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}
