//! Two-phase grappling hook: seek along the aim direction, then pull towards the anchor.

use bevy::math::Rect;
use bevy::prelude::*;

/// The attached target is a plain `Entity` id. The hook never owns the geometry and simply lets
/// go when the id disappears from the solid registry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GrapplePhase {
    #[default]
    Idle,
    Seeking,
    Attached {
        target: Entity,
        point: Vec2,
        since_ms: u64,
    },
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Grapple {
    pub phase: GrapplePhase,
}

impl Grapple {
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, GrapplePhase::Idle)
    }

    pub fn is_seeking(&self) -> bool {
        matches!(self.phase, GrapplePhase::Seeking)
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.phase, GrapplePhase::Attached { .. })
    }

    /// Idle → seeking. Returns `false` if the hook is already out.
    pub fn launch(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.phase = GrapplePhase::Seeking;
        true
    }

    pub fn attach(&mut self, target: Entity, point: Vec2, now_ms: u64) {
        self.phase = GrapplePhase::Attached {
            target,
            point,
            since_ms: now_ms,
        };
    }

    /// Drops the hook from any phase. Returns whether it was out.
    pub fn detach(&mut self) -> bool {
        let was_out = !self.is_idle();
        self.phase = GrapplePhase::Idle;
        was_out
    }
}

/// Point the hook reaches when aimed at `aim`: the aim point itself, or the point `range` units
/// from `origin` along the same direction.
pub fn hook_endpoint(origin: Vec2, aim: Vec2, range: f32) -> Vec2 {
    origin + (aim - origin).clamp_length_max(range)
}

pub fn detection_square(point: Vec2, size: f32) -> Rect {
    Rect::from_center_size(point, Vec2::splat(size))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PullStep {
    Moved(Vec2),
    Arrived,
}

/// One frame of pull. Never overshoots the anchor, so a body closer than `pull_speed` lands on
/// the point and arrives on the following frame.
pub fn pull_step(from: Vec2, to: Vec2, pull_speed: f32, release_distance: f32) -> PullStep {
    let offset = to - from;
    let distance = offset.length();
    if distance <= release_distance {
        return PullStep::Arrived;
    }
    PullStep::Moved(from + offset / distance * pull_speed.min(distance))
}
