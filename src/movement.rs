//! Kinematic bodies: gravity integration followed by axis-separated collision resolution
//! against the solid geometry registry.
//!
//! Velocities are measured in world units per frame and the y axis grows downwards, so gravity
//! is positive and a jump impulse is negative. The X axis is always resolved before Y; resolving
//! both at once lets a fast body slip through the corner of a platform.

use bevy::prelude::*;

use crate::collision::{body_rect, SolidGeometry};
use crate::config::{SimClock, SimConfig};
use crate::events::{DetachReason, GameEvent};
use crate::grapple::{pull_step, Grapple, GrapplePhase, PullStep};
use crate::player::Player;
use crate::state::SimSet;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, apply_player_physics.in_set(SimSet::Physics));
    }
}

/// `x` is the horizontal displacement for this frame, `y` the accumulated vertical velocity.
#[derive(Component, Default, Deref, DerefMut, Clone, Copy, Debug)]
pub struct Velocity(pub Vec2);

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct MovementState {
    pub on_ground: bool,
    pub jump_count: u8,
}

#[derive(Component, Copy, Clone, Debug)]
pub struct Collider {
    pub half_extents: Vec2,
}

impl Collider {
    pub fn from_size(size: Vec2) -> Self {
        Self {
            half_extents: size * 0.5,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }
}

/// What a body ran into during one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepContacts {
    /// Horizontal movement was clamped against geometry.
    pub blocked_x: bool,
    pub landed: bool,
    pub hit_ceiling: bool,
}

/// Advances one body by a single frame.
///
/// Gravity is added to the vertical velocity, the body moves by `velocity.x` and is clamped to
/// the nearest edge in the direction of travel, then moves by `velocity.y` and is clamped the same
/// way. Landing sets `on_ground` and resets the jump counter; a ceiling hit zeroes vertical speed.
/// Horizontal velocity is left untouched since owners recompute it every frame.
pub fn step_body(
    center: &mut Vec2,
    velocity: &mut Vec2,
    state: &mut MovementState,
    half: Vec2,
    gravity: f32,
    geometry: &SolidGeometry,
) -> StepContacts {
    velocity.y += gravity;

    let blocked_x = resolve_horizontal(center, velocity.x, half, geometry);
    let (landed, hit_ceiling) = resolve_vertical(center, &mut velocity.y, half, geometry);

    state.on_ground = landed;
    if landed {
        state.jump_count = 0;
    }

    StepContacts {
        blocked_x,
        landed,
        hit_ceiling,
    }
}

fn resolve_horizontal(center: &mut Vec2, dx: f32, half: Vec2, geometry: &SolidGeometry) -> bool {
    if dx == 0.0 {
        return false;
    }

    center.x += dx;
    let mut blocked = false;
    for shape in geometry.shapes() {
        if !crate::collision::penetrates(body_rect(*center, half), shape.rect) {
            continue;
        }
        if dx > 0.0 {
            center.x = shape.rect.min.x - half.x;
        } else {
            center.x = shape.rect.max.x + half.x;
        }
        blocked = true;
    }
    blocked
}

fn resolve_vertical(
    center: &mut Vec2,
    velocity: &mut f32,
    half: Vec2,
    geometry: &SolidGeometry,
) -> (bool, bool) {
    let dy = *velocity;
    if dy == 0.0 {
        return (false, false);
    }

    center.y += dy;
    let (mut down, mut up) = (false, false);
    for shape in geometry.shapes() {
        if !crate::collision::penetrates(body_rect(*center, half), shape.rect) {
            continue;
        }
        if dy > 0.0 {
            center.y = shape.rect.min.y - half.y;
            down = true;
        } else {
            center.y = shape.rect.max.y + half.y;
            up = true;
        }
        *velocity = 0.0;
    }
    (down, up)
}

/// Integrates the player body. An attached grapple replaces gravity and collision with a direct
/// pull towards the anchor point until the release distance is reached.
fn apply_player_physics(
    config: Res<SimConfig>,
    clock: Res<SimClock>,
    geometry: Res<SolidGeometry>,
    mut events: EventWriter<GameEvent>,
    mut query: Query<
        (
            &mut Transform,
            &mut Velocity,
            &mut MovementState,
            &mut Grapple,
            &Collider,
        ),
        With<Player>,
    >,
) {
    let Ok((mut transform, mut velocity, mut state, mut grapple, collider)) =
        query.get_single_mut()
    else {
        return;
    };

    let mut center = transform.translation.truncate();

    if let GrapplePhase::Attached { target, point, .. } = grapple.phase {
        if !geometry.contains(target) {
            grapple.detach();
            events.send(GameEvent::GrappleDetached {
                reason: DetachReason::TargetLost,
            });
        } else {
            match pull_step(
                center,
                point,
                config.hook.pull_speed,
                config.hook.release_distance,
            ) {
                PullStep::Moved(next) => {
                    center = next;
                    velocity.y = 0.0;
                    state.on_ground = false;
                }
                PullStep::Arrived => {
                    grapple.detach();
                    events.send(GameEvent::GrappleDetached {
                        reason: DetachReason::Arrived,
                    });
                    trace!("Grapple released at frame {}", clock.frame);
                }
            }
            transform.translation = center.extend(transform.translation.z);
            return;
        }
    }

    let mut body_velocity = velocity.0;
    step_body(
        &mut center,
        &mut body_velocity,
        &mut state,
        collider.half_extents,
        config.gravity,
        &geometry,
    );
    velocity.0 = body_velocity;
    transform.translation = center.extend(transform.translation.z);
}
