//! Player ability state machine: timers, intents, firing and grapple seeking.
//!
//! Every ability is an independent timer or flag on its own component. The systems here run
//! before body physics and only ever touch the player entity; the projectiles they fire are new
//! entities handed to the projectile pass.

use bevy::prelude::*;

use crate::collision::SolidGeometry;
use crate::config::{SimClock, SimConfig};
use crate::events::{DetachReason, GameEvent};
use crate::grapple::{detection_square, hook_endpoint, Grapple};
use crate::input::{Intent, PlayerIntents};
use crate::movement::{MovementState, Velocity};
use crate::player::{Dash, Invulnerability, Player, SpeedBoost};
use crate::projectile::{spawn_projectile, ProjectileSpec};
use crate::state::{GameState, SimSet};
use crate::weapons::{Arsenal, SecondaryPress, ShotOrder, WeaponId};

pub struct AbilityPlugin;

impl Plugin for AbilityPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerIntents>()
            .add_systems(
                Update,
                (tick_player_timers, apply_player_intents, seek_grapple_target)
                    .chain()
                    .in_set(SimSet::Abilities),
            )
            .add_systems(
                Update,
                discard_idle_intents.run_if(not(in_state(GameState::Playing))),
            );
    }
}

/// Drops intents pushed while no level is being played.
fn discard_idle_intents(mut intents: ResMut<PlayerIntents>) {
    if !intents.is_empty() {
        debug!("Discarding player intents queued outside of play");
        intents.clear();
    }
}

/// Horizontal displacement for this frame: walking speed (boosted if active) along the input
/// axis, plus the dash surplus along the facing direction while dashing.
pub fn horizontal_velocity(
    axis: f32,
    dash: &Dash,
    boost: &SpeedBoost,
    config: &SimConfig,
) -> f32 {
    let tuning = &config.player;
    let walk = if boost.is_active() {
        tuning.speed * tuning.speed_boost_multiplier
    } else {
        tuning.speed
    };
    let mut velocity = axis * walk;
    if dash.is_active() {
        velocity += dash.facing * (config.dash.multiplier - 1.0) * tuning.speed;
    }
    velocity
}

fn tick_player_timers(
    config: Res<SimConfig>,
    clock: Res<SimClock>,
    mut events: EventWriter<GameEvent>,
    mut query: Query<
        (
            &mut Invulnerability,
            &mut Dash,
            &mut SpeedBoost,
            &mut Arsenal,
        ),
        With<Player>,
    >,
) {
    let now = clock.now_ms;
    for (mut invulnerability, mut dash, mut boost, mut arsenal) in &mut query {
        invulnerability.tick(now, config.player.invulnerability_ms);
        dash.tick(now, config.dash.duration_ms);
        boost.tick(now, config.player.speed_boost_ms);
        if let Some(weapon) = arsenal.finish_reload(now) {
            events.send(GameEvent::ReloadFinished { weapon });
        }
        arsenal.tick_charges(now, config.charge_duration_ms);
    }
}

fn release_grapple(grapple: &mut Grapple, events: &mut EventWriter<GameEvent>, reason: DetachReason) {
    if grapple.detach() {
        events.send(GameEvent::GrappleDetached { reason });
    }
}

fn fire(
    commands: &mut Commands,
    events: &mut EventWriter<GameEvent>,
    config: &SimConfig,
    order: ShotOrder,
    origin: Vec2,
    aim: Option<Vec2>,
    facing: f32,
) {
    let spec = ProjectileSpec::from_shot(order, origin, aim, facing, config);
    spawn_projectile(commands, spec);
    events.send(GameEvent::ShotFired {
        weapon: order.weapon(),
        kind: spec.kind,
    });
}

fn apply_player_intents(
    mut commands: Commands,
    config: Res<SimConfig>,
    clock: Res<SimClock>,
    mut intents: ResMut<PlayerIntents>,
    mut events: EventWriter<GameEvent>,
    mut query: Query<
        (
            &Transform,
            &mut Velocity,
            &mut MovementState,
            &mut Dash,
            &SpeedBoost,
            &mut Arsenal,
            &mut Grapple,
        ),
        With<Player>,
    >,
) {
    let frame = intents.drain();
    let Ok((transform, mut velocity, mut state, mut dash, boost, mut arsenal, mut grapple)) =
        query.get_single_mut()
    else {
        return;
    };

    let now = clock.now_ms;
    let origin = transform.translation.truncate();
    let axis = frame.move_axis();
    if axis != 0.0 {
        dash.facing = axis;
    }

    for action in &frame.actions {
        match *action {
            Intent::Jump => {
                if state.jump_count < config.player.max_jumps {
                    velocity.y = config.player.jump_impulse;
                    state.jump_count += 1;
                    state.on_ground = false;
                    release_grapple(&mut grapple, &mut events, DetachReason::Cancelled);
                }
            }
            Intent::Dash => {
                if dash.trigger(now, config.dash.cooldown_ms) {
                    events.send(GameEvent::DashStarted);
                    release_grapple(&mut grapple, &mut events, DetachReason::Cancelled);
                }
            }
            Intent::Reload => {
                if arsenal.start_reload(now) {
                    events.send(GameEvent::ReloadStarted {
                        weapon: arsenal.current,
                    });
                }
            }
            Intent::SelectWeapon(slot) => {
                let Some(weapon) = WeaponId::from_slot(slot) else {
                    continue;
                };
                if arsenal.equip(weapon) {
                    events.send(GameEvent::WeaponEquipped { weapon });
                    release_grapple(&mut grapple, &mut events, DetachReason::Cancelled);
                }
            }
            Intent::PrimaryDown => {
                if let Some(order) = arsenal.press_primary(now) {
                    fire(&mut commands, &mut events, &config, order, origin, frame.aim, dash.facing);
                }
            }
            Intent::PrimaryUp => {
                if let Some(order) = arsenal.release_primary(now, config.charge_duration_ms) {
                    fire(&mut commands, &mut events, &config, order, origin, frame.aim, dash.facing);
                }
            }
            Intent::SecondaryDown => {
                if arsenal.press_secondary(now) == SecondaryPress::Grapple && grapple.launch() {
                    trace!("Grapple seeking");
                }
            }
            Intent::SecondaryUp => {
                if let Some(order) = arsenal.release_secondary(now, config.charge_duration_ms) {
                    fire(&mut commands, &mut events, &config, order, origin, frame.aim, dash.facing);
                }
                if grapple.is_seeking() {
                    release_grapple(&mut grapple, &mut events, DetachReason::Released);
                }
            }
            Intent::MoveLeft | Intent::MoveRight | Intent::AimAt(_) => {}
        }
    }

    velocity.x = horizontal_velocity(axis, &dash, boost, &config);
}

fn seek_grapple_target(
    config: Res<SimConfig>,
    clock: Res<SimClock>,
    intents: Res<PlayerIntents>,
    geometry: Res<SolidGeometry>,
    mut events: EventWriter<GameEvent>,
    mut query: Query<(&Transform, &mut Grapple), With<Player>>,
) {
    let Ok((transform, mut grapple)) = query.get_single_mut() else {
        return;
    };
    if !grapple.is_seeking() {
        return;
    }
    let Some(aim) = intents.aim() else {
        return;
    };

    let origin = transform.translation.truncate();
    let endpoint = hook_endpoint(origin, aim, config.hook.range);
    let probe = detection_square(endpoint, config.hook.detection_size);
    if let Some(shape) = geometry.first_hookable(probe) {
        grapple.attach(shape.entity, endpoint, clock.now_ms);
        events.send(GameEvent::GrappleAttached {
            target: shape.entity,
            point: endpoint,
        });
    }
}
