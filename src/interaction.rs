//! Collision-driven gameplay once every body has moved: hazards, enemy contact, projectile hits,
//! pickups, keys, doors and the level exit.
//!
//! Nothing here despawns directly. Consumed items, spent projectiles and dead enemies get an
//! `Expired` marker and are swept in the cleanup set after all scans have finished.

use bevy::prelude::*;

use crate::app::Expired;
use crate::collision::{body_rect, overlaps, touches, Door, SolidGeometry};
use crate::config::{SimClock, SimConfig};
use crate::enemy::{damage_enemy, Enemy};
use crate::events::{ActorKind, DamageSource, DetachReason, GameEvent, ProjectileImpact};
use crate::grapple::Grapple;
use crate::level::PickupKind;
use crate::movement::Collider;
use crate::player::{
    apply_player_damage, kill_player, DamageOutcome, Health, Invulnerability, KeyRing, Player,
    SpeedBoost,
};
use crate::projectile::Projectile;
use crate::state::{GameState, SimSet};
use crate::weapons::Arsenal;

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                player_hazard_contact,
                player_enemy_contact,
                projectile_enemy_hits,
                collect_pickups,
                collect_keys,
                unlock_doors,
                reach_exit,
            )
                .chain()
                .in_set(SimSet::Interactions),
        );
    }
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Spike {
    pub instant_kill: bool,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Pickup {
    pub kind: PickupKind,
}

#[derive(Component, Clone, Debug)]
pub struct KeyItem {
    pub id: String,
    pub color: [u8; 3],
}

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct LevelExit;

type PlayerBody<'a> = (&'a Transform, &'a Collider);

fn player_rect((transform, collider): PlayerBody) -> Rect {
    body_rect(transform.translation.truncate(), collider.half_extents)
}

fn entity_rect(transform: &Transform, collider: &Collider) -> Rect {
    body_rect(transform.translation.truncate(), collider.half_extents)
}

/// Emits the events that follow a damage attempt on the player and ends the run on death.
fn report_player_damage(
    outcome: DamageOutcome,
    player: Entity,
    amount: f32,
    source: DamageSource,
    events: &mut EventWriter<GameEvent>,
    next_state: &mut NextState<GameState>,
) {
    if outcome == DamageOutcome::Blocked {
        return;
    }
    events.send(GameEvent::DamageTaken {
        entity: player,
        amount,
        source,
    });
    if outcome == DamageOutcome::Killed {
        events.send(GameEvent::Died {
            entity: player,
            actor: ActorKind::Player,
        });
        info!("Player died ({:?})", source);
        next_state.set(GameState::GameOver);
    }
}

fn player_hazard_contact(
    config: Res<SimConfig>,
    clock: Res<SimClock>,
    geometry: Res<SolidGeometry>,
    mut events: EventWriter<GameEvent>,
    mut next_state: ResMut<NextState<GameState>>,
    mut player: Query<
        (Entity, &Transform, &Collider, &mut Health, &mut Invulnerability),
        With<Player>,
    >,
    spikes: Query<(&Transform, &Collider, &Spike), Without<Player>>,
) {
    let Ok((entity, transform, collider, mut health, mut invulnerability)) =
        player.get_single_mut()
    else {
        return;
    };
    let rect = player_rect((transform, collider));
    let now = clock.now_ms;

    if geometry.touches_hazard(rect, config.contact.touch_margin) {
        let amount = health.current;
        let outcome = kill_player(&mut health, &mut invulnerability, now);
        report_player_damage(
            outcome,
            entity,
            amount,
            DamageSource::Hazard,
            &mut events,
            &mut next_state,
        );
    }

    for (spike_transform, spike_collider, spike) in &spikes {
        if !overlaps(rect, entity_rect(spike_transform, spike_collider)) {
            continue;
        }
        let (outcome, amount) = if spike.instant_kill {
            let amount = health.current;
            (kill_player(&mut health, &mut invulnerability, now), amount)
        } else {
            let amount = config.contact.spike_damage;
            (
                apply_player_damage(&mut health, &mut invulnerability, amount, now),
                amount,
            )
        };
        report_player_damage(
            outcome,
            entity,
            amount,
            DamageSource::Spike,
            &mut events,
            &mut next_state,
        );
    }
}

fn player_enemy_contact(
    config: Res<SimConfig>,
    clock: Res<SimClock>,
    mut events: EventWriter<GameEvent>,
    mut next_state: ResMut<NextState<GameState>>,
    mut player: Query<
        (Entity, &Transform, &Collider, &mut Health, &mut Invulnerability),
        With<Player>,
    >,
    enemies: Query<(&Transform, &Collider), (With<Enemy>, Without<Player>, Without<Expired>)>,
) {
    let Ok((entity, transform, collider, mut health, mut invulnerability)) =
        player.get_single_mut()
    else {
        return;
    };
    let rect = player_rect((transform, collider));

    for (enemy_transform, enemy_collider) in &enemies {
        if !overlaps(rect, entity_rect(enemy_transform, enemy_collider)) {
            continue;
        }
        let amount = config.contact.enemy_damage;
        let outcome = apply_player_damage(&mut health, &mut invulnerability, amount, clock.now_ms);
        report_player_damage(
            outcome,
            entity,
            amount,
            DamageSource::Enemy,
            &mut events,
            &mut next_state,
        );
    }
}

/// Non-explosive rounds damage the first live enemy they overlap and are spent. Explosive rounds
/// are handled by the projectile pass.
fn projectile_enemy_hits(
    mut commands: Commands,
    mut events: EventWriter<GameEvent>,
    projectiles: Query<(Entity, &Transform, &Collider, &Projectile), Without<Expired>>,
    mut enemies: Query<
        (Entity, &Transform, &Collider, &mut Enemy),
        (Without<Projectile>, Without<Expired>),
    >,
) {
    for (projectile_entity, transform, collider, projectile) in &projectiles {
        if projectile.explosive {
            continue;
        }
        let rect = entity_rect(transform, collider);
        let target = enemies.iter_mut().find(|(_, enemy_transform, enemy_collider, enemy)| {
            !enemy.is_dead() && overlaps(rect, entity_rect(enemy_transform, enemy_collider))
        });
        let Some((enemy_entity, _, _, mut enemy)) = target else {
            continue;
        };
        damage_enemy(
            &mut commands,
            &mut events,
            enemy_entity,
            &mut enemy,
            projectile.damage,
            DamageSource::Projectile,
        );
        commands.entity(projectile_entity).insert(Expired);
    }
}

#[allow(clippy::type_complexity)]
fn collect_pickups(
    mut commands: Commands,
    config: Res<SimConfig>,
    clock: Res<SimClock>,
    mut events: EventWriter<GameEvent>,
    mut player: Query<
        (
            &Transform,
            &Collider,
            &mut Health,
            &mut SpeedBoost,
            &mut Arsenal,
            &mut Grapple,
        ),
        With<Player>,
    >,
    pickups: Query<(Entity, &Transform, &Collider, &Pickup), (Without<Player>, Without<Expired>)>,
) {
    let Ok((transform, collider, mut health, mut boost, mut arsenal, mut grapple)) =
        player.get_single_mut()
    else {
        return;
    };
    let rect = player_rect((transform, collider));

    for (entity, pickup_transform, pickup_collider, pickup) in &pickups {
        if !overlaps(rect, entity_rect(pickup_transform, pickup_collider)) {
            continue;
        }
        match pickup.kind {
            PickupKind::Score => {}
            PickupKind::Health => health.heal(config.contact.health_pickup),
            PickupKind::Speed => boost.started_ms = Some(clock.now_ms),
            PickupKind::ChargePowerup => arsenal.charge_powerup = true,
            PickupKind::BlueWeaponPowerup
            | PickupKind::RedWeaponPowerup
            | PickupKind::PurpleWeaponPowerup => {
                if let Some(weapon) = pickup.kind.weapon() {
                    if arsenal.grant(weapon) {
                        events.send(GameEvent::WeaponEquipped { weapon });
                        if grapple.detach() {
                            events.send(GameEvent::GrappleDetached {
                                reason: DetachReason::Cancelled,
                            });
                        }
                    }
                }
            }
        }
        commands.entity(entity).insert(Expired);
        events.send(GameEvent::PickupCollected { kind: pickup.kind });
    }
}

fn collect_keys(
    mut commands: Commands,
    mut events: EventWriter<GameEvent>,
    mut player: Query<(&Transform, &Collider, &mut KeyRing), With<Player>>,
    keys: Query<(Entity, &Transform, &Collider, &KeyItem), (Without<Player>, Without<Expired>)>,
) {
    let Ok((transform, collider, mut ring)) = player.get_single_mut() else {
        return;
    };
    let rect = player_rect((transform, collider));

    for (entity, key_transform, key_collider, key) in &keys {
        if overlaps(rect, entity_rect(key_transform, key_collider)) {
            ring.insert(key.id.clone());
            commands.entity(entity).insert(Expired);
            events.send(GameEvent::KeyCollected {
                key_id: key.id.clone(),
            });
        }
    }
}

/// Opens doors whose locks are satisfied, either by the player touching them with the right key
/// and weapon, or by a round from the required weapon striking them.
fn unlock_doors(
    config: Res<SimConfig>,
    mut impacts: EventReader<ProjectileImpact>,
    mut events: EventWriter<GameEvent>,
    player: Query<(&Transform, &Collider, &KeyRing, &Arsenal), With<Player>>,
    mut doors: Query<(Entity, &Transform, &Collider, &mut Door), Without<Player>>,
) {
    let Ok((transform, collider, ring, arsenal)) = player.get_single() else {
        impacts.clear();
        return;
    };
    let rect = player_rect((transform, collider));
    let has_key = |key: &str| ring.contains(key);

    let struck: Vec<ProjectileImpact> = impacts.read().copied().collect();

    for (entity, door_transform, door_collider, mut door) in &mut doors {
        if door.open {
            continue;
        }
        let door_rect = entity_rect(door_transform, door_collider);
        let by_contact = touches(rect, door_rect, config.contact.touch_margin)
            && door.unlocks_with(has_key, Some(arsenal.current));
        let by_shot = door.required_weapon.is_some()
            && struck
                .iter()
                .filter(|impact| impact.target == entity)
                .any(|impact| door.unlocks_with(has_key, impact.weapon));

        if by_contact || by_shot {
            door.open = true;
            info!("Door '{}' opened", door.id);
            events.send(GameEvent::DoorOpened {
                entity,
                door_id: door.id.clone(),
            });
        }
    }
}

fn reach_exit(
    mut events: EventWriter<GameEvent>,
    mut next_state: ResMut<NextState<GameState>>,
    player: Query<(&Transform, &Collider, &Health), With<Player>>,
    exits: Query<(&Transform, &Collider), (With<LevelExit>, Without<Player>)>,
) {
    let Ok((transform, collider, health)) = player.get_single() else {
        return;
    };
    if health.is_dead() {
        return;
    }
    let rect = player_rect((transform, collider));
    if exits
        .iter()
        .any(|(exit_transform, exit_collider)| overlaps(rect, entity_rect(exit_transform, exit_collider)))
    {
        info!("Level exit reached");
        events.send(GameEvent::LevelExitReached);
        next_state.set(GameState::Won);
    }
}
