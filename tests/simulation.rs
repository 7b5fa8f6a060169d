use bevy::prelude::*;

use platformer_sim::events::{ActorKind, DamageSource, DetachReason};
use platformer_sim::level::{
    DoorDef, EnemyDef, KeyDef, ObstacleDef, PickupDef, PickupKind, PlatformDef, RectDef,
};
use platformer_sim::level::LevelEntity;
use platformer_sim::movement::{Collider, Velocity};
use platformer_sim::player::Player;
use platformer_sim::projectile::{Projectile, ProjectileKind};
use platformer_sim::snapshot::{GeometryView, PlayerView};
use platformer_sim::weapons::WeaponId;
use platformer_sim::{
    start_level, ConfigError, FrameReport, GameEvent, GameState, Intent, LevelDefinition,
    PlayerIntents, SimConfig, SimulationPlugin,
};

const FLOOR_TOP: f32 = 500.0;
/// Player center resting on the floor (45 units tall).
const GROUNDED_Y: f32 = FLOOR_TOP - 22.5;

fn test_config() -> SimConfig {
    SimConfig {
        spawn_invulnerable: false,
        charge_duration_ms: 160,
        ..default()
    }
}

fn sim_app(config: SimConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(config)
        .add_plugins(SimulationPlugin);
    app
}

fn floor_level() -> LevelDefinition {
    LevelDefinition {
        player_start: Some(Vec2::new(100.0, GROUNDED_Y)),
        platforms: vec![PlatformDef {
            rect: RectDef::new(0.0, FLOOR_TOP, 1000.0, 40.0),
            ..default()
        }],
        exit: Some(RectDef::new(950.0, 420.0, 40.0, 80.0)),
        ..default()
    }
}

/// Validates and spawns `level`; the next update is the first simulation frame.
fn load(app: &mut App, level: &LevelDefinition) {
    start_level(app.world_mut(), level).expect("level should validate");
    app.update();
}

fn state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

fn step(app: &mut App, intents: &[Intent]) -> FrameReport {
    app.world_mut()
        .resource_mut::<PlayerIntents>()
        .extend(intents.iter().copied());
    app.update();
    app.world().resource::<FrameReport>().clone()
}

/// Runs `frames` idle frames and returns every event they raised.
fn run(app: &mut App, frames: usize) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        events.extend(step(app, &[]).events);
    }
    events
}

fn player(report: &FrameReport) -> &PlayerView {
    report.snapshot.player.as_ref().expect("player in snapshot")
}

fn center(view: &PlayerView) -> Vec2 {
    view.bounds.center()
}

/// Puts a round straight into the running level, bypassing the weapons.
fn spawn_round(app: &mut App, projectile: Projectile, at: Vec2, velocity: Vec2, size: Vec2) {
    app.world_mut().spawn((
        LevelEntity,
        projectile,
        Transform::from_translation(at.extend(2.0)),
        Velocity(velocity),
        Collider::from_size(size),
    ));
}

fn damage_from(events: &[GameEvent], wanted: DamageSource) -> f32 {
    events
        .iter()
        .filter_map(|event| match event {
            GameEvent::DamageTaken { amount, source, .. } if *source == wanted => Some(*amount),
            _ => None,
        })
        .sum()
}

/// Level with a purple weapon under the player and a hookable ledge up and to the right.
fn hook_level() -> LevelDefinition {
    let mut level = floor_level();
    level.pickups.push(PickupDef {
        kind: PickupKind::PurpleWeaponPowerup,
        position: Vec2::new(100.0, GROUNDED_Y),
    });
    level.platforms.push(PlatformDef {
        rect: RectDef::new(300.0, 300.0, 100.0, 40.0),
        hookable: true,
        ..default()
    });
    level
}

#[test]
fn invalid_level_never_starts() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        exit: None,
        ..floor_level()
    };
    assert_eq!(
        start_level(app.world_mut(), &level),
        Err(ConfigError::MissingExit)
    );

    app.update();
    app.update();
    assert_eq!(state(&app), GameState::Idle);
    let players = app
        .world_mut()
        .query_filtered::<Entity, With<Player>>()
        .iter(app.world())
        .count();
    assert_eq!(players, 0);
}

#[test]
fn clock_starts_at_first_frame() {
    let mut app = sim_app(test_config());
    load(&mut app, &floor_level());

    let report = step(&mut app, &[]);
    assert_eq!(state(&app), GameState::Playing);
    assert_eq!(report.frame, 1);
    assert_eq!(report.time_ms, 16);
}

#[test]
fn restart_replaces_every_level_entity() {
    let mut app = sim_app(test_config());
    load(&mut app, &floor_level());
    run(&mut app, 10);

    load(&mut app, &floor_level());
    let report = step(&mut app, &[]);
    assert_eq!(report.frame, 1);

    let players = app
        .world_mut()
        .query_filtered::<Entity, With<Player>>()
        .iter(app.world())
        .count();
    assert_eq!(players, 1);
    assert_eq!(report.snapshot.geometry.len(), 1);
}

#[test]
fn falling_player_lands_on_the_floor() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        player_start: Some(Vec2::new(100.0, 400.0)),
        ..floor_level()
    };
    load(&mut app, &level);

    let report = step(&mut app, &[]);
    assert!(!player(&report).on_ground);

    run(&mut app, 60);
    let report = step(&mut app, &[]);
    let view = player(&report);
    assert!(view.on_ground);
    assert_eq!(view.jump_count, 0);
    assert!((view.bounds.y + view.bounds.height - FLOOR_TOP).abs() < 0.01);
}

#[test]
fn second_jump_allowed_third_ignored() {
    let mut app = sim_app(test_config());
    load(&mut app, &floor_level());
    let grounded = step(&mut app, &[]);
    assert!(player(&grounded).on_ground);

    let first = step(&mut app, &[Intent::Jump]);
    assert_eq!(player(&first).jump_count, 1);
    assert!(center(player(&first)).y < GROUNDED_Y);

    let second = step(&mut app, &[Intent::Jump]);
    assert_eq!(player(&second).jump_count, 2);

    let third = step(&mut app, &[Intent::Jump]);
    assert_eq!(player(&third).jump_count, 2);

    run(&mut app, 120);
    let landed = step(&mut app, &[]);
    assert!(player(&landed).on_ground);
    assert_eq!(player(&landed).jump_count, 0);
}

#[test]
fn dash_triples_horizontal_speed() {
    let mut app = sim_app(test_config());
    load(&mut app, &floor_level());
    let before = center(player(&step(&mut app, &[]))).x;

    let report = step(&mut app, &[Intent::MoveRight, Intent::Dash]);
    assert!(report.events.contains(&GameEvent::DashStarted));
    let after = center(player(&report)).x;
    assert!((after - before - 15.0).abs() < 1e-3);

    // Cooldown still running: a second trigger is ignored.
    let again = step(&mut app, &[Intent::Dash]);
    assert!(!again.events.contains(&GameEvent::DashStarted));
}

#[test]
fn chaser_closes_in_on_player() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        enemies: vec![EnemyDef::Chaser {
            position: Vec2::new(300.0, 480.0),
            detection_range: None,
        }],
        ..floor_level()
    };
    load(&mut app, &level);

    run(&mut app, 29);
    let report = step(&mut app, &[]);
    let chaser = &report.snapshot.enemies[0];
    let x = chaser.bounds.center().x;
    assert!((x - 240.0).abs() < 1e-3, "chaser at {x}");
}

#[test]
fn patrol_stays_near_its_range() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        enemies: vec![EnemyDef::Patrol {
            position: Vec2::new(500.0, 482.5),
            range: Some(50.0),
        }],
        ..floor_level()
    };
    load(&mut app, &level);

    let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
    for _ in 0..200 {
        let report = step(&mut app, &[]);
        let x = report.snapshot.enemies[0].bounds.center().x;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    assert!(max_x > 549.0 && max_x <= 551.5, "max {max_x}");
    assert!(min_x < 451.0 && min_x >= 448.5, "min {min_x}");
}

#[test]
fn spawn_grace_blocks_early_spike_damage() {
    let mut app = sim_app(SimConfig::default());
    let level = LevelDefinition {
        obstacles: vec![ObstacleDef {
            position: Vec2::new(90.0, 480.0),
            instant_kill: false,
        }],
        ..floor_level()
    };
    load(&mut app, &level);

    let events = run(&mut app, 20);
    assert!(!events
        .iter()
        .any(|event| matches!(event, GameEvent::DamageTaken { .. })));
    assert_eq!(player(&step(&mut app, &[])).health, 100.0);
}

#[test]
fn spike_hurts_once_per_invulnerability_window() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        obstacles: vec![ObstacleDef {
            position: Vec2::new(90.0, 480.0),
            instant_kill: false,
        }],
        ..floor_level()
    };
    load(&mut app, &level);

    let events = run(&mut app, 30);
    let hits: Vec<_> = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                GameEvent::DamageTaken {
                    source: DamageSource::Spike,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(hits.len(), 1);

    let view = player(&step(&mut app, &[])).clone();
    assert_eq!(view.health, 80.0);
    assert!(view.invulnerable);
}

#[test]
fn instant_kill_spike_ends_the_run() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        obstacles: vec![ObstacleDef {
            position: Vec2::new(90.0, 480.0),
            instant_kill: true,
        }],
        ..floor_level()
    };
    load(&mut app, &level);

    let report = step(&mut app, &[]);
    assert!(report.events.iter().any(|event| matches!(
        event,
        GameEvent::Died {
            actor: ActorKind::Player,
            ..
        }
    )));
    assert_eq!(player(&report).health, 0.0);

    app.update();
    assert_eq!(state(&app), GameState::GameOver);
}

#[test]
fn hazardous_platform_kills_on_touch() {
    let mut app = sim_app(test_config());
    let mut level = floor_level();
    level.platforms.push(PlatformDef {
        rect: RectDef::new(123.0, 450.0, 30.0, 50.0),
        hazardous: true,
        ..default()
    });
    load(&mut app, &level);

    let report = step(&mut app, &[]);
    assert!(report.events.iter().any(|event| matches!(
        event,
        GameEvent::DamageTaken {
            source: DamageSource::Hazard,
            ..
        }
    )));
    app.update();
    assert_eq!(state(&app), GameState::GameOver);
}

#[test]
fn key_opens_door_and_exit_wins() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        pickups: vec![PickupDef {
            kind: PickupKind::Score,
            position: Vec2::new(160.0, 480.0),
        }],
        keys: vec![KeyDef {
            id: "gold".into(),
            position: Vec2::new(200.0, 480.0),
            color: [255, 215, 0],
        }],
        doors: vec![DoorDef {
            id: "gate".into(),
            rect: RectDef::new(300.0, 400.0, 20.0, 100.0),
            required_key_id: Some("gold".into()),
            ..default()
        }],
        exit: Some(RectDef::new(450.0, 420.0, 40.0, 80.0)),
        ..floor_level()
    };
    load(&mut app, &level);

    let mut events = Vec::new();
    for _ in 0..150 {
        events.extend(step(&mut app, &[Intent::MoveRight]).events);
        if state(&app) != GameState::Playing {
            break;
        }
    }

    assert!(events.contains(&GameEvent::PickupCollected {
        kind: PickupKind::Score
    }));
    assert!(events.contains(&GameEvent::KeyCollected {
        key_id: "gold".into()
    }));
    assert!(events.iter().any(|event| matches!(
        event,
        GameEvent::DoorOpened { door_id, .. } if door_id == "gate"
    )));
    assert!(events.contains(&GameEvent::LevelExitReached));
    assert_eq!(state(&app), GameState::Won);
}

#[test]
fn locked_door_blocks_without_key() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        doors: vec![DoorDef {
            id: "gate".into(),
            rect: RectDef::new(300.0, 400.0, 20.0, 100.0),
            required_key_id: Some("gold".into()),
            ..default()
        }],
        ..floor_level()
    };
    load(&mut app, &level);

    let mut report = step(&mut app, &[]);
    for _ in 0..100 {
        report = step(&mut app, &[Intent::MoveRight]);
    }
    let view = player(&report);
    assert!(view.bounds.x + view.bounds.width <= 300.0 + 1e-3);
    assert!(report.snapshot.geometry.iter().any(|geometry| matches!(
        geometry,
        GeometryView::Door { open: false, .. }
    )));
}

#[test]
fn weapon_locked_door_opens_when_shot_with_that_weapon() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        pickups: vec![PickupDef {
            kind: PickupKind::BlueWeaponPowerup,
            position: Vec2::new(100.0, GROUNDED_Y),
        }],
        doors: vec![DoorDef {
            id: "blue-gate".into(),
            rect: RectDef::new(300.0, 400.0, 20.0, 100.0),
            required_weapon: Some("blue".into()),
            ..default()
        }],
        ..floor_level()
    };
    load(&mut app, &level);

    let report = step(&mut app, &[]);
    assert!(report.events.contains(&GameEvent::WeaponEquipped {
        weapon: WeaponId::Blue
    }));

    let mut events = step(
        &mut app,
        &[Intent::AimAt(Vec2::new(310.0, 450.0)), Intent::PrimaryDown],
    )
    .events;
    events.extend(run(&mut app, 20));

    assert!(events.iter().any(|event| matches!(
        event,
        GameEvent::ShotFired {
            weapon: Some(WeaponId::Blue),
            ..
        }
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        GameEvent::DoorOpened { door_id, .. } if door_id == "blue-gate"
    )));
}

#[test]
fn charged_red_shot_kills_chaser() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        pickups: vec![PickupDef {
            kind: PickupKind::RedWeaponPowerup,
            position: Vec2::new(100.0, GROUNDED_Y),
        }],
        enemies: vec![EnemyDef::Chaser {
            position: Vec2::new(400.0, 480.0),
            detection_range: None,
        }],
        ..floor_level()
    };
    load(&mut app, &level);

    let report = step(&mut app, &[]);
    assert_eq!(player(&report).current_weapon, WeaponId::Red);

    let mut events = step(
        &mut app,
        &[Intent::AimAt(Vec2::new(400.0, 480.0)), Intent::PrimaryDown],
    )
    .events;
    events.extend(run(&mut app, 12));
    let charged = step(&mut app, &[]);
    assert_eq!(player(&charged).red_charge, 1.0);

    events.extend(step(&mut app, &[Intent::PrimaryUp]).events);
    events.extend(run(&mut app, 20));

    assert!(events.contains(&GameEvent::ShotFired {
        weapon: Some(WeaponId::Red),
        kind: ProjectileKind::ChargedSniper,
    }));
    assert!(events.iter().any(|event| matches!(
        event,
        GameEvent::Died {
            actor: ActorKind::Enemy(_),
            ..
        }
    )));

    let report = step(&mut app, &[]);
    assert!(report.snapshot.enemies.is_empty());
    let red = player(&report)
        .weapons
        .iter()
        .find(|view| view.weapon == WeaponId::Red)
        .expect("red weapon owned");
    assert_eq!(red.ammo, 0);
}

#[test]
fn normal_weapon_respects_delay_and_reloads() {
    let mut app = sim_app(test_config());
    load(&mut app, &floor_level());

    let mut shots = 0;
    for _ in 0..50 {
        let report = step(&mut app, &[Intent::PrimaryDown]);
        shots += report
            .events
            .iter()
            .filter(|event| matches!(event, GameEvent::ShotFired { .. }))
            .count();
        let ammo = player(&report).weapons[0].ammo;
        assert!(ammo <= 5);
        assert_eq!(ammo as usize, 5 - shots);
    }
    assert_eq!(shots, 4);

    let report = step(&mut app, &[Intent::Reload]);
    assert!(report.events.contains(&GameEvent::ReloadStarted {
        weapon: WeaponId::Normal
    }));
    assert!(player(&report).reloading);

    let events = run(&mut app, 40);
    assert!(events.contains(&GameEvent::ReloadFinished {
        weapon: WeaponId::Normal
    }));
    assert_eq!(player(&step(&mut app, &[])).weapons[0].ammo, 5);
}

#[test]
fn grapple_pulls_player_to_hookable_platform() {
    let mut app = sim_app(test_config());
    let mut level = floor_level();
    level.pickups.push(PickupDef {
        kind: PickupKind::PurpleWeaponPowerup,
        position: Vec2::new(100.0, GROUNDED_Y),
    });
    level.platforms.push(PlatformDef {
        rect: RectDef::new(300.0, 300.0, 100.0, 40.0),
        hookable: true,
        ..default()
    });
    load(&mut app, &level);
    step(&mut app, &[]);

    let anchor = Vec2::new(320.0, 330.0);
    let report = step(&mut app, &[Intent::AimAt(anchor), Intent::SecondaryDown]);
    assert!(report.events.iter().any(|event| matches!(
        event,
        GameEvent::GrappleAttached { point, .. } if *point == anchor
    )));
    assert_eq!(player(&report).grapple_point, Some(anchor));

    let events = run(&mut app, 30);
    assert!(events.contains(&GameEvent::GrappleDetached {
        reason: DetachReason::Arrived
    }));
}

#[test]
fn grapple_released_before_attaching() {
    let mut app = sim_app(test_config());
    let mut level = floor_level();
    level.pickups.push(PickupDef {
        kind: PickupKind::PurpleWeaponPowerup,
        position: Vec2::new(100.0, GROUNDED_Y),
    });
    load(&mut app, &level);
    step(&mut app, &[]);

    let report = step(
        &mut app,
        &[Intent::AimAt(Vec2::new(100.0, 100.0)), Intent::SecondaryDown],
    );
    assert!(player(&report).grapple_seeking);

    let report = step(&mut app, &[Intent::SecondaryUp]);
    assert!(report.events.contains(&GameEvent::GrappleDetached {
        reason: DetachReason::Released
    }));
    assert!(!player(&report).grapple_seeking);
}

#[test]
fn arc_shot_explodes_into_shrapnel() {
    let mut app = sim_app(test_config());
    let mut level = floor_level();
    level.pickups.push(PickupDef {
        kind: PickupKind::PurpleWeaponPowerup,
        position: Vec2::new(100.0, GROUNDED_Y),
    });
    level.enemies.push(EnemyDef::Patrol {
        position: Vec2::new(700.0, 482.5),
        range: Some(0.0),
    });
    load(&mut app, &level);
    step(&mut app, &[]);

    let mut events = step(
        &mut app,
        &[Intent::AimAt(Vec2::new(160.0, 480.0)), Intent::PrimaryDown],
    )
    .events;
    events.extend(run(&mut app, 12));
    events.extend(step(&mut app, &[Intent::PrimaryUp]).events);

    let mut most_shrapnel = 0;
    for _ in 0..260 {
        let report = step(&mut app, &[]);
        let shrapnel = report
            .snapshot
            .projectiles
            .iter()
            .filter(|projectile| projectile.kind == ProjectileKind::Shrapnel)
            .count();
        most_shrapnel = most_shrapnel.max(shrapnel);
        events.extend(report.events);
    }

    assert!(events.contains(&GameEvent::ShotFired {
        weapon: Some(WeaponId::Purple),
        kind: ProjectileKind::ArcExplosive,
    }));
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, GameEvent::ExplosionTriggered { .. }))
            .count(),
        1
    );
    assert_eq!(most_shrapnel, 8);
    assert!(events.iter().any(|event| matches!(
        event,
        GameEvent::Died {
            actor: ActorKind::Enemy(_),
            ..
        }
    )));
}

#[test]
fn level_definition_reads_from_json() {
    let json = r#"{
        "player_start": [100.0, 477.5],
        "platforms": [
            { "x": 0.0, "y": 500.0, "width": 1000.0, "height": 40.0 },
            { "x": 300.0, "y": 300.0, "width": 100.0, "height": 20.0, "orientation": "vertical", "hookable": true }
        ],
        "enemies": [
            { "kind": "patrol", "position": [600.0, 482.5], "range": 40.0 },
            { "kind": "chaser", "position": [800.0, 480.0] }
        ],
        "pickups": [{ "kind": "health", "position": [300.0, 480.0] }],
        "obstacles": [{ "position": [400.0, 480.0] }],
        "doors": [{ "id": "gate", "x": 850.0, "y": 400.0, "width": 20.0, "height": 100.0, "required_weapon": "red" }],
        "exit": { "x": 900.0, "y": 420.0, "width": 40.0, "height": 80.0 }
    }"#;
    let level: LevelDefinition = serde_json::from_str(json).expect("level json");

    assert_eq!(level.platforms.len(), 2);
    assert!(level.platforms[1].hookable);
    assert_eq!(
        level.enemies[1],
        EnemyDef::Chaser {
            position: Vec2::new(800.0, 480.0),
            detection_range: None
        }
    );
    assert!(!level.obstacles[0].instant_kill);
    assert_eq!(level.doors[0].required_weapon.as_deref(), Some("red"));

    let mut app = sim_app(test_config());
    load(&mut app, &level);
    let report = step(&mut app, &[]);
    assert_eq!(report.snapshot.enemies.len(), 2);
    assert_eq!(report.snapshot.geometry.len(), 3);

    let encoded = serde_json::to_value(&report).expect("report json");
    assert_eq!(encoded["frame"], 1);
}

#[test]
fn shrapnel_reflects_once_off_a_platform_seam() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        platforms: vec![
            PlatformDef {
                rect: RectDef::new(0.0, FLOOR_TOP, 500.0, 40.0),
                ..default()
            },
            PlatformDef {
                rect: RectDef::new(500.0, FLOOR_TOP, 500.0, 40.0),
                ..default()
            },
        ],
        ..floor_level()
    };
    load(&mut app, &level);
    step(&mut app, &[]);

    spawn_round(
        &mut app,
        Projectile {
            kind: ProjectileKind::Shrapnel,
            damage: 1.0,
            charge: 0.0,
            bounces_left: 2,
            explosive: false,
            weapon: None,
        },
        Vec2::new(498.0, 483.8),
        Vec2::new(0.0, 15.0),
        Vec2::splat(6.0),
    );

    let bounced = step(&mut app, &[]);
    let round = bounced.snapshot.projectiles[0].bounds;
    assert!(round.y + round.height <= FLOOR_TOP);

    let rising = step(&mut app, &[]);
    assert_eq!(rising.snapshot.projectiles.len(), 1);
    assert!(rising.snapshot.projectiles[0].bounds.y < round.y);
}

#[test]
fn detonation_on_an_enemy_lands_blast_and_every_fragment() {
    let mut config = test_config();
    config.patrol.health = 10.0;
    let mut app = sim_app(config);
    let level = LevelDefinition {
        enemies: vec![EnemyDef::Patrol {
            position: Vec2::new(600.0, 482.5),
            range: Some(0.0),
        }],
        ..floor_level()
    };
    load(&mut app, &level);
    step(&mut app, &[]);

    spawn_round(
        &mut app,
        Projectile {
            kind: ProjectileKind::ArcExplosive,
            damage: 0.0,
            charge: 1.0,
            bounces_left: 0,
            explosive: true,
            weapon: Some(WeaponId::Purple),
        },
        Vec2::new(600.0, 482.5),
        Vec2::ZERO,
        Vec2::splat(18.0),
    );

    let events = run(&mut app, 4);
    assert_eq!(damage_from(&events, DamageSource::Explosion), 2.0);
    assert_eq!(damage_from(&events, DamageSource::Projectile), 8.0);
    assert!(events.iter().any(|event| matches!(
        event,
        GameEvent::Died {
            actor: ActorKind::Enemy(_),
            ..
        }
    )));
}

#[test]
fn jump_dash_and_weapon_switch_cancel_an_attached_grapple() {
    for cancel in [Intent::Jump, Intent::Dash, Intent::SelectWeapon(1)] {
        let mut app = sim_app(test_config());
        load(&mut app, &hook_level());
        step(&mut app, &[]);

        let anchor = Vec2::new(320.0, 330.0);
        let attached = step(&mut app, &[Intent::AimAt(anchor), Intent::SecondaryDown]);
        assert_eq!(player(&attached).grapple_point, Some(anchor));

        let report = step(&mut app, &[cancel]);
        assert!(
            report.events.contains(&GameEvent::GrappleDetached {
                reason: DetachReason::Cancelled
            }),
            "{cancel:?} should cancel the grapple"
        );
        assert_eq!(player(&report).grapple_point, None);
    }
}

#[test]
fn dash_cancels_a_seeking_grapple() {
    let mut app = sim_app(test_config());
    load(&mut app, &hook_level());
    step(&mut app, &[]);

    let seeking = step(
        &mut app,
        &[Intent::AimAt(Vec2::new(100.0, 100.0)), Intent::SecondaryDown],
    );
    assert!(player(&seeking).grapple_seeking);

    let report = step(&mut app, &[Intent::Dash]);
    assert!(report.events.contains(&GameEvent::GrappleDetached {
        reason: DetachReason::Cancelled
    }));
    assert!(!player(&report).grapple_seeking);
}

#[test]
fn opening_the_hooked_door_drops_the_grapple() {
    let mut app = sim_app(test_config());
    let mut level = floor_level();
    level.pickups.push(PickupDef {
        kind: PickupKind::PurpleWeaponPowerup,
        position: Vec2::new(100.0, GROUNDED_Y),
    });
    level.doors.push(DoorDef {
        id: "hatch".into(),
        rect: RectDef::new(250.0, 300.0, 100.0, 200.0),
        hookable: true,
        ..default()
    });
    load(&mut app, &level);
    step(&mut app, &[]);

    let anchor = Vec2::new(340.0, 400.0);
    let attached = step(&mut app, &[Intent::AimAt(anchor), Intent::SecondaryDown]);
    assert_eq!(player(&attached).grapple_point, Some(anchor));

    let events = run(&mut app, 20);
    assert!(events.iter().any(|event| matches!(
        event,
        GameEvent::DoorOpened { door_id, .. } if door_id == "hatch"
    )));
    assert!(events.contains(&GameEvent::GrappleDetached {
        reason: DetachReason::TargetLost
    }));
    assert!(!events.contains(&GameEvent::GrappleDetached {
        reason: DetachReason::Arrived
    }));
}

#[test]
fn dash_ends_after_its_duration() {
    let mut app = sim_app(test_config());
    load(&mut app, &floor_level());
    let mut last_x = center(player(&step(&mut app, &[]))).x;

    let mut moves = Vec::new();
    let mut intents = vec![Intent::MoveRight, Intent::Dash];
    for _ in 0..14 {
        let report = step(&mut app, &intents);
        let x = center(player(&report)).x;
        moves.push(((x - last_x) * 100.0).round() / 100.0);
        last_x = x;
        intents = vec![Intent::MoveRight];
    }

    assert_eq!(&moves[..10], &[15.0; 10]);
    assert_eq!(&moves[10..], &[5.0; 4]);
    assert!(!player(&step(&mut app, &[])).dashing);
}

#[test]
fn health_pickup_heals_up_to_max() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        obstacles: vec![ObstacleDef {
            position: Vec2::new(90.0, 480.0),
            instant_kill: false,
        }],
        pickups: vec![PickupDef {
            kind: PickupKind::Health,
            position: Vec2::new(160.0, GROUNDED_Y),
        }],
        ..floor_level()
    };
    load(&mut app, &level);
    run(&mut app, 5);
    assert_eq!(player(&step(&mut app, &[])).health, 80.0);

    let mut events = Vec::new();
    for _ in 0..15 {
        events.extend(step(&mut app, &[Intent::MoveRight]).events);
    }
    assert!(events.contains(&GameEvent::PickupCollected {
        kind: PickupKind::Health
    }));
    assert_eq!(player(&step(&mut app, &[])).health, 100.0);
}

#[test]
fn speed_pickup_boosts_walking() {
    let mut app = sim_app(test_config());
    let mut level = floor_level();
    level.pickups.push(PickupDef {
        kind: PickupKind::Speed,
        position: Vec2::new(100.0, GROUNDED_Y),
    });
    load(&mut app, &level);

    let collected = step(&mut app, &[]);
    assert!(collected.events.contains(&GameEvent::PickupCollected {
        kind: PickupKind::Speed
    }));
    let before = center(player(&collected)).x;

    let report = step(&mut app, &[Intent::MoveRight]);
    assert!(player(&report).speed_boosted);
    assert!((center(player(&report)).x - before - 7.5).abs() < 1e-3);
}

#[test]
fn charge_powerup_fires_one_full_damage_shot() {
    let mut config = test_config();
    config.chaser.health = 10.0;
    let mut app = sim_app(config);
    let level = LevelDefinition {
        pickups: vec![PickupDef {
            kind: PickupKind::ChargePowerup,
            position: Vec2::new(100.0, GROUNDED_Y),
        }],
        enemies: vec![EnemyDef::Chaser {
            position: Vec2::new(400.0, 480.0),
            detection_range: None,
        }],
        ..floor_level()
    };
    load(&mut app, &level);
    assert!(player(&step(&mut app, &[])).charge_powerup_owned);

    let mut events = step(
        &mut app,
        &[Intent::AimAt(Vec2::new(400.0, 480.0)), Intent::SecondaryDown],
    )
    .events;
    events.extend(run(&mut app, 4));
    let fired = step(&mut app, &[Intent::SecondaryUp]);
    assert!(fired.events.contains(&GameEvent::ShotFired {
        weapon: None,
        kind: ProjectileKind::ChargedSniper,
    }));
    assert!(!player(&fired).charge_powerup_owned);
    events.extend(fired.events);
    events.extend(run(&mut app, 30));

    assert_eq!(damage_from(&events, DamageSource::Projectile), 10.0);
    assert!(events.iter().any(|event| matches!(
        event,
        GameEvent::Died {
            actor: ActorKind::Enemy(_),
            ..
        }
    )));

    // The power-up is gone, so holding secondary again does nothing.
    let mut events = step(&mut app, &[Intent::SecondaryDown]).events;
    events.extend(step(&mut app, &[Intent::SecondaryUp]).events);
    assert!(!events
        .iter()
        .any(|event| matches!(event, GameEvent::ShotFired { .. })));
}

#[test]
fn intents_pushed_after_game_over_are_dropped() {
    let mut app = sim_app(test_config());
    let level = LevelDefinition {
        obstacles: vec![ObstacleDef {
            position: Vec2::new(90.0, 480.0),
            instant_kill: true,
        }],
        ..floor_level()
    };
    load(&mut app, &level);
    step(&mut app, &[]);
    app.update();
    assert_eq!(state(&app), GameState::GameOver);

    for _ in 0..3 {
        step(&mut app, &[Intent::Jump, Intent::Dash, Intent::PrimaryDown]);
        assert!(app.world().resource::<PlayerIntents>().is_empty());
    }
}
