//! Headless demo: composes a minimal Bevy runtime with the simulation plugins, loads a small
//! built-in level and drives the player through a scripted run, logging what happens.
//!
//! No window, renderer or audio device is created; the app is stepped manually with
//! `App::update`, one call per simulation frame.

use bevy::log::LogPlugin;
use bevy::prelude::*;

use platformer_sim::collision::Orientation;
use platformer_sim::level::{
    DoorDef, EnemyDef, KeyDef, ObstacleDef, PickupDef, PickupKind, PlatformDef, RectDef,
};
use platformer_sim::{
    start_level, FrameReport, GameState, Intent, LevelDefinition, PlayerIntents, SimulationPlugin,
};

const DEMO_FRAMES: u64 = 600;

fn demo_level() -> LevelDefinition {
    LevelDefinition {
        world_size: Some(Vec2::new(2400.0, 1800.0)),
        player_start: Some(Vec2::new(100.0, 500.0)),
        platforms: vec![
            PlatformDef {
                rect: RectDef::new(0.0, 600.0, 2400.0, 40.0),
                ..default()
            },
            PlatformDef {
                rect: RectDef::new(400.0, 450.0, 200.0, 20.0),
                hookable: true,
                ..default()
            },
            PlatformDef {
                rect: RectDef::new(900.0, 380.0, 20.0, 220.0),
                orientation: Orientation::Vertical,
                ..default()
            },
            PlatformDef {
                rect: RectDef::new(1500.0, 590.0, 120.0, 10.0),
                hazardous: true,
                ..default()
            },
        ],
        enemies: vec![
            EnemyDef::Chaser {
                position: Vec2::new(700.0, 560.0),
                detection_range: None,
            },
            EnemyDef::Patrol {
                position: Vec2::new(1200.0, 560.0),
                range: Some(120.0),
            },
        ],
        pickups: vec![
            PickupDef {
                kind: PickupKind::Score,
                position: Vec2::new(250.0, 580.0),
            },
            PickupDef {
                kind: PickupKind::BlueWeaponPowerup,
                position: Vec2::new(320.0, 580.0),
            },
        ],
        obstacles: vec![ObstacleDef {
            position: Vec2::new(1000.0, 580.0),
            instant_kill: false,
        }],
        keys: vec![KeyDef {
            id: "gold".into(),
            position: Vec2::new(800.0, 580.0),
            color: [255, 215, 0],
        }],
        doors: vec![DoorDef {
            id: "gate".into(),
            rect: RectDef::new(1800.0, 480.0, 30.0, 120.0),
            required_key_id: Some("gold".into()),
            ..default()
        }],
        exit: Some(RectDef::new(2200.0, 520.0, 60.0, 80.0)),
    }
}

/// Intents for one scripted frame: keep running right, hop now and then, and spray the blue
/// weapon once it has been picked up.
fn scripted_intents(frame: u64) -> Vec<Intent> {
    let mut intents = vec![Intent::MoveRight, Intent::AimAt(Vec2::new(2000.0, 560.0))];
    match frame % 90 {
        0 => intents.push(Intent::Jump),
        30 => intents.push(Intent::Dash),
        45..=50 => intents.push(Intent::PrimaryDown),
        60 => intents.push(Intent::Reload),
        _ => {}
    }
    intents
}

fn main() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(SimulationPlugin);

    if let Err(error) = start_level(app.world_mut(), &demo_level()) {
        error!("Demo level rejected: {error}");
        return;
    }
    app.update();

    for frame in 0..DEMO_FRAMES {
        app.world_mut()
            .resource_mut::<PlayerIntents>()
            .extend(scripted_intents(frame));
        app.update();

        let report = app.world().resource::<FrameReport>();
        for event in &report.events {
            info!("frame {:>4}: {:?}", report.frame, event);
        }
        if report.frame % 60 == 0 {
            if let Some(player) = &report.snapshot.player {
                info!(
                    "frame {:>4}: player at ({:.1}, {:.1}) health {} weapon {:?}",
                    report.frame,
                    player.bounds.x,
                    player.bounds.y,
                    player.health,
                    player.current_weapon
                );
            }
        }

        match app.world().resource::<State<GameState>>().get() {
            GameState::Won => {
                info!("Level complete after {} frames", report.frame);
                break;
            }
            GameState::GameOver => {
                info!("Game over after {} frames", report.frame);
                break;
            }
            _ => {}
        }
    }
}
