//! Laser Dodge entry point
//!
//! Wires the capture pipeline, the simulation world and the operator
//! command channel into the fixed-rate main loop:
//!
//!   1. Read the latest frame snapshot (non-blocking)
//!   2. Tick the simulation (state machine, beams, collision, particles)
//!   3. Hand snapshots to the external renderer/HUD/audio collaborators
//!   4. Sleep out the rest of the frame
//!
//! Operator commands (one per line on stdin):
//!   p      toggle pause
//!   1-4    force difficulty tier
//!   0      difficulty back to auto
//!   r      reset leaderboard
//!   f      toggle FPS counter
//!   d      toggle debug mask view
//!   q      quit
//!
//! `laser-dodge --calibrate` records the empty-scene profile required by
//! the production segmentation backend.

use std::io::BufRead;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, unbounded};

use laser_dodge::capture::device::FfmpegCamera;
use laser_dodge::capture::{SceneProfile, SegmentationPipeline, select_backend};
use laser_dodge::consts::*;
use laser_dodge::sim::{GameEvent, TickInput, World};
use laser_dodge::{Leaderboard, Settings};

/// Discrete operator commands, each mapped to an explicit setter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperatorCommand {
    TogglePause,
    ForceDifficulty(u8),
    AutoDifficulty,
    ResetLeaderboard,
    ToggleFps,
    ToggleDebugMask,
    Quit,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load_default();

    if std::env::args().any(|a| a == "--calibrate") {
        return calibrate(&settings);
    }

    run(settings)
}

/// Record the empty-scene profile asset for the production backend
fn calibrate(settings: &Settings) -> ExitCode {
    log::info!(
        "Calibrating: keep the scene empty, averaging {} frames...",
        settings.calibration_frames
    );
    let mut device = FfmpegCamera::open(
        &settings.camera_device,
        INTERNAL_WIDTH,
        INTERNAL_HEIGHT,
        TARGET_FPS,
    );
    let profile = match SceneProfile::record(&mut device, settings.calibration_frames) {
        Ok(profile) => profile,
        Err(err) => {
            eprintln!("Calibration failed: could not read from the camera ({err})");
            return ExitCode::FAILURE;
        }
    };
    match profile.save(settings.scene_profile_path.as_ref()) {
        Ok(()) => {
            log::info!("Calibration complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Calibration failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(settings: Settings) -> ExitCode {
    // Backend selection happens exactly once, before the worker exists.
    // A missing scene profile is the only fatal condition in the core.
    let backend = match select_backend(
        settings.segmentation_backend,
        settings.scene_profile_path.as_ref(),
    ) {
        Ok(backend) => backend,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let device = FfmpegCamera::open(
        &settings.camera_device,
        INTERNAL_WIDTH,
        INTERNAL_HEIGHT,
        TARGET_FPS,
    );

    let mut pipeline = SegmentationPipeline::start(
        Box::new(device),
        backend,
        INTERNAL_WIDTH,
        INTERNAL_HEIGHT,
        settings.camera_mirror,
    );

    let mut leaderboard = Leaderboard::load_default();
    let commands = spawn_operator_reader();

    let start = Instant::now();
    let seed = settings
        .seed
        .unwrap_or_else(|| std::time::UNIX_EPOCH.elapsed().map_or(0, |d| d.as_secs()));
    let mut world = World::new(INTERNAL_WIDTH, INTERNAL_HEIGHT, seed, 0.0);
    log::info!("Game running (seed {seed}). Step into the frame to play.");

    let frame_duration = Duration::from_secs_f64(1.0 / TARGET_FPS as f64);
    let mut show_fps = settings.show_fps;
    let mut show_debug_mask = settings.show_debug_mask;
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();
        let now = start.elapsed().as_secs_f64();
        // Clamp dt so an OS stall can't explode the simulation
        let dt = last_tick.elapsed().as_secs_f64().min(MAX_DT) as f32;
        last_tick = frame_start;

        let mut quit = false;
        for command in commands.try_iter() {
            match command {
                OperatorCommand::TogglePause => world.state.toggle_pause(now),
                OperatorCommand::ForceDifficulty(level) => {
                    world.state.set_forced_difficulty(Some(level));
                    log::info!("Forced difficulty tier: {level}");
                }
                OperatorCommand::AutoDifficulty => {
                    world.state.set_forced_difficulty(None);
                    log::info!("Difficulty set to auto");
                }
                OperatorCommand::ResetLeaderboard => {
                    leaderboard.reset();
                    log::info!("Leaderboard reset");
                }
                OperatorCommand::ToggleFps => {
                    show_fps = !show_fps;
                    log::info!("FPS counter: {show_fps}");
                }
                OperatorCommand::ToggleDebugMask => {
                    show_debug_mask = !show_debug_mask;
                    log::info!("Debug mask view: {show_debug_mask}");
                }
                OperatorCommand::Quit => quit = true,
            }
        }
        if quit {
            break;
        }

        // Last-value-wins read; the camera thread is never waited on
        let snapshot = pipeline.snapshot();
        let input = TickInput {
            body_detected: snapshot.detected,
            centroid: snapshot.mask.centroid(),
            collision_mask: &snapshot.collision_mask,
        };
        let events = world.tick(now, dt, input, &mut leaderboard);
        for event in &events {
            report_event(event);
        }

        // Rendering, HUD and audio are external consumers of
        // `world.state`, `world.beams.beams()`, `world.particles` and
        // `snapshot.raw_frame`; they plug in here.

        if let Some(remaining) = frame_duration.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    log::info!("Shutting down");
    pipeline.stop();
    ExitCode::SUCCESS
}

/// Narrate session milestones for the venue log
fn report_event(event: &GameEvent) {
    match event {
        GameEvent::CountdownStarted => log::info!("Player detected; countdown started"),
        GameEvent::PlayStarted => log::info!("Session started"),
        GameEvent::Hit { point, .. } => {
            log::info!("Hit at ({:.0}, {:.0})", point.x, point.y);
        }
        GameEvent::AntiCampFired { x } => log::info!("Anti-camp beam fired at x={x}"),
        GameEvent::GameOver {
            final_time,
            rank,
            is_new_highscore,
        } => match (rank, is_new_highscore) {
            (Some(rank), true) => {
                log::info!("Game over: {final_time:.1}s - NEW HIGH SCORE (rank {})", rank + 1);
            }
            (Some(rank), false) => {
                log::info!("Game over: {final_time:.1}s (rank {})", rank + 1);
            }
            _ => log::info!("Game over: {final_time:.1}s"),
        },
    }
}

/// Read operator commands from stdin on a side thread
fn spawn_operator_reader() -> Receiver<OperatorCommand> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("operator".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let Some(command) = parse_command(line.trim()) else {
                    continue;
                };
                if tx.send(command).is_err() {
                    break;
                }
            }
        })
        .expect("failed to spawn operator thread");
    rx
}

fn parse_command(input: &str) -> Option<OperatorCommand> {
    match input {
        "p" => Some(OperatorCommand::TogglePause),
        "0" => Some(OperatorCommand::AutoDifficulty),
        "1" | "2" | "3" | "4" => {
            Some(OperatorCommand::ForceDifficulty(input.parse().ok()?))
        }
        "r" => Some(OperatorCommand::ResetLeaderboard),
        "f" => Some(OperatorCommand::ToggleFps),
        "d" => Some(OperatorCommand::ToggleDebugMask),
        "q" => Some(OperatorCommand::Quit),
        _ => None,
    }
}
