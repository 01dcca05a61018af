//! Demo command - run a small built-in simulation and record it
//!
//! A player wanders the canvas under random WASD input while enemies rain
//! down from the top edge. Touching an enemy moves the player to a random
//! clear spot. Everything runs on a seeded RNG, so a seed always produces
//! the same recording.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Args;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use simreel_core::placement::random_point;
use simreel_core::replay::{ENEMY_COLOR, ENEMY_SIZE, RecordingStats, Rgba, ShapeKind, StartOutcome};
use simreel_core::{
    Config, MAX_POSITION_ATTEMPTS, RecordableEntity, Recorder, RecordingStorage, ShapeDescriptor,
    reposition_until_clear,
};
use tracing::{debug, warn};

use crate::StorageArgs;

/// Canvas width written to the header
pub const WIDTH: u32 = 800;
/// Canvas height written to the header
pub const HEIGHT: u32 = 600;
/// Simulation tick
pub const TICK: f64 = 1.0 / 60.0;

const PLAYER_SPEED: f32 = 200.0;
const PLAYER_FRICTION: f32 = 0.95;
const HIT_DISTANCE: f32 = 32.0;
/// Entities are kept this far inside the right and bottom edges
const EDGE_MARGIN: f32 = 20.0;
const INITIAL_ENEMIES: usize = 3;
const DECORATIONS: usize = 5;
const DECORATION_SIZE: f32 = 5.0;
const DECORATION_COLOR: Rgba = Rgba::new(0.5, 0.5, 1.0, 0.8);
/// Seconds between increases of the enemy spawn rate
const SPAWN_RAMP_SECS: f32 = 3.0;
/// Seconds the player holds a direction before choosing again
const STEER_SECS: f32 = 0.5;

const KEY_W: i32 = 87;
const KEY_A: i32 = 65;
const KEY_S: i32 = 83;
const KEY_D: i32 = 68;

/// Arguments for the demo command
#[derive(Args)]
pub struct DemoArgs {
    /// Simulated seconds to record
    #[arg(long, default_value = "10")]
    pub seconds: f64,

    /// RNG seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Recording name (default: demo-<timestamp>)
    #[arg(long)]
    pub name: Option<String>,

    /// Pace ticks in wall-clock time instead of running flat out
    #[arg(long)]
    pub realtime: bool,

    #[command(flatten)]
    pub storage: StorageArgs,
}

/// What a body in the demo is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Player,
    Enemy,
    Decoration,
}

/// One simulated entity
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub kind: BodyKind,
    pub key: u64,
    pub position: Vec2,
    pub velocity: Vec2,
}

impl RecordableEntity for Body {
    fn name(&self) -> &str {
        match self.kind {
            BodyKind::Player => "Player",
            BodyKind::Enemy => "Enemy",
            BodyKind::Decoration => "Decoration",
        }
    }

    fn position(&self) -> Option<Vec2> {
        Some(self.position)
    }

    fn shape(&self) -> Option<ShapeDescriptor> {
        match self.kind {
            BodyKind::Player => None,
            BodyKind::Enemy => Some(ShapeDescriptor::new(
                ShapeKind::Rectangle,
                ENEMY_SIZE,
                ENEMY_COLOR,
            )),
            BodyKind::Decoration => Some(ShapeDescriptor::new(
                ShapeKind::Circle,
                Vec2::splat(DECORATION_SIZE),
                DECORATION_COLOR,
            )),
        }
    }

    fn velocity(&self) -> Option<Vec2> {
        match self.kind {
            BodyKind::Decoration => None,
            _ => Some(self.velocity),
        }
    }

    fn stable_key(&self) -> Option<u64> {
        Some(self.key)
    }
}

/// The demo simulation. The player is always the first body.
pub struct DemoSim {
    rng: Pcg32,
    bodies: Vec<Body>,
    bounds: Vec2,
    next_key: u64,
    held: Vec<i32>,
    steer_timer: f32,
    spawn_timer: f32,
    ramp_timer: f32,
    spawns_per_sec: u32,
    hits: u32,
}

impl DemoSim {
    pub fn new(seed: u64) -> Self {
        let mut sim = Self {
            rng: Pcg32::seed_from_u64(seed),
            bodies: Vec::new(),
            bounds: Vec2::new(WIDTH as f32, HEIGHT as f32),
            next_key: 0,
            held: Vec::new(),
            steer_timer: 0.0,
            spawn_timer: 0.0,
            ramp_timer: 0.0,
            spawns_per_sec: 1,
            hits: 0,
        };

        sim.add(BodyKind::Player, Vec2::new(400.0, 300.0), Vec2::ZERO);
        for _ in 0..INITIAL_ENEMIES {
            sim.spawn_enemy();
        }
        for _ in 0..DECORATIONS {
            let position = random_point(&mut sim.rng, sim.bounds);
            sim.add(BodyKind::Decoration, position, Vec2::ZERO);
        }
        sim
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Times the player touched an enemy
    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn spawns_per_sec(&self) -> u32 {
        self.spawns_per_sec
    }

    /// Keys currently held down
    pub fn held(&self) -> &[i32] {
        &self.held
    }

    /// Advance one tick. Returns the keys pressed since the previous tick.
    pub fn step(&mut self, dt: f32) -> Vec<i32> {
        let before = self.held.clone();
        self.steer(dt);
        self.move_bodies(dt);
        if self.player_hit() {
            self.hits += 1;
            self.reposition_player();
        }
        self.spawn(dt);

        self.held
            .iter()
            .copied()
            .filter(|key| !before.contains(key))
            .collect()
    }

    fn add(&mut self, kind: BodyKind, position: Vec2, velocity: Vec2) {
        self.bodies.push(Body {
            kind,
            key: self.next_key,
            position,
            velocity,
        });
        self.next_key += 1;
    }

    fn spawn_enemy(&mut self) {
        let position = Vec2::new(self.rng.random::<f32>() * self.bounds.x, 0.0);
        let velocity = Vec2::new(
            (self.rng.random::<f32>() - 0.5) * 100.0,
            self.rng.random::<f32>() * 100.0,
        );
        self.add(BodyKind::Enemy, position, velocity);
    }

    fn steer(&mut self, dt: f32) {
        self.steer_timer -= dt;
        if self.steer_timer <= 0.0 {
            self.steer_timer = STEER_SECS;
            self.held = match self.rng.random_range(0..6) {
                0 => vec![KEY_W],
                1 => vec![KEY_A],
                2 => vec![KEY_S],
                3 => vec![KEY_D],
                4 => vec![KEY_W, KEY_D],
                _ => Vec::new(),
            };
        }

        let mut direction = Vec2::ZERO;
        for key in &self.held {
            match *key {
                KEY_W => direction.y -= 1.0,
                KEY_S => direction.y += 1.0,
                KEY_A => direction.x -= 1.0,
                KEY_D => direction.x += 1.0,
                _ => {}
            }
        }

        let player = &mut self.bodies[0];
        player.velocity = if direction == Vec2::ZERO {
            player.velocity * PLAYER_FRICTION
        } else {
            direction.normalize() * PLAYER_SPEED
        };
    }

    fn move_bodies(&mut self, dt: f32) {
        let max = self.bounds - Vec2::splat(EDGE_MARGIN);
        for body in &mut self.bodies {
            if body.kind == BodyKind::Decoration {
                continue;
            }
            body.position += body.velocity * dt;
            if body.kind == BodyKind::Enemy && (body.position.x <= 0.0 || body.position.x >= max.x)
            {
                body.velocity.x = -body.velocity.x;
            }
            body.position.x = body.position.x.clamp(0.0, max.x);
            if body.kind == BodyKind::Player {
                body.position.y = body.position.y.clamp(0.0, max.y);
            }
        }
        // Enemies leave through the bottom edge
        self.bodies
            .retain(|b| b.kind != BodyKind::Enemy || b.position.y < max.y);
    }

    fn player_hit(&self) -> bool {
        let player = self.bodies[0].position;
        enemies_near(&self.bodies, player)
    }

    fn reposition_player(&mut self) {
        let start = self.bodies[0].position;
        let area = self.bounds - Vec2::splat(EDGE_MARGIN);
        let bodies = &self.bodies;
        let rng = &mut self.rng;

        let placement = reposition_until_clear(
            start,
            MAX_POSITION_ATTEMPTS,
            || random_point(rng, area),
            |candidate| enemies_near(bodies, candidate),
        );
        debug!(
            "Player moved to ({:.1}, {:.1}) after {} attempts",
            placement.position.x, placement.position.y, placement.attempts
        );
        self.bodies[0].position = placement.position;
    }

    fn spawn(&mut self, dt: f32) {
        self.spawn_timer += dt;
        self.ramp_timer += dt;
        if self.spawn_timer > 1.0 / self.spawns_per_sec as f32 {
            self.spawn_enemy();
            self.spawn_timer = 0.0;
        }
        if self.ramp_timer > SPAWN_RAMP_SECS {
            self.spawns_per_sec += 1;
            self.ramp_timer = 0.0;
        }
    }
}

fn enemies_near(bodies: &[Body], point: Vec2) -> bool {
    bodies
        .iter()
        .any(|b| b.kind == BodyKind::Enemy && b.position.distance(point) < HIT_DISTANCE)
}

/// Run `sim` for `ticks` ticks, recording into `name`
pub fn record(
    sim: &mut DemoSim,
    recorder: &mut Recorder,
    storage: &dyn RecordingStorage,
    name: &str,
    ticks: u64,
    realtime: bool,
) -> Result<RecordingStats> {
    let outcome = recorder
        .start(storage, name, WIDTH, HEIGHT)
        .with_context(|| format!("Failed to start recording: {}", name))?;
    if outcome == StartOutcome::AlreadyRecording {
        bail!("Recorder is already running");
    }

    for _ in 0..ticks {
        let keys = sim.step(TICK as f32);
        recorder.update(TICK, sim.bodies(), &keys);
        if !recorder.is_recording() {
            warn!("Recording ended early");
            break;
        }
        if realtime {
            std::thread::sleep(Duration::from_secs_f64(TICK));
        }
    }

    Ok(recorder.stop().unwrap_or_else(|| recorder.stats()))
}

/// Execute the demo command
pub fn execute(args: DemoArgs, config: &Config) -> Result<()> {
    if !(args.seconds.is_finite() && args.seconds > 0.0) {
        bail!("--seconds must be a positive number");
    }

    let storage = args.storage.open(config);
    let name = args
        .name
        .unwrap_or_else(|| Local::now().format("demo-%Y%m%d-%H%M%S").to_string());
    let ticks = (args.seconds / TICK).round() as u64;

    println!("=== Demo ===");
    println!("  Seed: {}", args.seed);
    println!("  Duration: {:.1}s ({} ticks)", args.seconds, ticks);
    println!("  Recording: {}", name);

    let mut sim = DemoSim::new(args.seed);
    let mut recorder = Recorder::new(config.recording.clone());
    let stats = record(&mut sim, &mut recorder, &storage, &name, ticks, args.realtime)?;

    println!();
    println!("Keyframes: {}", stats.keyframes_emitted);
    println!("Input events: {}", stats.inputs_emitted);
    println!(
        "Lines written: {} ({} dropped)",
        stats.lines_written, stats.lines_dropped
    );
    println!("Player hits: {}", sim.hits());
    println!("Saved to: {}", storage.dir().display());

    Ok(())
}
