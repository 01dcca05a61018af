//! Play command - run a recording through the headless player

use anyhow::{Context, Result, bail};
use clap::Args;
use simreel_core::replay::{HeadlessScene, PlaybackEntity, PlaybackScene, Player};
use simreel_core::{Config, PlayerConfig};

use crate::StorageArgs;

/// Arguments for the play command
#[derive(Args)]
pub struct PlayArgs {
    /// Recording name or path (.jsonl)
    pub recording: String,

    /// Simulated seconds between printed frames
    #[arg(long, default_value = "0.5")]
    pub step: f64,

    /// Playback speed multiplier (defaults to the configured speed)
    #[arg(long)]
    pub speed: Option<f64>,

    /// Print a frame count instead of every entity
    #[arg(long)]
    pub quiet: bool,

    #[command(flatten)]
    pub storage: StorageArgs,
}

/// Execute the play command
pub fn execute(args: PlayArgs, config: &Config) -> Result<()> {
    if !(args.step.is_finite() && args.step > 0.0) {
        bail!("--step must be a positive number of seconds");
    }

    let storage = args.storage.open(config);
    let player_config = PlayerConfig {
        speed: args.speed.unwrap_or(config.playback.speed),
    };
    let mut player = Player::new(HeadlessScene::new(), player_config);

    let summary = player
        .load(&storage, &args.recording)
        .with_context(|| format!("Failed to load recording: {}", args.recording))?;

    println!("=== Playing: {} ===", args.recording);
    println!(
        "  {} keyframes over {:.2}s at {:.1}x",
        summary.keyframes,
        summary.duration,
        player.speed()
    );
    if summary.keyframes == 0 {
        println!();
        println!("Nothing to play.");
        return Ok(());
    }

    let frames = run_to_end(&mut player, args.step, |player| {
        if !args.quiet {
            print_frame(player.clock(), player.entities());
        }
    });

    println!();
    println!(
        "Played {} frames, {} entity rebuilds",
        frames,
        player.rebuild_count()
    );
    Ok(())
}

/// Step `player` from its current clock to the end, calling `on_frame`
/// after every step. Returns the number of frames shown.
pub fn run_to_end<S, F>(player: &mut Player<S>, step: f64, mut on_frame: F) -> usize
where
    S: PlaybackScene,
    F: FnMut(&Player<S>),
{
    let mut frames = 0;
    player.advance(0.0);
    on_frame(player);
    frames += 1;

    while !player.is_at_end() && !player.is_paused() {
        player.advance(step);
        on_frame(player);
        frames += 1;
    }
    frames
}

fn print_frame(clock: f64, entities: &[PlaybackEntity]) {
    println!();
    println!("t = {:.2}s ({} entities)", clock, entities.len());
    for entity in entities {
        println!(
            "  {:<20} ({:>8.1}, {:>8.1})",
            entity.name, entity.position.x, entity.position.y
        );
    }
}
