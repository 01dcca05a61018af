//! Inspect command - summarize a recording without playing it

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Args;
use simreel_core::Config;
use simreel_core::replay::{HeaderEvent, RecordingStorage, parse_recording};

use crate::StorageArgs;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Recording name or path (.jsonl)
    pub recording: String,

    #[command(flatten)]
    pub storage: StorageArgs,
}

/// What a recording contains
#[derive(Debug, Default, PartialEq)]
pub struct RecordingSummary {
    pub header: Option<HeaderEvent>,
    pub keyframes: usize,
    pub inputs: usize,
    pub skipped_lines: usize,
    /// Earliest and latest keyframe timestamps
    pub span: Option<(f64, f64)>,
    /// Fewest and most entities in a single keyframe
    pub entity_range: Option<(usize, usize)>,
    /// Largest per-keyframe count of each entity name
    pub peak_by_name: BTreeMap<String, usize>,
}

impl RecordingSummary {
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let parsed = parse_recording(lines);

        let span = parsed
            .keyframes
            .iter()
            .map(|k| k.t)
            .fold(None, |span: Option<(f64, f64)>, t| match span {
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
                None => Some((t, t)),
            });

        let entity_range = parsed
            .keyframes
            .iter()
            .map(|k| k.len())
            .fold(None, |range: Option<(usize, usize)>, n| match range {
                Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
                None => Some((n, n)),
            });

        let mut peak_by_name = BTreeMap::new();
        for keyframe in &parsed.keyframes {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for entity in &keyframe.entities {
                *counts.entry(entity.id.as_str()).or_default() += 1;
            }
            for (name, count) in counts {
                let peak = peak_by_name.entry(name.to_string()).or_insert(0);
                *peak = (*peak).max(count);
            }
        }

        Self {
            header: parsed.header,
            keyframes: parsed.keyframes.len(),
            inputs: parsed.inputs.len(),
            skipped_lines: parsed.skipped_lines,
            span,
            entity_range,
            peak_by_name,
        }
    }
}

/// Execute the inspect command
pub fn execute(args: InspectArgs, config: &Config) -> Result<()> {
    let storage = args.storage.open(config);
    let lines = storage
        .read_lines(&args.recording)
        .with_context(|| format!("Failed to read recording: {}", args.recording))?;
    let summary = RecordingSummary::from_lines(&lines);

    println!("=== Recording: {} ===", args.recording);
    match summary.header {
        Some(header) => {
            println!("Format version: {}", header.version);
            println!("Canvas: {}x{}", header.width, header.height);
        }
        None => println!("Header: missing"),
    }

    println!();
    println!("Lines: {}", lines.len());
    println!("Keyframes: {}", summary.keyframes);
    println!("Input events: {}", summary.inputs);
    println!("Skipped lines: {}", summary.skipped_lines);

    if let Some((start, end)) = summary.span {
        println!("Time span: {:.2}s - {:.2}s", start, end);
    }
    if let Some((fewest, most)) = summary.entity_range {
        println!("Entities per keyframe: {} - {}", fewest, most);
    }

    if !summary.peak_by_name.is_empty() {
        println!();
        println!("=== Entities (peak count) ===");
        for (name, peak) in &summary.peak_by_name {
            let name = if name.is_empty() { "<unnamed>" } else { name };
            println!("  {:<24} {}", name, peak);
        }
    }

    Ok(())
}
