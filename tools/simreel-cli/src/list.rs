//! List command - show recordings in the recordings directory

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::Args;
use simreel_core::Config;
use simreel_core::replay::{RecordingHandle, RecordingStorage};

use crate::StorageArgs;

/// Arguments for the list command
#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub storage: StorageArgs,
}

/// Execute the list command
pub fn execute(args: ListArgs, config: &Config) -> Result<()> {
    let storage = args.storage.open(config);
    let recordings = storage.list_available();

    println!("=== Recordings ===");
    println!("  Directory: {}", storage.dir().display());

    if recordings.is_empty() {
        println!();
        println!("No recordings found.");
        return Ok(());
    }

    println!();
    for handle in &recordings {
        println!("  {}", describe(handle));
    }
    println!();
    println!("{} recording(s)", recordings.len());

    Ok(())
}

/// One listing line: name, size and modification time
fn describe(handle: &RecordingHandle) -> String {
    let modified = handle
        .modified
        .map(|time| {
            DateTime::<Local>::from(time)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<32} {:>10}  {}",
        handle.name,
        format_size(handle.size_bytes),
        modified
    )
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    match bytes {
        b if b >= MIB => format!("{:.1} MiB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.1} KiB", b as f64 / KIB as f64),
        b => format!("{} B", b),
    }
}
