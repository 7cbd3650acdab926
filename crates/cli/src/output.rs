use crate::error::CliError;
use engine_core::state::CheckpointEntry;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).map_err(CliError::JsonSerialize)?;
    println!("{json}");
    Ok(())
}

pub fn print_checkpoints(stream: &str, entries: &[CheckpointEntry]) {
    println!("Checkpoints for stream '{stream}':");
    println!("-----------------------------");
    if entries.is_empty() {
        println!("(none)");
        return;
    }
    for entry in entries {
        println!(
            "{:<22} {:<32} {}",
            entry.seq,
            entry.recorded_at.to_rfc3339(),
            entry.bookmark
        );
    }
}
