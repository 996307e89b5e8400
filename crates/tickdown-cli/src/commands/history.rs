use clap::Subcommand;
use serde::Serialize;
use tickdown_core::{Database, HistoryRecorder, PersistentHistory, TimerDuration};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Show recently used durations, newest first
    List,
    /// Forget all recent durations
    Clear,
}

#[derive(Serialize)]
struct HistoryRow {
    label: String,
    total_secs: u64,
    #[serde(flatten)]
    duration: TimerDuration,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut history = PersistentHistory::load(Database::open()?);

    match action {
        HistoryAction::List => {
            let rows: Vec<HistoryRow> = history
                .recent()
                .into_iter()
                .map(|duration| HistoryRow {
                    label: duration.to_string(),
                    total_secs: duration.total_seconds(),
                    duration,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        HistoryAction::Clear => {
            history.clear();
            println!("history cleared");
        }
    }
    Ok(())
}
