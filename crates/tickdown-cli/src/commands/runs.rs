use clap::Subcommand;
use tickdown_core::storage::Database;

#[derive(Subcommand)]
pub enum RunsAction {
    /// Most recent runs
    List {
        /// Maximum number of runs to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Totals across all runs
    Stats,
}

pub fn run(action: RunsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        RunsAction::List { limit } => {
            let runs = db.recent_runs(limit)?;
            println!("{}", serde_json::to_string_pretty(&runs)?);
        }
        RunsAction::Stats => {
            let stats = db.run_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
