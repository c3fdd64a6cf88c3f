use clap::Subcommand;

#[derive(Subcommand)]
pub enum MigrateCommands {
    /// Apply pending deltas
    Up {
        /// Data directory containing the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Stop after applying this delta
        #[arg(long)]
        to: Option<String>,
    },

    /// Revert applied deltas, newest first
    Down {
        /// Data directory containing the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Number of deltas to revert
        #[arg(long, conflicts_with_all = ["to", "all"])]
        steps: Option<usize>,

        /// Revert every delta applied after this one
        #[arg(long, conflicts_with = "all")]
        to: Option<String>,

        /// Revert every applied delta
        #[arg(long)]
        all: bool,
    },

    /// Show applied and pending deltas
    Status {
        /// Data directory containing the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
