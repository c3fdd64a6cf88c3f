use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use staffdb::cli::{
    MigrateCommands, run_deltas, run_describe, run_init, run_migrate_down, run_migrate_status,
    run_migrate_up,
};

#[derive(Parser)]
#[command(name = "staffdb")]
#[command(about = "Schema evolution for the HR and payroll database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and base tables
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Apply, revert or inspect schema deltas
    Migrate {
        #[command(subcommand)]
        command: MigrateCommands,
    },

    /// Show the columns of a table
    Describe {
        /// Table name
        table: String,

        /// Data directory containing the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every known delta in apply order
    Deltas {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("staffdb=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => run_init(data_dir)?,
        Commands::Migrate { command } => match command {
            MigrateCommands::Up { data_dir, to } => run_migrate_up(data_dir, to)?,
            MigrateCommands::Down {
                data_dir,
                steps,
                to,
                all,
            } => run_migrate_down(data_dir, steps, to, all)?,
            MigrateCommands::Status { data_dir, json } => run_migrate_status(data_dir, json)?,
        },
        Commands::Describe {
            table,
            data_dir,
            json,
        } => run_describe(data_dir, table, json)?,
        Commands::Deltas { json } => run_deltas(json)?,
    }

    Ok(())
}
