mod commands;
mod describe;
mod init;
mod migrate;

pub use commands::MigrateCommands;
pub use describe::{run_deltas, run_describe};
pub use init::run_init;
pub use migrate::{run_migrate_down, run_migrate_status, run_migrate_up};

use crate::config::Config;
use crate::store::SqliteStore;

/// Open the store in the data directory, checking it exists
pub fn init_store(data_dir: &str) -> anyhow::Result<(Config, SqliteStore)> {
    let config = Config::load(data_dir)?;
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'staffdb init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::new(&db_path)?;
    Ok((config, store))
}
