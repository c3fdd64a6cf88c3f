use std::fs;

use tracing::info;

use crate::config::Config;
use crate::store::{AssociationStore, SqliteStore};

pub fn run_init(data_dir: String) -> anyhow::Result<()> {
    let config = Config::load(&data_dir)?;
    fs::create_dir_all(&config.data_dir)?;

    let db_path = config.db_path();
    let existed = db_path.exists();

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    info!(environment = %config.environment, "Initialized {}", db_path.display());

    if existed {
        println!("Database already present at {}", db_path.display());
    } else {
        println!("Created database at {}", db_path.display());
    }
    println!("Run 'staffdb migrate up --data-dir {data_dir}' to apply deltas.");

    Ok(())
}
