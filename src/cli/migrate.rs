use serde::Serialize;

use super::init_store;
use crate::delta::{DeltaId, catalog};

#[derive(Serialize)]
struct StatusOutput {
    environment: String,
    up_to_date: bool,
    #[serde(flatten)]
    status: crate::delta::MigrationStatus,
}

fn print_ids(verb: &str, ids: &[DeltaId]) {
    for id in ids {
        println!("{verb} {id}");
    }
}

pub fn run_migrate_up(data_dir: String, to: Option<String>) -> anyhow::Result<()> {
    let (_config, store) = init_store(&data_dir)?;
    let log = catalog::evolution_log()?;

    let conn = store.connection();
    let applied = match to {
        Some(id) => log.migrate_to(&*conn, &id)?,
        None => log.migrate(&*conn)?,
    };

    if applied.is_empty() {
        println!("Schema is up to date");
    } else {
        print_ids("Applied", &applied);
        println!("{} deltas applied", applied.len());
    }

    Ok(())
}

pub fn run_migrate_down(
    data_dir: String,
    steps: Option<usize>,
    to: Option<String>,
    all: bool,
) -> anyhow::Result<()> {
    let (config, store) = init_store(&data_dir)?;
    config.ensure_rollback_allowed()?;
    let log = catalog::evolution_log()?;

    let conn = store.connection();
    let reverted = if all {
        log.rollback_all(&*conn)?
    } else if let Some(id) = to {
        log.rollback_to(&*conn, &id)?
    } else {
        log.rollback(&*conn, steps.unwrap_or(1))?
    };

    if reverted.is_empty() {
        println!("Nothing to revert");
    } else {
        print_ids("Reverted", &reverted);
        println!("{} deltas reverted", reverted.len());
    }

    Ok(())
}

pub fn run_migrate_status(data_dir: String, json: bool) -> anyhow::Result<()> {
    let (config, store) = init_store(&data_dir)?;
    let log = catalog::evolution_log()?;

    let status = {
        let conn = store.connection();
        log.status(&*conn)?
    };

    if json {
        let output = StatusOutput {
            environment: config.environment.to_string(),
            up_to_date: status.is_up_to_date(),
            status,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Environment: {}", config.environment);
    println!();
    for applied in &status.applied {
        println!("  [x] {}  ({})", applied.id, applied.applied_at.to_rfc3339());
    }
    for pending in &status.pending {
        println!("  [ ] {pending}");
    }
    for orphan in &status.orphaned {
        println!("  [?] {orphan}  (not in this build)");
    }
    println!();
    println!(
        "{} applied, {} pending",
        status.applied.len(),
        status.pending.len()
    );

    Ok(())
}
