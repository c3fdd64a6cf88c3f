use serde::Serialize;

use super::init_store;
use crate::delta::catalog;
use crate::schema::SchemaEditor;

#[derive(Serialize)]
struct DeltaOutput {
    id: String,
    token: String,
    summary: String,
}

pub fn run_describe(data_dir: String, table: String, json: bool) -> anyhow::Result<()> {
    let (_config, store) = init_store(&data_dir)?;
    let shape = store.connection().describe_table(&table)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&shape)?);
        return Ok(());
    }

    println!("{}", shape.table);
    for column in &shape.columns {
        let mut line = format!("  {} {}", column.name, column.declared_type);
        if column.primary_key {
            line.push_str(" PRIMARY KEY");
        }
        if column.not_null {
            line.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            line.push_str(&format!(" DEFAULT {default}"));
        }
        println!("{line}");
    }

    Ok(())
}

pub fn run_deltas(json: bool) -> anyhow::Result<()> {
    let log = catalog::evolution_log()?;

    let deltas: Vec<DeltaOutput> = log
        .deltas()
        .map(|d| DeltaOutput {
            id: d.id().to_string(),
            token: d.id().token().to_string(),
            summary: d.describe(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&deltas)?);
        return Ok(());
    }

    for delta in &deltas {
        println!("{}  {}", delta.id, delta.summary);
    }

    Ok(())
}
