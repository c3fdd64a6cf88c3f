use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::debug;

use super::{DeltaLedger, SchemaEditor};
use crate::error::{Error, Result};
use crate::types::{
    AppliedDelta, ColumnDescriptor, ColumnSpec, DefaultValue, TableShape, quote_ident,
};

pub const LEDGER_TABLE: &str = "schema_deltas";

const LEDGER_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_deltas (
    id TEXT PRIMARY KEY,
    token TEXT NOT NULL,       -- normalized YYYYMMDDHHMMSS
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl SchemaEditor for Connection {
    fn add_column(&self, table: &str, column: &ColumnSpec) -> Result<()> {
        let shape = self.describe_table(table)?;

        if shape.contains(column.name) {
            return Err(Error::DuplicateColumn {
                table: table.to_string(),
                column: column.name.to_string(),
            });
        }

        if let Some(after) = column.after {
            if !shape.contains(after) {
                return Err(Error::DependencyOrder {
                    table: table.to_string(),
                    column: column.name.to_string(),
                    after: after.to_string(),
                });
            }
        }

        if !column.nullable && matches!(column.default, None | Some(DefaultValue::Null)) {
            return Err(Error::InvalidColumn(format!(
                "{table}.{} is NOT NULL but has no non-null default",
                column.name
            )));
        }

        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(table),
            column.definition()
        );
        debug!(
            table,
            column = column.name,
            kind = column.column_type.symbol(),
            comment = column.comment.unwrap_or_default(),
            "adding column"
        );
        self.execute_batch(&sql)?;
        Ok(())
    }

    fn remove_column(&self, table: &str, column: &str) -> Result<()> {
        let shape = self.describe_table(table)?;
        let Some(existing) = shape.get(column) else {
            return Err(Error::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        };

        let sql = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_ident(table),
            quote_ident(&existing.name)
        );
        debug!(table, column, "removing column");
        self.execute_batch(&sql)?;
        Ok(())
    }

    fn describe_table(&self, table: &str) -> Result<TableShape> {
        let mut stmt = self.prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk
             FROM pragma_table_info(?1) ORDER BY cid",
        )?;

        let rows = stmt.query_map(params![table], |row| {
            Ok(ColumnDescriptor {
                name: row.get(0)?,
                declared_type: row.get(1)?,
                not_null: row.get(2)?,
                default: row.get(3)?,
                primary_key: row.get::<_, i64>(4)? > 0,
            })
        })?;

        let columns = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Err(Error::MissingTable(table.to_string()));
        }

        Ok(TableShape {
            table: table.to_string(),
            columns,
        })
    }
}

impl DeltaLedger for Connection {
    fn ensure_ledger(&self) -> Result<()> {
        self.execute_batch(LEDGER_SCHEMA)?;
        Ok(())
    }

    fn has_ledger(&self) -> Result<bool> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![LEDGER_TABLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn applied_deltas(&self) -> Result<Vec<AppliedDelta>> {
        let mut stmt = self.prepare(
            "SELECT id, token, applied_at FROM schema_deltas ORDER BY token, id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(AppliedDelta {
                id: row.get(0)?,
                token: row.get(1)?,
                applied_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn record_applied(&self, id: &str, token: &str) -> Result<()> {
        let result = self.execute(
            "INSERT INTO schema_deltas (id, token, applied_at) VALUES (?1, ?2, ?3)",
            params![id, token, format_datetime(&Utc::now())],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn record_reverted(&self, id: &str) -> Result<bool> {
        let rows = self.execute("DELETE FROM schema_deltas WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
