//! Reversible schema deltas and the log that sequences them.

pub mod catalog;
mod id;
mod log;

pub use id::DeltaId;
pub use log::{EvolutionLog, MigrationStatus};

use tracing::{debug, warn};

use crate::error::Result;
use crate::schema::SchemaEditor;
use crate::types::ColumnSpec;

/// One forward/backward schema change.
///
/// `revert` must be the exact structural inverse of `apply`.
pub trait Delta: Send + Sync {
    fn id(&self) -> &DeltaId;
    fn apply(&self, schema: &dyn SchemaEditor) -> Result<()>;
    fn revert(&self, schema: &dyn SchemaEditor) -> Result<()>;

    /// Short human-readable summary for status output.
    fn describe(&self) -> String {
        self.id().slug().to_string()
    }
}

/// Whether `AddColumns::apply` probes the table before adding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceGuard {
    /// Add unconditionally; a present column is a `DuplicateColumn` error.
    None,
    /// Skip columns that already exist.
    SkipIfPresent,
}

/// Adds one or more columns to a single table.
///
/// Each column is its own committed step: a failure part way through leaves
/// the earlier columns in place.
#[derive(Debug, Clone)]
pub struct AddColumns {
    id: DeltaId,
    table: &'static str,
    columns: Vec<ColumnSpec>,
    guard: ExistenceGuard,
}

impl AddColumns {
    pub fn new(id: &str, table: &'static str) -> Result<Self> {
        Ok(Self {
            id: DeltaId::parse(id)?,
            table,
            columns: Vec::new(),
            guard: ExistenceGuard::None,
        })
    }

    #[must_use]
    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn guard(mut self, guard: ExistenceGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }
}

impl Delta for AddColumns {
    fn id(&self) -> &DeltaId {
        &self.id
    }

    fn apply(&self, schema: &dyn SchemaEditor) -> Result<()> {
        for column in &self.columns {
            if self.guard == ExistenceGuard::SkipIfPresent
                && schema.describe_table(self.table)?.contains(column.name)
            {
                warn!(
                    delta = %self.id,
                    table = self.table,
                    column = column.name,
                    "column already present, skipping"
                );
                continue;
            }
            schema.add_column(self.table, column)?;
        }
        Ok(())
    }

    fn revert(&self, schema: &dyn SchemaEditor) -> Result<()> {
        for column in self.columns.iter().rev() {
            debug!(delta = %self.id, table = self.table, column = column.name, "reverting column");
            schema.remove_column(self.table, column.name)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let names: Vec<_> = self.columns.iter().map(|c| c.name).collect();
        format!("{}: add {}", self.table, names.join(", "))
    }
}
