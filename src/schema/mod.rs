mod sqlite;

use crate::error::Result;
use crate::types::{AppliedDelta, ColumnSpec, TableShape};

pub use sqlite::LEDGER_TABLE;

/// Structural operations a delta may perform on the database catalog.
///
/// Every call is one committed step. Implementations report conflicts with the
/// catalog as typed errors rather than letting the engine's message through:
/// `DuplicateColumn`, `MissingColumn`, `MissingTable` and `DependencyOrder`.
pub trait SchemaEditor {
    fn add_column(&self, table: &str, column: &ColumnSpec) -> Result<()>;
    fn remove_column(&self, table: &str, column: &str) -> Result<()>;
    fn describe_table(&self, table: &str) -> Result<TableShape>;
}

/// Persistent record of which deltas have been applied.
pub trait DeltaLedger {
    fn ensure_ledger(&self) -> Result<()>;
    fn has_ledger(&self) -> Result<bool>;
    /// Applied deltas, ordered by token then identifier.
    fn applied_deltas(&self) -> Result<Vec<AppliedDelta>>;
    fn record_applied(&self, id: &str, token: &str) -> Result<()>;
    /// Returns false if the ledger had no entry for `id`.
    fn record_reverted(&self, id: &str) -> Result<bool>;
}
