use std::collections::HashSet;

use serde::Serialize;
use tracing::{error, info, warn};

use super::{Delta, DeltaId};
use crate::error::{Direction, Error, Result};
use crate::schema::{DeltaLedger, SchemaEditor};
use crate::types::AppliedDelta;

/// Ordered collection of every delta for a deployment.
///
/// Deltas are applied in ascending identifier order and reverted in
/// descending order. Which deltas are applied is read from the ledger, never
/// inferred from table shape. The first failing delta stops the run.
pub struct EvolutionLog {
    deltas: Vec<Box<dyn Delta>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub applied: Vec<AppliedDelta>,
    pub pending: Vec<String>,
    /// Ledger entries with no matching delta in this log.
    pub orphaned: Vec<String>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn needs_migration(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl EvolutionLog {
    pub fn new(mut deltas: Vec<Box<dyn Delta>>) -> Result<Self> {
        deltas.sort_by(|a, b| a.id().cmp(b.id()));

        if let Some(pair) = deltas.windows(2).find(|pair| pair[0].id() == pair[1].id()) {
            return Err(Error::DuplicateDeltaId(pair[1].id().to_string()));
        }

        Ok(Self { deltas })
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Deltas in apply order.
    pub fn deltas(&self) -> impl DoubleEndedIterator<Item = &dyn Delta> {
        self.deltas.iter().map(|d| d.as_ref())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Delta> {
        let id = DeltaId::parse(id).ok()?;
        self.deltas().find(|d| *d.id() == id)
    }

    fn resolve(&self, id: &str) -> Result<&DeltaId> {
        let parsed = DeltaId::parse(id)?;
        self.deltas()
            .map(|d| d.id())
            .find(|known| **known == parsed)
            .ok_or_else(|| Error::UnknownDelta(id.to_string()))
    }

    /// Applies every pending delta. Returns the identifiers applied.
    pub fn migrate<T: SchemaEditor + DeltaLedger>(&self, target: &T) -> Result<Vec<DeltaId>> {
        self.apply_through(target, None)
    }

    /// Applies pending deltas up to and including `id`.
    pub fn migrate_to<T: SchemaEditor + DeltaLedger>(
        &self,
        target: &T,
        id: &str,
    ) -> Result<Vec<DeltaId>> {
        let last = self.resolve(id)?.clone();
        self.apply_through(target, Some(&last))
    }

    fn apply_through<T: SchemaEditor + DeltaLedger>(
        &self,
        target: &T,
        last: Option<&DeltaId>,
    ) -> Result<Vec<DeltaId>> {
        target.ensure_ledger()?;
        let applied: HashSet<String> = target
            .applied_deltas()?
            .into_iter()
            .map(|a| a.id)
            .collect();

        let mut done = Vec::new();
        for delta in self.deltas() {
            if last.is_some_and(|last| delta.id() > last) {
                break;
            }
            if applied.contains(delta.id().as_str()) {
                continue;
            }
            apply_one(target, delta)?;
            done.push(delta.id().clone());
        }

        if done.is_empty() {
            info!("Schema is up to date");
        } else {
            info!("Applied {} deltas", done.len());
        }
        Ok(done)
    }

    /// Reverts the last `steps` applied deltas, newest first.
    pub fn rollback<T: SchemaEditor + DeltaLedger>(
        &self,
        target: &T,
        steps: usize,
    ) -> Result<Vec<DeltaId>> {
        target.ensure_ledger()?;
        let applied = newest_first(target.applied_deltas()?);
        let entries: Vec<_> = applied.iter().take(steps).collect();
        self.revert_entries(target, &entries)
    }

    /// Reverts every applied delta ordered after `id`. `id` itself stays applied.
    pub fn rollback_to<T: SchemaEditor + DeltaLedger>(
        &self,
        target: &T,
        id: &str,
    ) -> Result<Vec<DeltaId>> {
        let keep = self.resolve(id)?.clone();
        target.ensure_ledger()?;
        let applied = newest_first(target.applied_deltas()?);
        let entries: Vec<_> = applied
            .iter()
            .take_while(|entry| match DeltaId::parse(&entry.id) {
                Ok(entry_id) => entry_id > keep,
                Err(_) => entry.token.as_str() > keep.token(),
            })
            .collect();
        self.revert_entries(target, &entries)
    }

    pub fn rollback_all<T: SchemaEditor + DeltaLedger>(&self, target: &T) -> Result<Vec<DeltaId>> {
        self.rollback(target, usize::MAX)
    }

    fn revert_entries<T: SchemaEditor + DeltaLedger>(
        &self,
        target: &T,
        entries: &[&AppliedDelta],
    ) -> Result<Vec<DeltaId>> {
        let mut done = Vec::new();
        for entry in entries {
            let delta = self
                .deltas()
                .find(|d| d.id().as_str() == entry.id)
                .ok_or_else(|| Error::UnknownDelta(entry.id.clone()))?;
            revert_one(target, delta)?;
            done.push(delta.id().clone());
        }

        info!("Reverted {} deltas", done.len());
        Ok(done)
    }

    /// Read-only: a database without a ledger reports every delta as pending.
    pub fn status<T: DeltaLedger>(&self, target: &T) -> Result<MigrationStatus> {
        let applied = if target.has_ledger()? {
            target.applied_deltas()?
        } else {
            Vec::new()
        };
        let applied_ids: HashSet<&str> = applied.iter().map(|a| a.id.as_str()).collect();

        let pending = self
            .deltas()
            .filter(|d| !applied_ids.contains(d.id().as_str()))
            .map(|d| d.id().to_string())
            .collect();

        let orphaned: Vec<String> = applied
            .iter()
            .filter(|a| !self.deltas().any(|d| d.id().as_str() == a.id))
            .map(|a| a.id.clone())
            .collect();
        for id in &orphaned {
            warn!(delta = %id, "Ledger entry has no matching delta");
        }

        Ok(MigrationStatus {
            applied,
            pending,
            orphaned,
        })
    }
}

fn apply_one<T: SchemaEditor + DeltaLedger>(target: &T, delta: &dyn Delta) -> Result<()> {
    let id = delta.id();
    info!(delta = %id, "Applying {}", delta.describe());

    delta.apply(target).map_err(|e| {
        error!(delta = %id, "Delta failed: {}", e);
        Error::DeltaFailed {
            id: id.to_string(),
            direction: Direction::Apply,
            source: Box::new(e),
        }
    })?;

    target.record_applied(id.as_str(), id.token()).map_err(|e| {
        error!(delta = %id, "Recording delta failed: {}", e);
        Error::DeltaFailed {
            id: id.to_string(),
            direction: Direction::Apply,
            source: Box::new(e),
        }
    })
}

/// Sorts ledger entries into reverse log order. The ledger stores the token,
/// which ties for mixed-granularity ids, so entries are re-parsed to compare
/// slugs too. Unparseable entries fall back to their stored token.
fn newest_first(mut applied: Vec<AppliedDelta>) -> Vec<AppliedDelta> {
    applied.sort_by_cached_key(|entry| match DeltaId::parse(&entry.id) {
        Ok(id) => (id.token().to_string(), id.slug().to_string()),
        Err(_) => (entry.token.clone(), entry.id.clone()),
    });
    applied.reverse();
    applied
}

fn revert_one<T: SchemaEditor + DeltaLedger>(target: &T, delta: &dyn Delta) -> Result<()> {
    let id = delta.id();
    info!(delta = %id, "Reverting {}", delta.describe());

    delta.revert(target).map_err(|e| {
        error!(delta = %id, "Delta revert failed: {}", e);
        Error::DeltaFailed {
            id: id.to_string(),
            direction: Direction::Revert,
            source: Box::new(e),
        }
    })?;

    target.record_reverted(id.as_str())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;
    use crate::delta::AddColumns;
    use crate::types::{ColumnSpec, ColumnType, TableShape};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE staff (id INTEGER PRIMARY KEY);
             CREATE TABLE clients (id INTEGER PRIMARY KEY);",
        )
        .unwrap();
        conn
    }

    fn add(id: &str, table: &'static str, column: &'static str) -> Box<dyn Delta> {
        Box::new(
            AddColumns::new(id, table)
                .unwrap()
                .column(ColumnSpec::new(column, ColumnType::Text)),
        )
    }

    fn log() -> EvolutionLog {
        EvolutionLog::new(vec![
            add("20250301120000-add-c", "staff", "c"),
            add("20250101-add-a", "staff", "a"),
            add("20250201093000-add-b", "clients", "b"),
        ])
        .unwrap()
    }

    fn ids(ids: &[DeltaId]) -> Vec<&str> {
        ids.iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn test_new_sorts_by_identifier() {
        let log = log();
        let order: Vec<_> = log.deltas().map(|d| d.id().to_string()).collect();
        assert_eq!(
            order,
            [
                "20250101-add-a",
                "20250201093000-add-b",
                "20250301120000-add-c"
            ]
        );
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = EvolutionLog::new(vec![
            add("20250101-add-a", "staff", "a"),
            add("2025-01-01-add-a", "staff", "a2"),
        ]);
        assert!(matches!(result, Err(Error::DuplicateDeltaId(_))));
    }

    #[test]
    fn test_migrate_applies_pending_once() {
        let conn = conn();
        let log = log();

        let applied = log.migrate(&conn).unwrap();
        assert_eq!(applied.len(), 3);
        assert!(log.migrate(&conn).unwrap().is_empty());

        let staff = conn.describe_table("staff").unwrap();
        assert_eq!(staff.column_names(), ["id", "a", "c"]);
        assert!(log.status(&conn).unwrap().is_up_to_date());
    }

    #[test]
    fn test_migrate_to_stops_at_target() {
        let conn = conn();
        let log = log();

        let applied = log.migrate_to(&conn, "20250201093000-add-b").unwrap();
        assert_eq!(ids(&applied), ["20250101-add-a", "20250201093000-add-b"]);

        let status = log.status(&conn).unwrap();
        assert_eq!(status.pending, ["20250301120000-add-c"]);
        assert!(status.needs_migration());
    }

    #[test]
    fn test_migrate_to_unknown() {
        let conn = conn();
        let result = log().migrate_to(&conn, "20990101-add-z");
        assert!(matches!(result, Err(Error::UnknownDelta(_))));
    }

    #[test]
    fn test_failure_stops_run_and_names_delta() {
        let conn = conn();
        conn.execute_batch("ALTER TABLE clients ADD COLUMN b TEXT;")
            .unwrap();
        let log = log();

        let err = log.migrate(&conn).unwrap_err();
        assert_eq!(err.failed_delta(), Some("20250201093000-add-b"));
        assert!(matches!(
            err,
            Error::DeltaFailed {
                direction: Direction::Apply,
                ..
            }
        ));

        let status = log.status(&conn).unwrap();
        let applied: Vec<_> = status.applied.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(applied, ["20250101-add-a"]);
        assert!(!conn.describe_table("staff").unwrap().contains("c"));
    }

    #[test]
    fn test_rollback_reverts_newest_first() {
        let conn = conn();
        let log = log();
        log.migrate(&conn).unwrap();

        let reverted = log.rollback(&conn, 2).unwrap();
        assert_eq!(
            ids(&reverted),
            ["20250301120000-add-c", "20250201093000-add-b"]
        );
        assert_eq!(conn.describe_table("staff").unwrap().column_names(), ["id", "a"]);
        assert_eq!(conn.describe_table("clients").unwrap().column_names(), ["id"]);
    }

    #[test]
    fn test_rollback_to_keeps_target() {
        let conn = conn();
        let log = log();
        log.migrate(&conn).unwrap();

        let reverted = log.rollback_to(&conn, "20250101-add-a").unwrap();
        assert_eq!(reverted.len(), 2);

        let status = log.status(&conn).unwrap();
        assert_eq!(status.applied.len(), 1);
        assert_eq!(status.applied[0].id, "20250101-add-a");
    }

    #[test]
    fn test_rollback_all_restores_original_schema() {
        let conn = conn();
        let before_staff = conn.describe_table("staff").unwrap();
        let before_clients = conn.describe_table("clients").unwrap();
        let log = log();

        log.migrate(&conn).unwrap();
        log.rollback_all(&conn).unwrap();

        assert_eq!(conn.describe_table("staff").unwrap(), before_staff);
        assert_eq!(conn.describe_table("clients").unwrap(), before_clients);
        assert!(log.status(&conn).unwrap().applied.is_empty());
        assert!(log.rollback_all(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_rollback_failure_keeps_ledger_entry() {
        let conn = conn();
        let log = log();
        log.migrate(&conn).unwrap();
        conn.execute_batch("ALTER TABLE staff DROP COLUMN c;").unwrap();

        let err = log.rollback(&conn, 1).unwrap_err();
        assert_eq!(err.failed_delta(), Some("20250301120000-add-c"));
        assert_eq!(log.status(&conn).unwrap().applied.len(), 3);
    }

    #[test]
    fn test_orphaned_ledger_entries() {
        let conn = conn();
        let log = log();
        log.migrate(&conn).unwrap();
        conn.record_applied("20250401000000-removed-delta", "20250401000000")
            .unwrap();

        let status = log.status(&conn).unwrap();
        assert_eq!(status.orphaned, ["20250401000000-removed-delta"]);

        let result = log.rollback(&conn, 1);
        assert!(matches!(result, Err(Error::UnknownDelta(_))));
    }

    #[test]
    fn test_get_by_identifier() {
        let log = log();
        assert!(log.get("20250101-add-a").is_some());
        assert!(log.get("20250101000000-add-a").is_some());
        assert!(log.get("20250101-add-z").is_none());
        assert!(log.get("garbage").is_none());
    }

    #[test]
    fn test_rollback_follows_log_order_for_shared_token() {
        let conn = conn();
        let log = EvolutionLog::new(vec![
            add("20250420-zzz", "staff", "z"),
            add("20250420000000-aaa", "staff", "a"),
        ])
        .unwrap();

        let applied = log.migrate(&conn).unwrap();
        assert_eq!(ids(&applied), ["20250420000000-aaa", "20250420-zzz"]);

        let reverted = log.rollback(&conn, 1).unwrap();
        assert_eq!(ids(&reverted), ["20250420-zzz"]);

        log.migrate(&conn).unwrap();
        let reverted = log.rollback_all(&conn).unwrap();
        assert_eq!(ids(&reverted), ["20250420-zzz", "20250420000000-aaa"]);
        assert_eq!(conn.describe_table("staff").unwrap().column_names(), ["id"]);
    }

    #[test]
    fn test_rollback_to_follows_log_order_for_shared_token() {
        let conn = conn();
        let log = EvolutionLog::new(vec![
            add("20250420-zzz", "staff", "z"),
            add("20250420000000-aaa", "staff", "a"),
        ])
        .unwrap();
        log.migrate(&conn).unwrap();

        let reverted = log.rollback_to(&conn, "20250420000000-aaa").unwrap();
        assert_eq!(ids(&reverted), ["20250420-zzz"]);
        assert_eq!(
            conn.describe_table("staff").unwrap().column_names(),
            ["id", "a"]
        );
    }

    #[test]
    fn test_status_does_not_create_ledger() {
        let conn = conn();
        let status = log().status(&conn).unwrap();

        assert!(status.applied.is_empty());
        assert_eq!(status.pending.len(), 3);
        assert!(!conn.has_ledger().unwrap());
    }

    /// Delegates to a connection but refuses to record applied deltas.
    struct ReadOnlyLedger(Connection);

    impl SchemaEditor for ReadOnlyLedger {
        fn add_column(&self, table: &str, column: &ColumnSpec) -> Result<()> {
            self.0.add_column(table, column)
        }

        fn remove_column(&self, table: &str, column: &str) -> Result<()> {
            self.0.remove_column(table, column)
        }

        fn describe_table(&self, table: &str) -> Result<TableShape> {
            self.0.describe_table(table)
        }
    }

    impl DeltaLedger for ReadOnlyLedger {
        fn ensure_ledger(&self) -> Result<()> {
            self.0.ensure_ledger()
        }

        fn has_ledger(&self) -> Result<bool> {
            self.0.has_ledger()
        }

        fn applied_deltas(&self) -> Result<Vec<AppliedDelta>> {
            self.0.applied_deltas()
        }

        fn record_applied(&self, _id: &str, _token: &str) -> Result<()> {
            Err(Error::Forbidden("ledger is read-only".to_string()))
        }

        fn record_reverted(&self, id: &str) -> Result<bool> {
            self.0.record_reverted(id)
        }
    }

    #[test]
    fn test_ledger_write_failure_names_delta() {
        let target = ReadOnlyLedger(conn());
        let err = log().migrate(&target).unwrap_err();

        assert_eq!(err.failed_delta(), Some("20250101-add-a"));
        match err {
            Error::DeltaFailed {
                direction, source, ..
            } => {
                assert_eq!(direction, Direction::Apply);
                assert!(matches!(*source, Error::Forbidden(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(target.0.describe_table("staff").unwrap().contains("a"));
    }
}
