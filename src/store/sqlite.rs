use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};

use super::AssociationStore;
use super::schema::BASE_SCHEMA;
use crate::error::{Error, Result};
use crate::schema::DeltaLedger;
use crate::types::{Association, RolePermission, UserRole};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::configure(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    ///
    /// Holding the guard is the exclusive lock over the schema: a migration
    /// run keeps it for its whole duration.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn insert_pair<A: Association>(conn: &Connection, left: i64, right: i64) -> Result<A> {
    let sql = format!(
        "INSERT INTO {} ({}, {}) VALUES (?1, ?2)",
        A::TABLE,
        A::LEFT_COLUMN,
        A::RIGHT_COLUMN
    );

    match conn.execute(&sql, params![left, right]) {
        Ok(_) => Ok(A::from_parts(conn.last_insert_rowid(), left, right)),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Err(Error::AlreadyExists)
        }
        Err(e) => Err(Error::from(e)),
    }
}

fn delete_pair<A: Association>(conn: &Connection, left: i64, right: i64) -> Result<bool> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
        A::TABLE,
        A::LEFT_COLUMN,
        A::RIGHT_COLUMN
    );
    let rows = conn.execute(&sql, params![left, right])?;
    Ok(rows > 0)
}

fn list_by<A: Association>(conn: &Connection, column: &str, value: i64) -> Result<Vec<A>> {
    let sql = format!(
        "SELECT id, {}, {} FROM {} WHERE {column} = ?1 ORDER BY id",
        A::LEFT_COLUMN,
        A::RIGHT_COLUMN,
        A::TABLE
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt.query_map(params![value], |row| {
        Ok(A::from_parts(row.get(0)?, row.get(1)?, row.get(2)?))
    })?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

impl AssociationStore for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(BASE_SCHEMA)?;
        conn.ensure_ledger()?;
        Ok(())
    }

    fn add_role_permission(&self, role_id: i64, permission_id: i64) -> Result<RolePermission> {
        insert_pair(&self.conn(), role_id, permission_id)
    }

    fn remove_role_permission(&self, role_id: i64, permission_id: i64) -> Result<bool> {
        delete_pair::<RolePermission>(&self.conn(), role_id, permission_id)
    }

    fn list_role_permissions(&self, role_id: i64) -> Result<Vec<RolePermission>> {
        list_by(&self.conn(), RolePermission::LEFT_COLUMN, role_id)
    }

    fn list_permission_roles(&self, permission_id: i64) -> Result<Vec<RolePermission>> {
        list_by(&self.conn(), RolePermission::RIGHT_COLUMN, permission_id)
    }

    fn add_user_role(&self, user_id: i64, role_id: i64) -> Result<UserRole> {
        insert_pair(&self.conn(), user_id, role_id)
    }

    fn remove_user_role(&self, user_id: i64, role_id: i64) -> Result<bool> {
        delete_pair::<UserRole>(&self.conn(), user_id, role_id)
    }

    fn list_user_roles(&self, user_id: i64) -> Result<Vec<UserRole>> {
        list_by(&self.conn(), UserRole::LEFT_COLUMN, user_id)
    }

    fn list_role_users(&self, role_id: i64) -> Result<Vec<UserRole>> {
        list_by(&self.conn(), UserRole::RIGHT_COLUMN, role_id)
    }
}
