//! # staffdb
//!
//! Schema evolution log and association tables for an HR and payroll
//! administration database (staff profiles, attendance, shifts, leave,
//! payroll, subscriptions).
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use staffdb::delta::catalog;
//! use staffdb::store::{AssociationStore, SqliteStore};
//!
//! let store = SqliteStore::new("./data/staffdb.db")?;
//! store.initialize()?;
//!
//! let log = catalog::evolution_log()?;
//! let conn = store.connection();
//! let applied = log.migrate(&*conn)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod delta;
pub mod error;
pub mod schema;
pub mod store;
pub mod types;
