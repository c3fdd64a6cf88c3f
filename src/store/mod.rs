mod schema;
mod sqlite;

pub use schema::BASE_SCHEMA;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::{RolePermission, UserRole};

/// Persistence for the association entities.
///
/// Adding a pair that already exists is `Error::AlreadyExists`. Parent rows
/// must exist; the base schema's foreign keys reject dangling ids.
pub trait AssociationStore: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Role-Permission M2M operations
    fn add_role_permission(&self, role_id: i64, permission_id: i64) -> Result<RolePermission>;
    fn remove_role_permission(&self, role_id: i64, permission_id: i64) -> Result<bool>;
    fn list_role_permissions(&self, role_id: i64) -> Result<Vec<RolePermission>>;
    fn list_permission_roles(&self, permission_id: i64) -> Result<Vec<RolePermission>>;

    // User-Role M2M operations
    fn add_user_role(&self, user_id: i64, role_id: i64) -> Result<UserRole>;
    fn remove_user_role(&self, user_id: i64, role_id: i64) -> Result<bool>;
    fn list_user_roles(&self, user_id: i64) -> Result<Vec<UserRole>>;
    fn list_role_users(&self, role_id: i64) -> Result<Vec<UserRole>>;
}
