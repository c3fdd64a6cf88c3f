use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A join table recording a many-to-many relationship between two parents.
///
/// Rows carry their own surrogate `id` plus one foreign key per parent. The
/// storage enforces at most one row per `(left, right)` pair.
pub trait Association: Sized {
    const TABLE: &'static str;
    const LEFT_COLUMN: &'static str;
    const RIGHT_COLUMN: &'static str;

    fn from_parts(id: i64, left: i64, right: i64) -> Self;

    fn columns() -> [&'static str; 3] {
        ["id", Self::LEFT_COLUMN, Self::RIGHT_COLUMN]
    }
}

/// Role X has permission Y.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: i64,
    #[serde(alias = "roleId")]
    pub role_id: i64,
    #[serde(alias = "permissionId")]
    pub permission_id: i64,
}

impl Association for RolePermission {
    const TABLE: &'static str = "role_permissions";
    const LEFT_COLUMN: &'static str = "role_id";
    const RIGHT_COLUMN: &'static str = "permission_id";

    fn from_parts(id: i64, role_id: i64, permission_id: i64) -> Self {
        Self {
            id,
            role_id,
            permission_id,
        }
    }
}

/// User X holds role Y.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: i64,
    #[serde(alias = "userId")]
    pub user_id: i64,
    #[serde(alias = "roleId")]
    pub role_id: i64,
}

impl Association for UserRole {
    const TABLE: &'static str = "user_roles";
    const LEFT_COLUMN: &'static str = "user_id";
    const RIGHT_COLUMN: &'static str = "role_id";

    fn from_parts(id: i64, user_id: i64, role_id: i64) -> Self {
        Self {
            id,
            user_id,
            role_id,
        }
    }
}

/// One ledger entry: a delta that has been applied to this database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDelta {
    pub id: String,
    pub token: String,
    pub applied_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_association_columns() {
        assert_eq!(RolePermission::columns(), ["id", "role_id", "permission_id"]);
        assert_eq!(UserRole::columns(), ["id", "user_id", "role_id"]);
    }

    #[test]
    fn test_serializes_exactly_three_snake_case_fields() {
        let row = RolePermission::from_parts(1, 2, 3);
        let value = serde_json::to_value(&row).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["role_id"], 2);
        assert_eq!(obj["permission_id"], 3);

        let row = UserRole::from_parts(4, 5, 6);
        let value = serde_json::to_value(&row).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["id", "role_id", "user_id"]);
    }

    #[test]
    fn test_accepts_camel_case_input() {
        let row: UserRole = serde_json::from_str(r#"{"id":1,"userId":7,"roleId":9}"#).unwrap();
        assert_eq!(row, UserRole::from_parts(1, 7, 9));
    }
}
