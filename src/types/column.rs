use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Portable column types a delta can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Bounded string, `VARCHAR(n)`.
    String(u32),
    Text,
    Decimal { precision: u8, scale: u8 },
    Boolean,
    Integer,
    /// Time of day without a date.
    Time,
    Json,
    /// Bounded string restricted to a fixed set of values.
    Enum {
        length: u32,
        values: &'static [&'static str],
    },
}

impl ColumnType {
    /// Symbolic name of the type, independent of the SQL dialect.
    pub fn symbol(&self) -> &'static str {
        match self {
            ColumnType::String(_) => "STRING",
            ColumnType::Text => "TEXT",
            ColumnType::Decimal { .. } => "DECIMAL",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "INTEGER",
            ColumnType::Time => "TIME",
            ColumnType::Json => "JSON",
            ColumnType::Enum { .. } => "ENUM",
        }
    }

    /// Declared SQL type as it appears in the table definition.
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::String(len) | ColumnType::Enum { length: len, .. } => {
                format!("VARCHAR({len})")
            }
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Json => "JSON".to_string(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_type())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl DefaultValue {
    /// SQL literal for the `DEFAULT` clause. Booleans are stored as 0/1.
    pub fn sql_literal(&self) -> String {
        match self {
            DefaultValue::Null => "NULL".to_string(),
            DefaultValue::Bool(true) => "1".to_string(),
            DefaultValue::Bool(false) => "0".to_string(),
            DefaultValue::Integer(n) => n.to_string(),
            DefaultValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

/// Everything a delta declares about one added column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    /// Column this one is positioned after. It must already exist.
    pub after: Option<&'static str>,
    /// Descriptive only, never affects the schema.
    pub comment: Option<&'static str>,
}

impl ColumnSpec {
    pub fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: true,
            default: None,
            after: None,
            comment: None,
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn after(mut self, column: &'static str) -> Self {
        self.after = Some(column);
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: &'static str) -> Self {
        self.comment = Some(comment);
        self
    }

    /// Column definition fragment for `ALTER TABLE ... ADD COLUMN`.
    pub fn definition(&self) -> String {
        let name = quote_ident(self.name);
        let mut sql = format!("{name} {}", self.column_type.sql_type());
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.sql_literal());
        }
        if let ColumnType::Enum { values, .. } = self.column_type {
            let allowed = values
                .iter()
                .map(|v| DefaultValue::Text((*v).to_string()).sql_literal())
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" CHECK ({name} IN ({allowed}))"));
        }
        sql
    }
}

/// Structural description of one existing column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub primary_key: bool,
}

/// Ordered column list of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableShape {
    /// Looks a column up the way SQLite resolves names: ASCII case-insensitively.
    pub fn get(&self, column: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(column))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn by_name(&self) -> BTreeMap<&str, &ColumnDescriptor> {
        self.columns.iter().map(|c| (c.name.as_str(), c)).collect()
    }
}

/// Quotes an identifier for SQLite, preserving case.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
