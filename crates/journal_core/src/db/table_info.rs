//! Live table definitions read from SQLite.
//!
//! # Responsibility
//! - Describe a table as a set of columns with affinity, nullability and
//!   primary-key position.
//! - Read that description from `PRAGMA table_info` for comparison against
//!   the expected definition.
//!
//! # Invariants
//! - Columns are compared by name; declared types are reduced to SQLite
//!   type affinity before comparison, so `INT` and `INTEGER` are equal.

use rusqlite::Connection;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// One column as seen by schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Type affinity: `INTEGER`, `TEXT`, `BLOB`, `REAL` or `NUMERIC`.
    pub affinity: &'static str,
    pub not_null: bool,
    /// 1-based position inside the primary key, `0` when not part of it.
    pub primary_key_position: u32,
}

impl ColumnInfo {
    pub fn new(
        name: impl Into<String>,
        declared_type: &str,
        not_null: bool,
        primary_key_position: u32,
    ) -> Self {
        Self {
            name: name.into(),
            affinity: type_affinity(declared_type),
            not_null,
            primary_key_position,
        }
    }
}

impl Display for ColumnInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Column{{name='{}', type='{}', notNull={}, primaryKeyPosition={}}}",
            self.name, self.affinity, self.not_null, self.primary_key_position
        )
    }
}

/// Table definition keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: BTreeMap<String, ColumnInfo>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, columns: impl IntoIterator<Item = ColumnInfo>) -> Self {
        Self {
            name: name.into(),
            columns: columns
                .into_iter()
                .map(|column| (column.name.clone(), column))
                .collect(),
        }
    }

    /// Reads the live definition of `table`.
    ///
    /// A missing table yields a `TableInfo` with no columns rather than an
    /// error, so callers can report it as a mismatch.
    pub fn read(conn: &Connection, table: &str) -> rusqlite::Result<Self> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info(`{table}`);"))?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            let declared_type: String = row.get("type")?;
            let not_null: i64 = row.get("notnull")?;
            let pk: i64 = row.get("pk")?;
            columns.push(ColumnInfo::new(
                name,
                declared_type.as_str(),
                not_null != 0,
                u32::try_from(pk).unwrap_or(0),
            ));
        }
        Ok(Self::new(table, columns))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Display for TableInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TableInfo{{name='{}', columns={{", self.name)?;
        for column in self.columns.values() {
            writeln!(f, "    {column},")?;
        }
        write!(f, "}}}}")
    }
}

/// Reduces a declared column type to its SQLite affinity.
///
/// Follows the rules of section 3.1 of the SQLite datatype documentation.
pub fn type_affinity(declared_type: &str) -> &'static str {
    let upper = declared_type.to_ascii_uppercase();
    if upper.contains("INT") {
        "INTEGER"
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        "TEXT"
    } else if upper.is_empty() || upper.contains("BLOB") {
        "BLOB"
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        "REAL"
    } else {
        "NUMERIC"
    }
}
