use anyhow::{bail, Context, Result};
use rusqlite::{params, types::Type, Connection};
use std::path::Path;
use tracing::info;

/// Offset added to schema versions before they are written to `user_version`,
/// so databases not created by this server are rejected.
pub const BASE_DB_VERSION: usize = 99999;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
    Blob,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Blob => "BLOB",
        }
    }

    fn parse(s: &str) -> Option<&'static SqlType> {
        match s {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            "BLOB" => Some(&SqlType::Blob),
            _ => None,
        }
    }
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<S>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    pub indices: &'static [(&'static str, &'static str)],
    pub unique_constraints: &'static [&'static [&'static str]],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut create_sql = format!("CREATE TABLE {} (", self.name);
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                create_sql.push_str(", ");
            }
            create_sql.push_str(&format!("{} {}", column.name, column.sql_type.as_sql()));
            if column.is_primary_key {
                create_sql.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                create_sql.push_str(" NOT NULL");
            }
            if let Some(default_value) = column.default_value {
                create_sql.push_str(&format!(" DEFAULT {}", default_value));
            }
        }
        for unique_constraint in self.unique_constraints {
            create_sql.push_str(&format!(", UNIQUE ({})", unique_constraint.join(", ")));
        }
        create_sql.push_str(");");
        conn.execute(&create_sql, params![])?;

        for (index_name, columns) in self.indices {
            conn.execute(
                &format!("CREATE INDEX {} ON {}({});", index_name, self.name, columns),
                params![],
            )?;
        }
        Ok(())
    }

    fn validate_columns(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns = stmt
            .query_map(params![], |row| {
                let type_name = row.get::<_, String>(2)?;
                let sql_type = SqlType::parse(&type_name).ok_or_else(|| {
                    rusqlite::Error::InvalidColumnType(2, type_name.clone(), Type::Text)
                })?;
                Ok(Column {
                    name: row.get::<_, String>(1)?,
                    sql_type,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get::<_, Option<String>>(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<rusqlite::Result<Vec<Column<'_, String>>>>()
            .with_context(|| format!("Error reading columns of table {}", self.name))?;

        if actual_columns.is_empty() {
            bail!("Table {} does not exist", self.name);
        }
        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}. Found: {}, expected: {}",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                actual_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                self.columns
                    .iter()
                    .map(|c| c.name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for (actual, expected) in actual_columns.iter().zip(self.columns.iter()) {
            if actual.name != expected.name {
                bail!(
                    "Table {} column name mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    actual.name
                );
            }
            if actual.sql_type != expected.sql_type {
                bail!(
                    "Table {} column {} type mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.sql_type,
                    actual.sql_type
                );
            }
            if actual.non_null != expected.non_null {
                bail!(
                    "Table {} column {} non-null mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.non_null,
                    actual.non_null
                );
            }
            // SQLite may report defaults wrapped in parentheses.
            if actual.default_value.as_deref().map(strip_parentheses)
                != expected.default_value.map(strip_parentheses)
            {
                bail!(
                    "Table {} column {} default value mismatch: expected {:?}, got {:?}",
                    self.name,
                    expected.name,
                    expected.default_value,
                    actual.default_value
                );
            }
            if actual.is_primary_key != expected.is_primary_key {
                bail!(
                    "Table {} column {} primary key mismatch: expected {}, got {}",
                    self.name,
                    expected.name,
                    expected.is_primary_key,
                    actual.is_primary_key
                );
            }
        }
        Ok(())
    }

    fn validate_indices(&self, conn: &Connection) -> Result<()> {
        for (index_name, _) in self.indices {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }

        if self.unique_constraints.is_empty() {
            return Ok(());
        }

        let mut stmt = conn.prepare(&format!("PRAGMA index_list({})", self.name))?;
        let unique_indices: Vec<String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i32>(2)?)))?
            .filter_map(|r| r.ok())
            .filter(|(_, unique)| *unique == 1)
            .map(|(name, _)| name)
            .collect();

        let mut unique_column_sets: Vec<Vec<String>> = Vec::new();
        for index_name in &unique_indices {
            let mut stmt = conn.prepare(&format!("PRAGMA index_info({})", index_name))?;
            let mut cols: Vec<String> = stmt
                .query_map([], |row| row.get::<_, String>(2))?
                .filter_map(|r| r.ok())
                .collect();
            cols.sort();
            unique_column_sets.push(cols);
        }

        for expected in self.unique_constraints {
            let mut expected_sorted: Vec<&str> = expected.to_vec();
            expected_sorted.sort();
            let found = unique_column_sets
                .iter()
                .any(|cols| cols.iter().map(String::as_str).eq(expected_sorted.iter().copied()));
            if !found {
                bail!(
                    "Table {} is missing unique constraint on columns ({})",
                    self.name,
                    expected.join(", ")
                );
            }
        }
        Ok(())
    }
}

fn strip_parentheses(s: &str) -> String {
    if s.starts_with('(') && s.ends_with(')') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub migration: Option<fn(&Connection) -> Result<()>>,
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate_columns(conn)?;
            table.validate_indices(conn)?;
        }
        Ok(())
    }
}

/// Bring `conn` to the latest of `schemas`.
///
/// A database without a version is created from scratch; a versioned one is
/// validated against its recorded schema and then migrated forward.
pub fn prepare_schema(conn: &mut Connection, schemas: &[VersionedSchema], label: &str) -> Result<()> {
    let latest = schemas
        .last()
        .with_context(|| format!("No schema versions defined for {} database", label))?;

    let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if raw_version == 0 {
        info!("Creating {} database at schema version {}", label, latest.version);
        let tx = conn.transaction()?;
        latest.create(&tx)?;
        tx.commit()?;
        return Ok(());
    }

    let db_version = raw_version - BASE_DB_VERSION as i64;
    if db_version < 1 {
        bail!(
            "{} database version {} is invalid (expected >= 1)",
            label,
            db_version
        );
    }
    let db_version = db_version as usize;

    let schema = schemas
        .iter()
        .find(|s| s.version == db_version)
        .with_context(|| format!("Unknown {} database version {}", label, db_version))?;
    schema.validate(conn).with_context(|| {
        format!(
            "{} database schema validation failed for version {}",
            label, db_version
        )
    })?;

    if db_version < latest.version {
        info!(
            "Migrating {} database from version {} to {}",
            label, db_version, latest.version
        );
        let tx = conn.transaction()?;
        for schema in schemas.iter().filter(|s| s.version > db_version) {
            if let Some(migration) = schema.migration {
                migration(&tx)
                    .with_context(|| format!("Failed to run migration to version {}", schema.version))?;
            }
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest.version),
            [],
        )?;
        tx.commit()?;
    }
    Ok(())
}

/// Open (or create) a database file and bring it to the latest schema.
pub fn open_versioned<P: AsRef<Path>>(
    path: P,
    schemas: &[VersionedSchema],
    label: &str,
) -> Result<Connection> {
    let path = path.as_ref();
    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open {} database at {:?}", label, path))?;
    prepare_schema(&mut conn, schemas, label)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ITEMS_V1: Table = Table {
        name: "items",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!("owner", &SqlType::Text, non_null = true),
        ],
        indices: &[("idx_items_owner", "owner")],
        unique_constraints: &[&["name", "owner"]],
    };

    const ITEMS_V2: Table = Table {
        name: "items",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!("owner", &SqlType::Text, non_null = true),
            sqlite_column!(
                "weight",
                &SqlType::Integer,
                non_null = true,
                default_value = Some("0")
            ),
        ],
        indices: &[("idx_items_owner", "owner")],
        unique_constraints: &[&["name", "owner"]],
    };

    fn add_weight(conn: &Connection) -> Result<()> {
        conn.execute(
            "ALTER TABLE items ADD COLUMN weight INTEGER NOT NULL DEFAULT 0",
            [],
        )?;
        Ok(())
    }

    const SCHEMAS_V1: &[VersionedSchema] = &[VersionedSchema {
        version: 1,
        tables: &[ITEMS_V1],
        migration: None,
    }];

    const SCHEMAS_V2: &[VersionedSchema] = &[
        VersionedSchema {
            version: 1,
            tables: &[ITEMS_V1],
            migration: None,
        },
        VersionedSchema {
            version: 2,
            tables: &[ITEMS_V2],
            migration: Some(add_weight),
        },
    ];

    fn user_version(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA user_version;", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_fresh_database_gets_latest_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        prepare_schema(&mut conn, SCHEMAS_V2, "test").unwrap();

        assert_eq!(user_version(&conn), (BASE_DB_VERSION + 2) as i64);
        SCHEMAS_V2[1].validate(&conn).unwrap();
    }

    #[test]
    fn test_reopen_validates_and_migrates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.db");
        {
            let conn = open_versioned(&path, SCHEMAS_V1, "test").unwrap();
            conn.execute("INSERT INTO items (name, owner) VALUES ('a', 'x')", [])
                .unwrap();
        }

        let conn = open_versioned(&path, SCHEMAS_V2, "test").unwrap();
        assert_eq!(user_version(&conn), (BASE_DB_VERSION + 2) as i64);
        let weight: i64 = conn
            .query_row("SELECT weight FROM items WHERE name = 'a'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(weight, 0);
    }

    #[test]
    fn test_foreign_database_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute("PRAGMA user_version = 3", []).unwrap();
        let err = prepare_schema(&mut conn, SCHEMAS_V1, "test").unwrap_err();
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_validate_detects_column_drift() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, owner TEXT NOT NULL)",
            [],
        )
        .unwrap();
        let err = SCHEMAS_V1[0].validate(&conn).unwrap_err();
        assert!(err.to_string().contains("non-null mismatch"));
    }

    #[test]
    fn test_validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, owner TEXT NOT NULL, UNIQUE (name, owner))",
            [],
        )
        .unwrap();
        let err = SCHEMAS_V1[0].validate(&conn).unwrap_err();
        assert!(err.to_string().contains("missing index"));
        assert!(err.to_string().contains("idx_items_owner"));
    }

    #[test]
    fn test_validate_detects_missing_unique_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, owner TEXT NOT NULL)",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_items_owner ON items(owner)", [])
            .unwrap();
        let err = SCHEMAS_V1[0].validate(&conn).unwrap_err();
        assert!(err.to_string().contains("missing unique constraint"));
    }

    #[test]
    fn test_unique_constraint_column_order_is_irrelevant() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, owner TEXT NOT NULL, UNIQUE (owner, name))",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_items_owner ON items(owner)", [])
            .unwrap();
        SCHEMAS_V1[0].validate(&conn).unwrap();
    }
}
