use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::ServiceError;
use crate::models::{Query, SavedQuery};
use crate::service::SavedQueryStore;
use crate::utils::time::now_utc_rfc3339;

pub const SQLITE_SCHEMA_VERSION: &str = "reportkit.saved_queries.v1";
pub const SAVED_QUERIES_TABLE: &str = "saved_queries";
pub const SCHEMA_META_TABLE: &str = "reportkit_schema_meta";
pub const SAVED_QUERIES_FILE_NAME: &str = "saved_queries.sqlite";

const CREATE_SAVED_QUERIES_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS saved_queries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner TEXT NOT NULL,
    database_name TEXT NOT NULL,
    table_name TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    is_shared INTEGER NOT NULL DEFAULT 0,
    query_json TEXT NOT NULL,
    created_at_utc TEXT NOT NULL,
    updated_at_utc TEXT NOT NULL,
    CHECK (is_shared IN (0, 1))
);
"#;

const CREATE_INDEX_DATABASE_OWNER_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_saved_queries_database_owner
ON saved_queries (database_name, owner);
"#;

const CREATE_META_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS reportkit_schema_meta (
    schema_version TEXT NOT NULL,
    applied_at_utc TEXT NOT NULL
);
"#;

const SELECT_COLUMNS: &str = "id, owner, name, description, is_shared, query_json";

#[must_use]
pub fn schema_statements() -> &'static [&'static str] {
    &[
        CREATE_SAVED_QUERIES_TABLE_SQL,
        CREATE_INDEX_DATABASE_OWNER_SQL,
        CREATE_META_TABLE_SQL,
    ]
}

#[must_use]
pub fn create_schema_sql() -> String {
    schema_statements().join("\n")
}

pub fn open_sqlite_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create sqlite parent directory: {}",
                parent.display()
            )
        })?;
    }

    Connection::open(path)
        .with_context(|| format!("failed to open sqlite database: {}", path.display()))
}

pub fn ensure_sqlite_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(&create_schema_sql())
        .context("failed to create sqlite schema")?;

    if schema_meta_has_version(connection, SQLITE_SCHEMA_VERSION)? {
        return Ok(());
    }

    connection
        .execute(
            &format!(
                "INSERT INTO {SCHEMA_META_TABLE} (schema_version, applied_at_utc) VALUES (?1, ?2)"
            ),
            params![SQLITE_SCHEMA_VERSION, now_utc_rfc3339()],
        )
        .context("failed to write sqlite schema meta row")?;

    Ok(())
}

fn schema_meta_has_version(connection: &Connection, schema_version: &str) -> Result<bool> {
    let query = format!(
        "SELECT EXISTS(SELECT 1 FROM {SCHEMA_META_TABLE} WHERE schema_version = ?1 LIMIT 1)"
    );
    let exists = connection
        .query_row(&query, [schema_version], |row| row.get::<usize, i64>(0))
        .context("failed to query sqlite schema version metadata")?;
    Ok(exists != 0)
}

/// Saved queries kept in a local SQLite file, seen through the eyes of one
/// user: their own queries plus those other users shared.
pub struct SqliteSavedQueryStore {
    connection: Connection,
    current_user: String,
}

struct StoredRow {
    id: i64,
    owner: String,
    name: String,
    description: String,
    is_shared: bool,
    query_json: String,
}

impl SqliteSavedQueryStore {
    pub fn open(path: &Path, current_user: impl Into<String>) -> Result<Self> {
        let connection = open_sqlite_connection(path)?;
        Self::with_connection(connection, current_user)
    }

    pub fn in_memory(current_user: impl Into<String>) -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory sqlite database")?;
        Self::with_connection(connection, current_user)
    }

    pub fn with_connection(connection: Connection, current_user: impl Into<String>) -> Result<Self> {
        ensure_sqlite_schema(&connection)?;
        Ok(Self {
            connection,
            current_user: current_user.into(),
        })
    }

    #[must_use]
    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    pub fn list_visible(&self, database: &str) -> Result<Vec<SavedQuery>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM {SAVED_QUERIES_TABLE} \
             WHERE database_name = ?1 AND (owner = ?2 OR is_shared = 1) \
             ORDER BY name COLLATE NOCASE, id"
        );
        let mut statement = self
            .connection
            .prepare(&sql)
            .context("failed to prepare saved query listing")?;
        let rows = statement
            .query_map(params![database, self.current_user], read_row)
            .context("failed to list saved queries")?;

        let mut saved = Vec::new();
        for row in rows {
            let row = row.context("failed to read saved query row")?;
            saved.push(self.decode_row(row)?);
        }
        Ok(saved)
    }

    /// Looks up a saved query the current user may see.
    pub fn find(&self, id: &str) -> Result<Option<SavedQuery>> {
        let row = self.find_row(parse_id(id)?)?;
        match row {
            Some(row) if row.owner == self.current_user || row.is_shared => {
                self.decode_row(row).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn insert(&self, saved: &SavedQuery) -> Result<SavedQuery> {
        let query_json = encode_query(&saved.query)?;
        let now = now_utc_rfc3339();
        self.connection
            .execute(
                &format!(
                    "INSERT INTO {SAVED_QUERIES_TABLE} \
                     (owner, database_name, table_name, name, description, is_shared, query_json, created_at_utc, updated_at_utc) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)"
                ),
                params![
                    self.current_user,
                    saved.query.database,
                    saved.query.table,
                    saved.name,
                    saved.description,
                    saved.is_shared,
                    query_json,
                    now,
                ],
            )
            .with_context(|| format!("failed to insert saved query `{}`", saved.name))?;

        let mut stored = saved.clone();
        stored.id = Some(self.connection.last_insert_rowid().to_string());
        stored.user_is_owner = true;
        stored.query.is_bound_to_ui = false;
        Ok(stored)
    }

    pub fn replace(&self, saved: &SavedQuery) -> Result<SavedQuery> {
        let raw_id = saved
            .id
            .as_deref()
            .ok_or_else(|| anyhow!("saved query `{}` has no id to update", saved.name))?;
        let id = parse_id(raw_id)?;
        self.require_owner(id, "update")?;

        let query_json = encode_query(&saved.query)?;
        self.connection
            .execute(
                &format!(
                    "UPDATE {SAVED_QUERIES_TABLE} SET \
                     database_name = ?2, table_name = ?3, name = ?4, description = ?5, \
                     is_shared = ?6, query_json = ?7, updated_at_utc = ?8 \
                     WHERE id = ?1"
                ),
                params![
                    id,
                    saved.query.database,
                    saved.query.table,
                    saved.name,
                    saved.description,
                    saved.is_shared,
                    query_json,
                    now_utc_rfc3339(),
                ],
            )
            .with_context(|| format!("failed to update saved query id={id}"))?;

        let mut stored = saved.clone();
        stored.user_is_owner = true;
        stored.query.is_bound_to_ui = false;
        Ok(stored)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let id = parse_id(id)?;
        self.require_owner(id, "delete")?;
        self.connection
            .execute(
                &format!("DELETE FROM {SAVED_QUERIES_TABLE} WHERE id = ?1"),
                [id],
            )
            .with_context(|| format!("failed to delete saved query id={id}"))?;
        Ok(())
    }

    fn find_row(&self, id: i64) -> Result<Option<StoredRow>> {
        self.connection
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM {SAVED_QUERIES_TABLE} WHERE id = ?1"),
                [id],
                read_row,
            )
            .optional()
            .with_context(|| format!("failed to read saved query id={id}"))
    }

    fn require_owner(&self, id: i64, action: &str) -> Result<()> {
        let Some(row) = self.find_row(id)? else {
            bail!("saved query id={id} does not exist");
        };
        if row.owner != self.current_user {
            bail!(
                "cannot {action} saved query `{}`: it belongs to another user",
                row.name
            );
        }
        Ok(())
    }

    fn decode_row(&self, row: StoredRow) -> Result<SavedQuery> {
        let query: Query = serde_json::from_str(&row.query_json)
            .with_context(|| format!("failed to decode stored query id={}", row.id))?;
        Ok(SavedQuery {
            id: Some(row.id.to_string()),
            name: row.name,
            description: row.description,
            is_shared: row.is_shared,
            user_is_owner: row.owner == self.current_user,
            query,
        })
    }
}

impl SavedQueryStore for SqliteSavedQueryStore {
    fn list(&self, database: &str) -> Result<Vec<SavedQuery>, ServiceError> {
        Ok(self.list_visible(database)?)
    }

    fn get(&self, id: &str) -> Result<Option<SavedQuery>, ServiceError> {
        Ok(self.find(id)?)
    }

    fn create(&self, saved: &SavedQuery) -> Result<SavedQuery, ServiceError> {
        Ok(self.insert(saved)?)
    }

    fn update(&self, saved: &SavedQuery) -> Result<SavedQuery, ServiceError> {
        Ok(self.replace(saved)?)
    }

    fn delete(&self, id: &str) -> Result<(), ServiceError> {
        Ok(self.remove(id)?)
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        is_shared: row.get(4)?,
        query_json: row.get(5)?,
    })
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("invalid saved query id `{raw}`"))
}

fn encode_query(query: &Query) -> Result<String> {
    let mut detached = query.clone();
    detached.is_bound_to_ui = false;
    serde_json::to_string(&detached).context("failed to encode saved query json")
}
