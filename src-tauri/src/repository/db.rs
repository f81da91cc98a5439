//! Local SQLite Document Store
//!
//! Stores documents of every collection in a single `documents` table.
//! Ids come from the autoincrement row id, so listing by id is insertion
//! order.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{Document, Fields, RemoteError, RemoteResult};
use super::traits::DocumentStore;

impl From<rusqlite::Error> for RemoteError {
    fn from(e: rusqlite::Error) -> Self {
        RemoteError::new(format!("sqlite: {}", e))
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::new(format!("malformed document: {}", e))
    }
}

/// SQLite implementation of the document store
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file and run migrations
    pub fn open(db_path: &Path) -> RemoteResult<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| RemoteError::new(format!("Failed to open {}: {}", db_path.display(), e)))?;
        Self::from_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> RemoteResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> RemoteResult<Self> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

/// Row ids are the document ids; anything that isn't one can't match
fn parse_id(id: &str) -> Option<i64> {
    id.parse::<i64>().ok()
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn list_all(&self, collection: &str) -> RemoteResult<Vec<Document>> {
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare(
            "SELECT id, fields FROM documents WHERE collection = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, fields) = row?;
            let fields: Fields = serde_json::from_str(&fields)?;
            documents.push(Document::new(id.to_string(), fields));
        }
        Ok(documents)
    }

    async fn create(&self, collection: &str, fields: Fields) -> RemoteResult<String> {
        let conn = self.conn.lock().await;

        let fields = serde_json::to_string(&fields)?;
        conn.execute(
            "INSERT INTO documents (collection, fields, updated_at) VALUES (?1, ?2, strftime('%s', 'now'))",
            params![collection, fields],
        )?;

        Ok(conn.last_insert_rowid().to_string())
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> RemoteResult<()> {
        let Some(row_id) = parse_id(id) else {
            return Ok(());
        };
        let conn = self.conn.lock().await;

        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, row_id],
        )?;
        Ok(())
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()> {
        let not_found = || RemoteError::new(format!("No document to update: {}", id));
        let row_id = parse_id(id).ok_or_else(not_found)?;
        let mut conn = self.conn.lock().await;

        let tx = conn.transaction()?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT fields FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, row_id],
                |row| row.get(0),
            )
            .optional()?;
        let existing = existing.ok_or_else(not_found)?;

        let mut merged: Fields = serde_json::from_str(&existing)?;
        merged.extend(fields);
        tx.execute(
            "UPDATE documents SET fields = ?1, updated_at = strftime('%s', 'now') WHERE id = ?2",
            params![serde_json::to_string(&merged)?, row_id],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> RemoteResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> RemoteResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            fields TEXT NOT NULL DEFAULT '{}'
        )",
        [],
    )?;

    if !column_exists(conn, "documents", "updated_at")? {
        conn.execute("ALTER TABLE documents ADD COLUMN updated_at INTEGER", [])?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
        [],
    )?;

    Ok(())
}
