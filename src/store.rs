// src/store.rs
//! Durable append-only comment log over SQLite.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// A persisted comment. Rows are immutable once written and never deleted
/// by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub text: String,
}

/// Single mutexed connection, WAL journal.
///
/// Each operation takes the lock on its own: an `append` and the `read_all`
/// that follows it are separate critical sections, so concurrent requests
/// may interleave between them. Callers get no snapshot guarantee.
#[derive(Debug)]
pub struct CommentStore {
    conn: Mutex<Connection>,
}

impl CommentStore {
    /// Open (or create) the database file and ensure the schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create data dir {}", parent.display()))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("open comment db {}", db_path.display()))?;
        Self::init(conn)
    }

    /// Ephemeral store for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().context("open in-memory comment db")?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // WAL reduces writer/reader blocking for the single-writer design.
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS comments (
              id    INTEGER PRIMARY KEY AUTOINCREMENT,
              text  TEXT NOT NULL
            );
            "#,
        )
        .context("create comments schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Persist a comment and return its assigned id. The row is committed
    /// before this returns.
    pub fn append(&self, text: &str) -> Result<i64> {
        let conn = self.conn.lock().expect("comment store mutex poisoned");
        conn.execute("INSERT INTO comments (text) VALUES (?1)", [text])
            .context("insert comment")?;
        Ok(conn.last_insert_rowid())
    }

    /// Every stored comment, in insertion order.
    pub fn read_all(&self) -> Result<Vec<Comment>> {
        let conn = self.conn.lock().expect("comment store mutex poisoned");
        let mut stmt = conn
            .prepare("SELECT id, text FROM comments ORDER BY id")
            .context("prepare history scan")?;
        let mapped = stmt
            .query_map([], |row| {
                Ok(Comment {
                    id: row.get(0)?,
                    text: row.get(1)?,
                })
            })
            .context("scan comments")?;
        let mut comments = Vec::new();
        for row in mapped {
            comments.push(row.context("read comment row")?);
        }
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_assigns_monotonically_increasing_ids() {
        let store = CommentStore::open_in_memory().unwrap();
        let a = store.append("первый").unwrap();
        let b = store.append("второй").unwrap();
        assert!(b > a);
    }

    #[test]
    fn read_all_returns_rows_in_insertion_order() {
        let store = CommentStore::open_in_memory().unwrap();
        store.append("первый").unwrap();
        store.append("второй").unwrap();
        store.append("третий").unwrap();

        let rows = store.read_all().unwrap();
        let texts: Vec<&str> = rows.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["первый", "второй", "третий"]);
    }

    #[test]
    fn read_all_on_empty_store_is_empty() {
        let store = CommentStore::open_in_memory().unwrap();
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn open_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comments.db");

        let store = CommentStore::open(&path).unwrap();
        let id = store.append("надолго").unwrap();
        drop(store);

        let reopened = CommentStore::open(&path).unwrap();
        let rows = reopened.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].text, "надолго");
    }
}
