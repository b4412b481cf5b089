//! Message store backed by a single SQLite table
//!
//! Every operation opens its own connection and closes it before
//! returning. Writers are serialized by SQLite itself.

use crate::common::utils::STORAGE_TIME_FORMAT;
use crate::common::{now_local, Error, Result};
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS messages (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        text           TEXT NOT NULL,
        source_address TEXT NOT NULL,
        created_at     TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#;

/// One recorded submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub source_address: String,
    pub created_at: NaiveDateTime,
}

/// Selects messages for bulk removal.
///
/// A message matches when its address equals one of `addresses` or its text
/// contains one of `text_markers` (ASCII case-insensitive, as SQLite `LIKE`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteFilter {
    pub addresses: Vec<String>,
    pub text_markers: Vec<String>,
}

impl DeleteFilter {
    /// Entries left behind by test runs against a live coordinator
    pub fn test_entries() -> Self {
        Self {
            addresses: vec!["127.0.0.1".to_string(), "testclient".to_string()],
            text_markers: vec!["test".to_string(), "unittest".to_string()],
        }
    }

    pub fn by_address(address: impl Into<String>) -> Self {
        Self {
            addresses: vec![address.into()],
            text_markers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.text_markers.is_empty()
    }

    fn where_clause(&self) -> String {
        let mut clauses = Vec::new();
        if !self.addresses.is_empty() {
            let placeholders = vec!["?"; self.addresses.len()].join(", ");
            clauses.push(format!("source_address IN ({})", placeholders));
        }
        for _ in &self.text_markers {
            clauses.push("text LIKE ? ESCAPE '\\'".to_string());
        }
        clauses.join(" OR ")
    }
}

fn like_pattern(marker: &str) -> String {
    let mut pattern = String::with_capacity(marker.len() + 2);
    pattern.push('%');
    for c in marker.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Handle on the message database file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MessageStore {
    path: PathBuf,
}

impl MessageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        let conn = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .connect()
            .await?;
        Ok(conn)
    }

    async fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Create the database file and table if missing. Safe on every start.
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_parent_dir().await?;

        let mut conn = self.connect().await?;
        sqlx::query(CREATE_TABLE).execute(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }

    /// Append a message. `timestamp` defaults to the current local time.
    pub async fn insert(
        &self,
        text: &str,
        source_address: &str,
        timestamp: Option<NaiveDateTime>,
    ) -> Result<()> {
        let created_at = timestamp.unwrap_or_else(now_local);

        let mut conn = self.connect().await?;
        sqlx::query("INSERT INTO messages (text, source_address, created_at) VALUES (?, ?, ?)")
            .bind(text)
            .bind(source_address)
            .bind(created_at.format(STORAGE_TIME_FORMAT).to_string())
            .execute(&mut conn)
            .await?;
        conn.close().await?;
        Ok(())
    }

    /// All messages, newest first. Equal timestamps list the later insert first.
    pub async fn list_all(&self) -> Result<Vec<Message>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(
            "SELECT id, text, source_address, created_at FROM messages \
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&mut conn)
        .await?;
        conn.close().await?;

        rows.iter()
            .map(|row| -> Result<Message> {
                let id: i64 = row.try_get("id")?;
                let raw: String = row.try_get("created_at")?;
                let created_at = NaiveDateTime::parse_from_str(&raw, STORAGE_TIME_FORMAT)
                    .map_err(|e| {
                        Error::Corrupted(format!("message {} has timestamp {:?}: {}", id, raw, e))
                    })?;
                Ok(Message {
                    id,
                    text: row.try_get("text")?,
                    source_address: row.try_get("source_address")?,
                    created_at,
                })
            })
            .collect()
    }

    /// Number of stored messages
    pub async fn count(&self) -> Result<i64> {
        let mut conn = self.connect().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;
        Ok(count)
    }

    /// Remove every message matching `filter`, returning how many went.
    pub async fn delete_matching(&self, filter: &DeleteFilter) -> Result<u64> {
        if filter.is_empty() {
            return Ok(0);
        }

        let sql = format!("DELETE FROM messages WHERE {}", filter.where_clause());
        let mut query = sqlx::query(&sql);
        for address in &filter.addresses {
            query = query.bind(address.as_str());
        }
        for marker in &filter.text_markers {
            query = query.bind(like_pattern(marker));
        }

        let mut conn = self.connect().await?;
        let removed = query.execute(&mut conn).await?.rows_affected();
        conn.close().await?;
        Ok(removed)
    }

    /// Drop and recreate the table. Irreversible.
    pub async fn reset(&self) -> Result<()> {
        self.ensure_parent_dir().await?;

        let mut conn = self.connect().await?;
        sqlx::query("DROP TABLE IF EXISTS messages")
            .execute(&mut conn)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&mut conn).await?;
        conn.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    async fn open_store(dir: &tempfile::TempDir) -> MessageStore {
        let store = MessageStore::new(dir.path().join("messages.db"));
        store.initialize().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.insert("pi-01", "10.0.0.11", None).await.unwrap();

        store.initialize().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_initialize_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("messages.db");
        let store = MessageStore::new(&nested);

        store.initialize().await.unwrap();
        assert!(nested.exists());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_same_second_lists_latest_insert_first() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let ts = at(8, 30, 0);

        for text in ["A", "B", "C"] {
            store.insert(text, "10.0.0.5", Some(ts)).await.unwrap();
        }

        let texts: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn test_list_orders_by_timestamp() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.insert("late", "10.0.0.2", Some(at(9, 0, 0))).await.unwrap();
        store.insert("early", "10.0.0.3", Some(at(7, 0, 0))).await.unwrap();
        store.insert("middle", "10.0.0.4", Some(at(8, 0, 0))).await.unwrap();

        let messages = store.list_all().await.unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["late", "middle", "early"]);
        assert_eq!(messages[0].created_at, at(9, 0, 0));
        assert_eq!(messages[0].source_address, "10.0.0.2");
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let ts = at(12, 0, 0);

        store.insert("one", "10.0.0.1", Some(ts)).await.unwrap();
        store.insert("two", "10.0.0.1", Some(ts)).await.unwrap();

        let messages = store.list_all().await.unwrap();
        assert!(messages[0].id > messages[1].id);
    }

    #[tokio::test]
    async fn test_insert_defaults_timestamp_to_now() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        let before = now_local();

        store.insert("pi-09", "10.0.0.9", None).await.unwrap();

        let after = now_local();
        let message = &store.list_all().await.unwrap()[0];
        assert!(message.created_at >= before && message.created_at <= after);
    }

    #[tokio::test]
    async fn test_delete_matching_address() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.insert("pi-01", "127.0.0.1", None).await.unwrap();
        store.insert("pi-02", "10.0.0.12", None).await.unwrap();
        store.insert("pi-03", "127.0.0.1", None).await.unwrap();

        let removed = store
            .delete_matching(&DeleteFilter::by_address("127.0.0.1"))
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let left = store.list_all().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].source_address, "10.0.0.12");
    }

    #[tokio::test]
    async fn test_delete_test_entries() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.insert("pi-01", "127.0.0.1", None).await.unwrap();
        store.insert("pi-02", "testclient", None).await.unwrap();
        store.insert("my test host", "10.0.0.3", None).await.unwrap();
        store.insert("UnitTest run", "10.0.0.4", None).await.unwrap();
        store.insert("pi-05", "10.0.0.5", None).await.unwrap();

        let removed = store
            .delete_matching(&DeleteFilter::test_entries())
            .await
            .unwrap();
        assert_eq!(removed, 4);

        let left = store.list_all().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].text, "pi-05");
    }

    #[tokio::test]
    async fn test_delete_markers_are_literal() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;

        store.insert("load 50%", "10.0.0.1", None).await.unwrap();
        store.insert("load 500", "10.0.0.2", None).await.unwrap();

        let filter = DeleteFilter {
            addresses: Vec::new(),
            text_markers: vec!["50%".to_string()],
        };
        assert_eq!(store.delete_matching(&filter).await.unwrap(), 1);
        assert_eq!(store.list_all().await.unwrap()[0].text, "load 500");
    }

    #[tokio::test]
    async fn test_empty_filter_removes_nothing() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.insert("pi-01", "10.0.0.1", None).await.unwrap();

        let removed = store
            .delete_matching(&DeleteFilter::default())
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_empties_store() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir).await;
        store.insert("pi-01", "10.0.0.1", None).await.unwrap();
        store.insert("pi-02", "10.0.0.2", None).await.unwrap();

        store.reset().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        store.insert("pi-03", "10.0.0.3", None).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_without_table_is_an_error() {
        let dir = tempdir().unwrap();
        let store = MessageStore::new(dir.path().join("never-initialized.db"));
        assert!(matches!(store.list_all().await, Err(Error::Database(_))));
    }

    #[test]
    fn test_where_clause() {
        let filter = DeleteFilter::test_entries();
        assert_eq!(
            filter.where_clause(),
            "source_address IN (?, ?) OR text LIKE ? ESCAPE '\\' OR text LIKE ? ESCAPE '\\'"
        );
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
