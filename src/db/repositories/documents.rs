//! Key-value document access. Each key holds one JSON document; reads and writes
//! of a key are whole-document.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::db::{
    helpers::{decode_json, encode_json},
    Database,
};

/// Result of an edit closure passed to [`Database::update_document`].
pub enum Edit<R> {
    /// Write the edited document back and return `R`.
    Commit(R),
    /// Leave the stored document untouched and return `R`.
    Discard(R),
}

pub fn read_document<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM documents WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("failed to read document '{key}'"))?;

    raw.map(|raw| decode_json(&raw, key)).transpose()
}

pub fn write_document<T: Serialize>(
    conn: &Connection,
    key: &str,
    value: &T,
    updated_at: DateTime<Utc>,
) -> Result<()> {
    let encoded = encode_json(value, key)?;
    conn.execute(
        "INSERT INTO documents (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, encoded, updated_at.to_rfc3339()],
    )
    .with_context(|| format!("failed to write document '{key}'"))?;
    Ok(())
}

impl Database {
    pub async fn get_document<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let key = key.to_string();
        self.execute(move |conn| read_document(conn, &key)).await
    }

    /// Read-modify-write of one document inside a single transaction. A missing
    /// document starts from `T::default()`.
    pub async fn update_document<T, R, F>(&self, key: &str, edit: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default + 'static,
        R: Send + 'static,
        F: FnOnce(&mut T) -> Edit<R> + Send + 'static,
    {
        let key = key.to_string();
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open document transaction")?;
            let mut document: T = read_document(&tx, &key)?.unwrap_or_default();

            match edit(&mut document) {
                Edit::Commit(result) => {
                    write_document(&tx, &key, &document, Utc::now())?;
                    tx.commit()
                        .with_context(|| format!("failed to commit document '{key}'"))?;
                    Ok(result)
                }
                Edit::Discard(result) => Ok(result),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("store.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let (_dir, db) = open_temp();
        let value: Option<Vec<String>> = db.get_document("groups").await.unwrap();
        assert!(value.is_none());
    }

    async fn replace(db: &Database, value: Vec<String>) {
        db.update_document("groups", move |doc: &mut Vec<String>| {
            *doc = value;
            Edit::Commit(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn committed_edit_replaces_document() {
        let (_dir, db) = open_temp();
        replace(&db, vec!["a".to_string()]).await;
        replace(&db, vec!["b".to_string()]).await;

        let value: Option<Vec<String>> = db.get_document("groups").await.unwrap();
        assert_eq!(value, Some(vec!["b".to_string()]));
    }

    #[tokio::test]
    async fn discarded_edit_leaves_document_untouched() {
        let (_dir, db) = open_temp();
        db.update_document("groups", |doc: &mut Vec<u32>| {
            doc.extend([1, 2]);
            Edit::Commit(())
        })
        .await
        .unwrap();

        let seen = db
            .update_document("groups", |doc: &mut Vec<u32>| {
                doc.push(3);
                Edit::Discard(doc.len())
            })
            .await
            .unwrap();
        assert_eq!(seen, 3);

        let stored: Option<Vec<u32>> = db.get_document("groups").await.unwrap();
        assert_eq!(stored, Some(vec![1, 2]));

        db.update_document("groups", |doc: &mut Vec<u32>| {
            doc.push(3);
            Edit::Commit(())
        })
        .await
        .unwrap();
        let stored: Option<Vec<u32>> = db.get_document("groups").await.unwrap();
        assert_eq!(stored, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.sqlite3");
        {
            let db = Database::new(path.clone()).unwrap();
            replace(&db, vec!["kept".to_string()]).await;
        }
        let db = Database::new(path).unwrap();
        let value: Option<Vec<String>> = db.get_document("groups").await.unwrap();
        assert_eq!(value, Some(vec!["kept".to_string()]));
    }
}
