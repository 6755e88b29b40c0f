use std::{marker::PhantomData, sync::MutexGuard};

use anyhow::anyhow;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::{
    domain::{Document, id::DocId},
    storage::{db::DbHandle, error::StorageError, schema::columns::*},
};

/// One named collection of JSON documents, backed by a two-column table
/// (`id`, `body`). Supplies the point operations the stores are built on:
/// insert/find/list/replace/delete, field-level set/push/pull, and a
/// substring-pattern query.
///
/// Every operation is a single statement (or a single transaction for the
/// read-modify-write field mutations) against the backing table. There is
/// no batching and no transaction spanning two calls.
pub struct Collection<T> {
    conn: DbHandle,
    table: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            table: self.table,
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new(conn: DbHandle, table: &'static str) -> Self {
        Self {
            conn,
            table,
            _marker: PhantomData,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Internal(anyhow!("database mutex poisoned")))
    }

    /// Assigns a fresh identifier, writes it into the document, and stores
    /// the body under it.
    pub fn insert(&self, doc: &mut T) -> Result<DocId, StorageError> {
        let id = DocId::generate();
        doc.set_id(id.as_str());
        let body = serde_json::to_string(doc)?;

        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO {t} ({ID}, {BODY}) VALUES (?1, ?2)", t = self.table),
            params![id.as_str(), body],
        )?;
        Ok(id)
    }

    /// Point lookup. `None` is a plain miss, not a fault.
    pub fn find(&self, id: &DocId) -> Result<Option<T>, StorageError> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                &format!("SELECT {BODY} FROM {t} WHERE {ID} = ?1", t = self.table),
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => {
                let mut doc: T = serde_json::from_str(&body)?;
                doc.set_id(id.as_str());
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    /// First document whose top-level string `field` equals `value` exactly.
    pub fn find_by_field(&self, field: &str, value: &str) -> Result<Option<T>, StorageError> {
        for (id, body) in self.rows()? {
            let raw: Value = serde_json::from_str(&body)?;
            if raw.get(field).and_then(Value::as_str) == Some(value) {
                let mut doc: T = serde_json::from_str(&body)?;
                doc.set_id(&id);
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    pub fn list(&self) -> Result<Vec<T>, StorageError> {
        self.rows()?
            .into_iter()
            .map(|(id, body)| {
                let mut doc: T = serde_json::from_str(&body)?;
                doc.set_id(&id);
                Ok(doc)
            })
            .collect()
    }

    /// Full-document replace. Returns `false` when nothing matched.
    pub fn replace(&self, id: &DocId, doc: &mut T) -> Result<bool, StorageError> {
        doc.set_id(id.as_str());
        let body = serde_json::to_string(doc)?;

        let conn = self.lock()?;
        let n = conn.execute(
            &format!("UPDATE {t} SET {BODY} = ?2 WHERE {ID} = ?1", t = self.table),
            params![id.as_str(), body],
        )?;
        Ok(n > 0)
    }

    pub fn delete(&self, id: &DocId) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let n = conn.execute(
            &format!("DELETE FROM {t} WHERE {ID} = ?1", t = self.table),
            params![id.as_str()],
        )?;
        Ok(n > 0)
    }

    /// Overwrites one top-level field. Returns `false` when nothing matched.
    pub fn set_field(&self, id: &DocId, field: &str, value: Value) -> Result<bool, StorageError> {
        Ok(self.mutate(id, |doc| doc[field] = value)?.is_some())
    }

    /// Appends one element to the array in `field`, creating the array if
    /// the field is absent. Returns `false` when nothing matched.
    pub fn push_element(&self, id: &DocId, field: &str, element: Value) -> Result<bool, StorageError> {
        let pushed = self.mutate(id, |doc| {
            match doc.get_mut(field).and_then(Value::as_array_mut) {
                Some(arr) => arr.push(element),
                None => doc[field] = Value::Array(vec![element]),
            }
        })?;
        Ok(pushed.is_some())
    }

    /// Removes every element of the array in `field` whose `key` equals
    /// `value`, and reports how many were removed. A missing document or a
    /// missing field removes nothing.
    pub fn pull_elements(
        &self,
        id: &DocId,
        field: &str,
        key: &str,
        value: &str,
    ) -> Result<usize, StorageError> {
        let removed = self.mutate(id, |doc| {
            let Some(arr) = doc.get_mut(field).and_then(Value::as_array_mut) else {
                return 0;
            };
            let before = arr.len();
            arr.retain(|el| el.get(key).and_then(Value::as_str) != Some(value));
            before - arr.len()
        })?;
        Ok(removed.unwrap_or(0))
    }

    /// Case-insensitive substring scan of `keyword` over the named
    /// top-level string fields. An empty keyword matches every document
    /// that carries at least one of the fields; a field a document does
    /// not carry never matches.
    pub fn find_matching(&self, fields: &[&str], keyword: &str) -> Result<Vec<T>, StorageError> {
        let needle = keyword.to_lowercase();
        let mut out = Vec::new();

        for (id, body) in self.rows()? {
            let raw: Value = serde_json::from_str(&body)?;
            let hit = fields.iter().any(|field| {
                raw.get(*field)
                    .and_then(Value::as_str)
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
            });
            if hit {
                let mut doc: T = serde_json::from_str(&body)?;
                doc.set_id(&id);
                out.push(doc);
            }
        }
        Ok(out)
    }

    fn rows(&self) -> Result<Vec<(String, String)>, StorageError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {ID}, {BODY} FROM {t}", t = self.table))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Read-modify-write of one document body inside a transaction.
    /// Returns `None` (without calling `f`) when the document is absent.
    fn mutate<R>(
        &self,
        id: &DocId,
        f: impl FnOnce(&mut Value) -> R,
    ) -> Result<Option<R>, StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let body: Option<String> = tx
            .query_row(
                &format!("SELECT {BODY} FROM {t} WHERE {ID} = ?1", t = self.table),
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let result = match body {
            Some(body) => {
                let mut doc: Value = serde_json::from_str(&body)?;
                let r = f(&mut doc);
                tx.execute(
                    &format!("UPDATE {t} SET {BODY} = ?2 WHERE {ID} = ?1", t = self.table),
                    params![id.as_str(), doc.to_string()],
                )?;
                Some(r)
            }
            None => None,
        };

        tx.commit()?;
        Ok(result)
    }
}
