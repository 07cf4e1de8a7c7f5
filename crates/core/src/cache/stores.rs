//! Named store operations.
//!
//! A store is a namespace of request→response entries inside the cache
//! database. Stores are opened by name, and the only way an entry leaves
//! a store is an overwrite under the same key or deletion of the whole store.

use std::collections::BTreeSet;

use super::connection::CacheDb;
use super::hash::CacheKey;
use crate::{Error, Snapshot};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Handle to one named store.
///
/// Cheap to clone; all clones talk to the same database connection.
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    name: String,
}

/// A stored entry with its bookkeeping columns.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredEntry {
    pub fn into_snapshot(self) -> Snapshot {
        Snapshot::new(self.status, self.headers, self.body)
    }
}

impl CacheDb {
    /// Open a store by name, creating it if absent.
    ///
    /// Opening an existing store is a no-op, so repeated opens never
    /// produce a second store.
    pub async fn open_store(&self, name: &str) -> Result<CacheStore, Error> {
        let store_name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![store_name, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(self.store(name))
    }

    /// Handle to a store by name without creating it.
    ///
    /// Reads against a store that does not exist see it empty and writes
    /// fail with [`Error::StoreClosed`], so inspecting through this handle
    /// never brings a deleted store back.
    pub fn store(&self, name: &str) -> CacheStore {
        CacheStore { db: self.clone(), name: name.to_string() }
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns whether a store with that name existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all stores currently present.
    pub async fn list_store_names(&self) -> Result<BTreeSet<String>, Error> {
        self.conn
            .call(|conn| -> Result<BTreeSet<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a store with this name exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }
}

impl CacheStore {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the response stored for `key`.
    ///
    /// A miss is `Ok(None)`, never an error.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<Snapshot>, Error> {
        Ok(self.entry(key).await?.map(StoredEntry::into_snapshot))
    }

    /// Look up the full stored entry for `key`.
    pub async fn entry(&self, key: &CacheKey) -> Result<Option<StoredEntry>, Error> {
        let store_name = self.name.clone();
        let key_hash = key.hash();
        self.db
            .conn
            .call(move |conn| -> Result<Option<StoredEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, headers_json, body, stored_at
                     FROM entries WHERE store_name = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store_name, key_hash], |row| {
                    Ok(StoredEntry {
                        method: row.get(0)?,
                        url: row.get(1)?,
                        status: row.get(2)?,
                        headers: Snapshot::headers_from_json(&row.get::<_, String>(3)?),
                        body: row.get(4)?,
                        stored_at: row.get(5)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under `key`, replacing any previous entry.
    ///
    /// The caller keeps `response`; the store writes its own copy.
    /// Fails with [`Error::StoreClosed`] if the store has been deleted
    /// since it was opened.
    pub async fn put(&self, key: &CacheKey, response: &Snapshot) -> Result<(), Error> {
        let copy = response.duplicate();
        let store_name = self.name.clone();
        let key_hash = key.hash();
        let method = key.method().to_string();
        let url = key.url().to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let open: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![store_name],
                    |row| row.get(0),
                )?;
                if !open {
                    return Err(Error::StoreClosed(store_name));
                }

                conn.execute(
                    "INSERT INTO entries (store_name, key_hash, method, url, status, headers_json, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(store_name, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        store_name,
                        key_hash,
                        method,
                        url,
                        copy.status,
                        copy.headers_json(),
                        &copy.body[..],
                        stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(store = %self.name, url = %key.url(), "stored response");
        Ok(())
    }

    /// URLs of every entry in this store, sorted.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        let store_name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE store_name = ?1 ORDER BY url")?;
                let urls = stmt
                    .query_map(params![store_name], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in this store.
    pub async fn len(&self) -> Result<u64, Error> {
        let store_name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store_name = ?1", params![store_name], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
