//! Entry CRUD for the SQLite storage.
//!
//! Implements [`CacheStorage`] on [`CacheDb`]. Headers are stored as a JSON
//! array of `[name, value]` pairs and bodies as blobs.

use super::connection::CacheDb;
use super::{CacheStorage, MatchOptions, require_get};
use crate::{Error, Request, Response};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Raw entry columns, decoded outside the database thread.
type EntryRow = (String, i64, String, Vec<u8>);

fn decode_entry((url, status, headers_json, body): EntryRow) -> Result<Response, Error> {
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status} for {url}")))?;
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    Ok(Response { url, status, headers, body: body.into() })
}

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

impl CacheDb {
    async fn query_entry(&self, sql: &'static str, name: Option<String>, url: String) -> Result<Option<Response>, Error> {
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(sql)?;
                let result = match name {
                    Some(name) => stmt.query_row(params![name, url], read_entry),
                    None => stmt.query_row(params![url], read_entry),
                };

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(decode_entry).transpose()
    }
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY id")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, name: &str, request: &Request, options: MatchOptions) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = request.key();
        if options.ignore_search {
            self.query_entry(
                "SELECT e.response_url, e.status, e.headers_json, e.body
                 FROM entries e JOIN caches c ON c.id = e.cache_id
                 WHERE c.name = ?1 AND e.url_without_query = ?2
                 ORDER BY e.rowid DESC LIMIT 1",
                Some(name.to_string()),
                key.without_query,
            )
            .await
        } else {
            self.query_entry(
                "SELECT e.response_url, e.status, e.headers_json, e.body
                 FROM entries e JOIN caches c ON c.id = e.cache_id
                 WHERE c.name = ?1 AND e.request_url = ?2",
                Some(name.to_string()),
                key.url,
            )
            .await
        }
    }

    async fn match_any(&self, request: &Request, options: MatchOptions) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = request.key();
        if options.ignore_search {
            self.query_entry(
                "SELECT e.response_url, e.status, e.headers_json, e.body
                 FROM entries e JOIN caches c ON c.id = e.cache_id
                 WHERE e.url_without_query = ?1
                 ORDER BY c.id ASC, e.rowid DESC LIMIT 1",
                None,
                key.without_query,
            )
            .await
        } else {
            self.query_entry(
                "SELECT e.response_url, e.status, e.headers_json, e.body
                 FROM entries e JOIN caches c ON c.id = e.cache_id
                 WHERE e.request_url = ?1
                 ORDER BY c.id ASC LIMIT 1",
                None,
                key.url,
            )
            .await
        }
    }

    async fn put(&self, name: &str, request: &Request, response: Response) -> Result<(), Error> {
        require_get(request)?;
        let key = request.key();
        let name = name.to_string();
        let headers_json = serde_json::to_string(&response.headers)?;
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![&name, &now],
                )?;
                let cache_id: i64 =
                    tx.query_row("SELECT id FROM caches WHERE name = ?1", params![&name], |row| row.get(0))?;
                tx.execute(
                    "INSERT OR REPLACE INTO entries (
                        cache_id, request_url, url_without_query, response_url,
                        status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        cache_id,
                        &key.url,
                        &key.without_query,
                        &response.url,
                        i64::from(response.status),
                        &headers_json,
                        response.body.as_ref(),
                        &now,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.request_url FROM entries e JOIN caches c ON c.id = e.cache_id
                     WHERE c.name = ?1 ORDER BY e.rowid",
                )?;
                let urls = stmt
                    .query_map(params![name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}
