//! Generation and entry operations on the SQLite store.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

use super::connection::CacheDb;
use super::{CacheHandle, CacheStorage};
use crate::{Error, Method, RequestKey, Response};

/// Handle to one generation inside a [`CacheDb`].
#[derive(Clone, Debug)]
pub struct SqliteGeneration {
    db: CacheDb,
    name: String,
}

/// Raw columns of an `entries` row.
struct EntryRow {
    status: i64,
    status_text: String,
    response_type: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn into_response(self) -> Result<Response, Error> {
        let status = u16::try_from(self.status)
            .map_err(|_| Error::CorruptEntry(format!("status out of range: {}", self.status)))?;
        Ok(Response {
            status,
            status_text: self.status_text,
            response_type: self.response_type.parse()?,
            headers: serde_json::from_str(&self.headers_json)?,
            body: Bytes::from(self.body),
        })
    }
}

fn insert_entry(
    conn: &rusqlite::Connection, generation: &str, key: &RequestKey, response: &Response, headers_json: &str,
) -> Result<(), Error> {
    conn.execute(
        "INSERT OR REPLACE INTO entries (
            generation, key_hash, method, url, status, status_text,
            response_type, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            generation,
            key.digest(),
            key.method().as_str(),
            key.url().as_str(),
            i64::from(response.status),
            &response.status_text,
            response.response_type.as_str(),
            headers_json,
            response.body.as_ref(),
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStorage for CacheDb {
    type Handle = SqliteGeneration;

    async fn open(&self, name: &str) -> Result<SqliteGeneration, Error> {
        let generation = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let created = conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![generation, chrono::Utc::now().to_rfc3339()],
                )?;
                if created > 0 {
                    tracing::debug!(generation = %generation, "created cache generation");
                }
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(SqliteGeneration { db: self.clone(), name: name.to_string() })
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheHandle for SqliteGeneration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let generation = self.name.clone();
        let digest = key.digest();
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let result = conn.query_row(
                    "SELECT status, status_text, response_type, headers_json, body
                     FROM entries WHERE generation = ?1 AND key_hash = ?2",
                    params![generation, digest],
                    |row| {
                        Ok(EntryRow {
                            status: row.get(0)?,
                            status_text: row.get(1)?,
                            response_type: row.get(2)?,
                            headers_json: row.get(3)?,
                            body: row.get(4)?,
                        })
                    },
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }

    async fn put(&self, key: &RequestKey, response: &Response) -> Result<(), Error> {
        let generation = self.name.clone();
        let headers_json = serde_json::to_string(&response.headers)?;
        let key = key.clone();
        let response = response.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                insert_entry(conn, &generation, &key, &response, &headers_json)
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        let generation = self.name.clone();
        let encoded = entries
            .iter()
            .map(|(key, response)| Ok((key.clone(), response.clone(), serde_json::to_string(&response.headers)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for (key, response, headers_json) in &encoded {
                    insert_entry(&tx, &generation, key, response, headers_json)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        let generation = self.name.clone();
        let digest = key.digest();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM entries WHERE generation = ?1 AND key_hash = ?2",
                    params![generation, digest],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let generation = self.name.clone();
        let rows = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE generation = ?1 ORDER BY rowid")?;
                let rows = stmt
                    .query_map(params![generation], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter()
            .map(|(method, url)| {
                let url = Url::parse(&url).map_err(|e| Error::CorruptEntry(format!("stored url {url}: {e}")))?;
                Ok(RequestKey::new(Method::from(method.as_str()), &url))
            })
            .collect()
    }
}
