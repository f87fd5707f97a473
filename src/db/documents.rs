//! Schemaless document store on SQLite.
//!
//! Documents are JSON objects keyed by `(collection, id)`. Reads go straight
//! to the pool. Every mutation takes the store's write lock and runs inside
//! one transaction, so a batch or a read-modify-write is atomic with respect
//! to every other mutation made through the same store. Transactions start
//! with `BEGIN IMMEDIATE` and wait on the busy timeout for writers on other
//! connections rather than failing at their first write.
//!
//! The `created_at` column orders query results. It is taken from the
//! document's `createdAt` field when present, otherwise the write time.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::changes::{Change, ChangeHub, ChangeKind, Watch};
use super::ops::{FieldOp, Write};
use super::query::{json_path, push_value, timestamp, Query};
use super::Collection;
use crate::error::{Error, Result};

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    data: String,
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
    changes: Arc<ChangeHub>,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
            changes: Arc::new(ChangeHub::new()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn insert<T: Serialize>(&self, collection: Collection, id: &str, doc: &T) -> Result<()> {
        self.batch(vec![Write::insert(collection, id, doc)?]).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<T>> {
        let data: Option<String> =
            sqlx::query_scalar("SELECT data FROM documents WHERE collection = ? AND id = ?")
                .bind(collection.name())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        data.map(|data| decode(collection, id, &data)).transpose()
    }

    /// Like [`get`](Self::get) but a missing document is an error.
    pub async fn fetch<T: DeserializeOwned>(&self, collection: Collection, id: &str) -> Result<T> {
        self.get(collection, id)
            .await?
            .ok_or_else(|| Error::not_found(collection, id))
    }

    pub async fn query<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, data FROM documents");
        query.push_where(&mut qb);
        query.push_order_and_limit(&mut qb);

        let rows: Vec<DocumentRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        tracing::debug!("Query on {} returned {} row(s)", query.collection, rows.len());

        rows.into_iter()
            .map(|row| decode(query.collection, &row.id, &row.data))
            .collect()
    }

    /// Counts matching documents; ordering and limit are ignored.
    pub async fn count(&self, query: &Query) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        count_on(&mut conn, query).await
    }

    pub async fn update(&self, collection: Collection, id: &str, ops: Vec<FieldOp>) -> Result<()> {
        self.batch(vec![Write::update(collection, id, ops)]).await
    }

    /// Deletes a document. Deleting a missing document succeeds.
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.batch(vec![Write::delete(collection, id)]).await
    }

    /// Atomic read-modify-write of one typed document.
    ///
    /// `f` sees the current stored value; if it returns an error nothing is
    /// written. Returns the stored document and `f`'s result.
    pub async fn modify<T, R, F>(&self, collection: Collection, id: &str, f: F) -> Result<(T, R)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<R>,
    {
        self.modify_in(collection, id, None, |doc, _| f(doc)).await
    }

    /// Like [`modify`](Self::modify), with `f` also given the number of
    /// documents matching `count`, taken in the same transaction.
    pub async fn modify_with_count<T, R, F>(
        &self,
        collection: Collection,
        id: &str,
        count: &Query,
        f: F,
    ) -> Result<(T, R)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T, i64) -> Result<R>,
    {
        self.modify_in(collection, id, Some(count), f).await
    }

    async fn modify_in<T, R, F>(
        &self,
        collection: Collection,
        id: &str,
        count: Option<&Query>,
        f: F,
    ) -> Result<(T, R)>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T, i64) -> Result<R>,
    {
        let guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let data = select_data(&mut *tx, collection, id)
            .await?
            .ok_or_else(|| Error::not_found(collection, id))?;
        let mut doc: T = decode(collection, id, &data)?;

        let matching = match count {
            Some(query) => count_on(&mut *tx, query).await?,
            None => 0,
        };
        let out = f(&mut doc, matching)?;

        let encoded = encode(collection, id, &doc)?;
        sqlx::query("UPDATE documents SET data = ?, updated_at = ? WHERE collection = ? AND id = ?")
            .bind(encoded.to_string())
            .bind(timestamp(&Utc::now()))
            .bind(collection.name())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        drop(guard);

        self.changes
            .publish(Change {
                collection,
                id: id.to_string(),
                kind: ChangeKind::Updated,
                data: Some(encoded),
            })
            .await;

        Ok((doc, out))
    }

    /// Applies all writes in one transaction, or none of them.
    pub async fn batch(&self, writes: Vec<Write>) -> Result<()> {
        let guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        let now = timestamp(&Utc::now());

        let mut changes = Vec::with_capacity(writes.len());
        for write in writes {
            apply_write(&mut *tx, write, &now, &mut changes).await?;
        }

        tx.commit().await?;
        drop(guard);

        for change in changes {
            self.changes.publish(change).await;
        }
        Ok(())
    }

    /// Subscribes to committed changes in a collection.
    pub async fn watch(&self, collection: Collection) -> Watch {
        self.changes.subscribe(collection).await
    }
}

async fn select_data(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
) -> Result<Option<String>> {
    Ok(
        sqlx::query_scalar("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.name())
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?,
    )
}

async fn count_on(conn: &mut SqliteConnection, query: &Query) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM documents");
    query.push_where(&mut qb);

    Ok(qb.build_query_scalar::<i64>().fetch_one(&mut *conn).await?)
}

async fn apply_write(
    conn: &mut SqliteConnection,
    write: Write,
    now: &str,
    changes: &mut Vec<Change>,
) -> Result<()> {
    match write {
        Write::Insert {
            collection,
            id,
            data,
        } => {
            let created_at = created_at_of(&data).unwrap_or_else(|| now.to_string());
            sqlx::query(
                "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(collection.name())
            .bind(&id)
            .bind(data.to_string())
            .bind(&created_at)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    Error::AlreadyExists {
                        collection,
                        id: id.clone(),
                    }
                }
                other => Error::Database(other),
            })?;

            changes.push(Change {
                collection,
                id,
                kind: ChangeKind::Created,
                data: Some(data),
            });
        }
        Write::Update {
            collection,
            id,
            ops,
            precondition,
            missing_ok,
        } => {
            let data = match select_data(conn, collection, &id).await? {
                Some(data) => data,
                None if missing_ok => return Ok(()),
                None => return Err(Error::not_found(collection, &id)),
            };
            let mut doc: Map<String, Value> = decode(collection, &id, &data)?;

            if let Some((field, expected)) = precondition {
                if doc.get(&field) != Some(&expected) {
                    return Err(Error::PreconditionFailed {
                        collection,
                        id,
                        field,
                    });
                }
            }

            for op in &ops {
                op.apply(&mut doc);
            }

            let doc = Value::Object(doc);
            sqlx::query(
                "UPDATE documents SET data = ?, updated_at = ? WHERE collection = ? AND id = ?",
            )
            .bind(doc.to_string())
            .bind(now)
            .bind(collection.name())
            .bind(&id)
            .execute(&mut *conn)
            .await?;

            changes.push(Change {
                collection,
                id,
                kind: ChangeKind::Updated,
                data: Some(doc),
            });
        }
        Write::Delete { collection, id } => {
            let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                .bind(collection.name())
                .bind(&id)
                .execute(&mut *conn)
                .await?;

            if result.rows_affected() > 0 {
                changes.push(Change {
                    collection,
                    id,
                    kind: ChangeKind::Deleted,
                    data: None,
                });
            }
        }
        Write::DeleteWhere {
            collection,
            field,
            value,
        } => {
            let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM documents WHERE collection = ");
            qb.push_bind(collection.name());
            qb.push(" AND json_extract(data, ");
            qb.push_bind(json_path(&field));
            qb.push(") = ");
            push_value(&mut qb, &value);
            qb.push(" RETURNING id");

            let ids: Vec<String> = qb.build_query_scalar().fetch_all(&mut *conn).await?;
            changes.extend(ids.into_iter().map(|id| Change {
                collection,
                id,
                kind: ChangeKind::Deleted,
                data: None,
            }));
        }
        Write::Absent { query, conflict } => {
            if count_on(conn, &query).await? > 0 {
                return Err(Error::Conflict(conflict));
            }
        }
    }
    Ok(())
}

/// The document's own `createdAt`, normalised to the stored timestamp format.
fn created_at_of(data: &Value) -> Option<String> {
    let raw = data.get("createdAt")?.as_str()?;
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(timestamp(&parsed.with_timezone(&Utc)))
}

fn decode<T: DeserializeOwned>(collection: Collection, id: &str, data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|source| Error::Corrupt {
        collection,
        id: id.to_string(),
        source,
    })
}

fn encode<T: Serialize>(collection: Collection, id: &str, doc: &T) -> Result<Value> {
    serde_json::to_value(doc).map_err(|source| Error::Corrupt {
        collection,
        id: id.to_string(),
        source,
    })
}
