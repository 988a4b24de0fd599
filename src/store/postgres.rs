use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use sqlx::{types::Json, PgPool};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::{Batch, KeyValueStore};
use crate::error::{EngineError, Result};

type OwnedBatch = Vec<(String, Option<Value>)>;

const UPSERT_SQL: &str = "INSERT INTO kv_store (key, value) VALUES ($1, $2)
     ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()";
const DELETE_SQL: &str = "DELETE FROM kv_store WHERE key = $1";

/// One row change of a batch, in the order it is executed.
#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Upsert { key: String, value: Value },
    Delete { key: String },
}

fn statements(batch: OwnedBatch) -> Vec<Statement> {
    batch
        .into_iter()
        .map(|(key, value)| match value {
            Some(value) => Statement::Upsert { key, value },
            None => Statement::Delete { key },
        })
        .collect()
}

/// Postgres-backed store with a synchronous face.
///
/// All rows are loaded once at startup; reads are served from memory and
/// every applied batch updates memory first and is then persisted by a
/// background task, one transaction per batch, in submission order.
///
/// The first failed transaction stops the writer. From then on every
/// `apply` is refused with `EngineError::Store`, since memory already holds
/// changes the database does not.
pub struct PgStore {
    cache: BTreeMap<String, Value>,
    writer: UnboundedSender<OwnedBatch>,
    failure: Arc<OnceLock<String>>,
}

impl PgStore {
    pub async fn connect(pool: PgPool) -> Result<(Self, JoinHandle<()>)> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&pool)
        .await
        .map_err(store_error)?;

        let rows: Vec<(String, Json<Value>)> = sqlx::query_as("SELECT key, value FROM kv_store")
            .fetch_all(&pool)
            .await
            .map_err(store_error)?;
        tracing::info!("🗄️ Loaded {} stored keys", rows.len());

        let cache = rows.into_iter().map(|(key, Json(value))| (key, value)).collect();
        let (store, rx) = Self::with_cache(cache);
        let failure = store.failure.clone();
        let handle = tokio::spawn(persist_batches(rx, failure, move |batch| {
            let pool = pool.clone();
            async move { write_batch(&pool, batch).await }
        }));

        Ok((store, handle))
    }

    fn with_cache(cache: BTreeMap<String, Value>) -> (Self, UnboundedReceiver<OwnedBatch>) {
        let (writer, rx) = mpsc::unbounded_channel();
        let store = Self {
            cache,
            writer,
            failure: Arc::new(OnceLock::new()),
        };
        (store, rx)
    }
}

impl KeyValueStore for PgStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.cache.get(key).cloned())
    }

    fn apply(&mut self, batch: Batch) -> Result<()> {
        if let Some(reason) = self.failure.get() {
            return Err(EngineError::Store(format!(
                "an earlier write was not persisted: {reason}"
            )));
        }
        let owned: OwnedBatch = batch
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        self.writer
            .send(owned.clone())
            .map_err(|_| EngineError::Store("database writer has stopped".into()))?;
        for (key, value) in owned {
            match value {
                Some(value) => {
                    self.cache.insert(key, value);
                }
                None => {
                    self.cache.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// Drains queued batches through `write` until the channel closes or a
/// write fails. Batches queued behind a failed one are dropped.
async fn persist_batches<F, Fut>(
    mut rx: UnboundedReceiver<OwnedBatch>,
    failure: Arc<OnceLock<String>>,
    mut write: F,
) where
    F: FnMut(Vec<Statement>) -> Fut,
    Fut: Future<Output = std::result::Result<(), sqlx::Error>>,
{
    while let Some(batch) = rx.recv().await {
        let keys: Vec<String> = batch.iter().map(|(key, _)| key.clone()).collect();
        if let Err(e) = write(statements(batch)).await {
            if let Some(db_err) = e.as_database_error() {
                tracing::error!("❌ DB write failed for {:?}: {}", keys, db_err.message());
                if let Some(code) = db_err.code() {
                    tracing::info!("ℹ️ SQLSTATE code: {}", code);
                }
            } else {
                tracing::error!("❌ Unknown DB error for {:?}: {}", keys, e);
            }
            let _ = failure.set(e.to_string());
            rx.close();
            let dropped = std::iter::from_fn(|| rx.try_recv().ok()).count();
            tracing::error!("🛑 Store writer stopped, {} queued batches dropped", dropped);
            return;
        }
    }
    tracing::info!("🛑 Store writer stopped");
}

async fn write_batch(pool: &PgPool, batch: Vec<Statement>) -> std::result::Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in batch {
        match statement {
            Statement::Upsert { key, value } => {
                sqlx::query(UPSERT_SQL)
                    .bind(key)
                    .bind(Json(value))
                    .execute(&mut *tx)
                    .await?;
            }
            Statement::Delete { key } => {
                sqlx::query(DELETE_SQL).bind(key).execute(&mut *tx).await?;
            }
        }
    }
    tx.commit().await
}

fn store_error(e: sqlx::Error) -> EngineError {
    tracing::error!("❌ DB error: {:?}", e);
    EngineError::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{keys, CycleStore, CycleWrite};
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_batch_becomes_ordered_statements() {
        let batch = vec![
            (keys::USER_DATA.to_string(), None),
            (keys::FLOW_DATA.to_string(), Some(json!({ "2025-01-15": 3 }))),
        ];
        assert_eq!(
            statements(batch),
            vec![
                Statement::Delete {
                    key: "userData".into()
                },
                Statement::Upsert {
                    key: "flowData".into(),
                    value: json!({ "2025-01-15": 3 })
                },
            ]
        );
    }

    #[test]
    fn test_reset_deletes_every_key_before_upserts() {
        let (mut store, mut rx) = PgStore::with_cache(BTreeMap::new());
        store
            .commit(CycleWrite {
                reset: true,
                onboarding_complete: Some(true),
                ..Default::default()
            })
            .unwrap();

        let queued = statements(rx.try_recv().unwrap());
        assert_eq!(queued.len(), keys::ALL.len() + 1);
        assert!(queued[..keys::ALL.len()]
            .iter()
            .all(|s| matches!(s, Statement::Delete { .. })));
        assert_eq!(
            queued.last(),
            Some(&Statement::Upsert {
                key: "onboardingComplete".into(),
                value: json!(true)
            })
        );
        assert_eq!(store.get(keys::ONBOARDING_COMPLETE).unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_apply_refused_after_failed_write() {
        let (mut store, mut rx) = PgStore::with_cache(BTreeMap::new());
        store.failure.set("connection reset".into()).unwrap();

        let err = store
            .apply(vec![(keys::CUSTOM_SYMPTOMS, Some(json!(["Acne"])))])
            .unwrap_err();
        assert!(matches!(err, EngineError::Store(ref msg) if msg.contains("connection reset")));
        assert!(rx.try_recv().is_err());
        assert_eq!(store.get(keys::CUSTOM_SYMPTOMS).unwrap(), None);
    }

    #[test]
    fn test_apply_refused_when_writer_gone() {
        let (mut store, rx) = PgStore::with_cache(BTreeMap::new());
        drop(rx);
        let err = store.apply(vec![(keys::CUSTOM_SYMPTOMS, None)]).unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
    }

    #[tokio::test]
    async fn test_failed_write_stops_writer_and_surfaces_on_next_apply() {
        let (mut store, rx) = PgStore::with_cache(BTreeMap::new());
        let written = Arc::new(Mutex::new(Vec::new()));

        let log = written.clone();
        let mut calls = 0;
        let writer = tokio::spawn(persist_batches(rx, store.failure.clone(), move |batch| {
            calls += 1;
            let result = if calls == 2 {
                Err(sqlx::Error::PoolClosed)
            } else {
                log.lock().unwrap().push(batch);
                Ok(())
            };
            async move { result }
        }));

        store.apply(vec![(keys::USER_DATA, Some(json!({ "name": "Lea" })))]).unwrap();
        store.apply(vec![(keys::FLOW_DATA, Some(json!({})))]).unwrap();
        store.apply(vec![(keys::CUSTOM_SYMPTOMS, Some(json!([])))]).unwrap();
        writer.await.unwrap();

        assert_eq!(written.lock().unwrap().len(), 1);
        assert!(store.failure.get().is_some());
        let err = store.apply(vec![(keys::DAILY_LOGS, None)]).unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
    }
}
