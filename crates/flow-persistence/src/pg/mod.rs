//! Postgres (Diesel) implementation of [`flow_core::store::DurableStore`].
//!
//! Backs the three document-store collections from `schema.rs`: `flows`,
//! `blocks`, `execution_logs`. Connection pooling goes through r2d2 behind
//! the [`ConnectionProvider`] trait so unit tests can swap in a fake
//! provider without a live database.

use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use flow_core::errors::EngineError;
use flow_core::log::ExecutionLogEntry;
use flow_core::store::DurableStore;
use flow_domain::{BlockDefinition, Flow};
use tracing::warn;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::models::{new_execution_log_row, new_flow_row, BlockRow, ExecutionLogRow, FlowRow, NewBlockRow};
use crate::schema::{blocks, execution_logs, flows};

pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Abstracts "get me a connection" so `PgStore` can be exercised with a fake
/// provider in unit tests without a live database.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool.get().map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Best-effort classification of whether retrying the same unit of work is
/// worth it; mirrors `EngineError::is_retryable` for the transport layer.
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
                || m.contains("could not serialize access due to concurrent update")
                || m.contains("terminating connection due to administrator command")
                || m.contains("connection closed")
                || m.contains("connection refused")
                || m.contains("timeout")
        }
        _ => false,
    }
}

fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
where
    F: FnMut() -> Result<T, PersistenceError>,
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!(attempt = attempts + 1, error = ?e, delay_ms, "retrying persistence operation");
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Document-store backed `DurableStore`. `flow-core` only ever reaches this
/// through the trait object; nothing upstream of `flow-persistence` knows
/// it's Diesel.
pub struct PgStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn upsert_flow(&self, flow: &Flow) -> Result<(), PersistenceError> {
        let document = serde_json::to_value(flow).map_err(|e| PersistenceError::Unknown(format!("serialize flow: {e}")))?;
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(flows::table)
                .values(new_flow_row(flow, &document))
                .on_conflict(flows::id)
                .do_update()
                .set((
                    flows::slug.eq(&flow.slug),
                    flows::version.eq(flow.version),
                    flows::status.eq(new_flow_row(flow, &document).status),
                    flows::document.eq(&document),
                    flows::published_at.eq(flow.published_at),
                ))
                .execute(&mut conn)?;
            Ok(())
        })
    }

    pub fn upsert_block(&self, block: &BlockDefinition) -> Result<(), PersistenceError> {
        let document = serde_json::to_value(block).map_err(|e| PersistenceError::Unknown(format!("serialize block: {e}")))?;
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(blocks::table)
                .values(NewBlockRow { id: &block.id, document: &document })
                .on_conflict(blocks::id)
                .do_update()
                .set(blocks::document.eq(&document))
                .execute(&mut conn)?;
            Ok(())
        })
    }
}

#[async_trait::async_trait]
impl<P: ConnectionProvider> DurableStore for PgStore<P> {
    async fn find_flow_by_slug(&self, slug: &str) -> Result<Option<Flow>, EngineError> {
        let slug = slug.to_string();
        let row: Option<FlowRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            flows::table.filter(flows::slug.eq(&slug)).order(flows::version.desc()).first(&mut conn).optional().map_err(PersistenceError::from)
        })
        .map_err(|e| EngineError::Internal(e.to_string()))?;

        match row {
            Some(row) => row.into_domain().map(Some).map_err(|e| EngineError::Internal(e.to_string())),
            None => Ok(None),
        }
    }

    async fn find_block(&self, id: Uuid) -> Result<Option<BlockDefinition>, EngineError> {
        let row: Option<BlockRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            blocks::table.find(id).first(&mut conn).optional().map_err(PersistenceError::from)
        })
        .map_err(|e| EngineError::Internal(e.to_string()))?;

        match row {
            Some(row) => row.into_domain().map(Some).map_err(|e| EngineError::Internal(e.to_string())),
            None => Ok(None),
        }
    }

    async fn insert_execution_log(&self, entry: ExecutionLogEntry) -> Result<(), EngineError> {
        let document = serde_json::to_value(&entry).map_err(|e| EngineError::Internal(format!("serialize execution log: {e}")))?;
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(execution_logs::table).values(new_execution_log_row(&entry, &document)).execute(&mut conn)?;
            Ok(())
        })
        .map_err(|e| EngineError::Internal(e.to_string()))
    }

    async fn recent_logs(&self, slug: &str, limit: i64) -> Result<Vec<ExecutionLogEntry>, EngineError> {
        let slug = slug.to_string();
        let rows: Vec<ExecutionLogRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            execution_logs::table
                .filter(execution_logs::flow_slug.eq(&slug))
                .order(execution_logs::created_at.desc())
                .limit(limit)
                .load(&mut conn)
                .map_err(PersistenceError::from)
        })
        .map_err(|e| EngineError::Internal(e.to_string()))?;

        rows.into_iter().map(|r| r.into_domain().map_err(|e| EngineError::Internal(e.to_string()))).collect()
    }
}

/// Builds a migrated r2d2 pool, adjusting `min_size`/`max_size` if
/// inconsistent and running pending migrations on the first checkout.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!(min_size = validated_min, max_size = validated_max, "pool min_size > max_size, clamping min to max");
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .min_idle(Some(final_min))
        .max_size(validated_max)
        .build(manager)
        .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;

    let mut conn = pool.get().map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
    run_pending_migrations(&mut conn)?;
    Ok(pool)
}

/// Loads `.env`, reads `DbConfig` and builds an already-migrated pool.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env();
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
