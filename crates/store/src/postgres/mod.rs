//! PostgreSQL implementation of the store traits.
//!
//! [`PgStore`] wraps a [`PgPool`]; every trait method is a single runtime
//! `sqlx` query. Unique-key races are resolved by the database: alarms rely
//! on `work_order_alarms_work_order_id_key`, notifications on
//! `notifications_work_order_alarm_key` with `ON CONFLICT DO NOTHING`.

mod alarm;
mod lookup;
mod notification;
mod rows;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info};

use deadline_core::config::PostgresConfig;

use crate::error::StoreError;

const ALARM_WORK_ORDER_KEY: &str = "work_order_alarms_work_order_id_key";
const NOTIFICATION_ALARM_KEY: &str = "notifications_work_order_alarm_key";

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using the given config and apply pending migrations.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url())
            .await?;
        info!(host = %config.host, db = %config.database, "PostgreSQL connected");

        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Database migrations applied successfully");

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a unique violation (SQLSTATE 23505) on `constraint` to
/// [`StoreError::Duplicate`]; anything else stays a database error.
fn map_unique_violation(
    e: sqlx::Error,
    constraint: &str,
    entity: &'static str,
    key: impl ToString,
) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint) {
            return StoreError::duplicate(entity, key);
        }
    }
    error!(entity, "store database error: {}", e);
    StoreError::Database(e)
}
