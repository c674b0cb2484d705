//! Database module
//!
//! Connection, connectivity check and schema bootstrap.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Open a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Statements executed in order by [`ensure_schema`]; all idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id               TEXT PRIMARY KEY,
        user_id          TEXT NOT NULL,
        transaction_type TEXT NOT NULL CHECK (transaction_type IN ('bet', 'win')),
        amount           BIGINT NOT NULL CHECK (amount > 0),
        timestamp        TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_transactions_user_timestamp
        ON transactions (user_id, timestamp DESC)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_transactions_type_timestamp
        ON transactions (transaction_type, timestamp DESC)
    "#,
];

/// Create the transactions table and its indexes if missing
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database schema ensured");
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_name = $1
        )
        "#,
    )
    .bind("transactions")
    .fetch_one(pool)
    .await?;

    if !exists {
        tracing::error!("Required table 'transactions' does not exist");
    }

    Ok(exists)
}
