//! Postgres Transaction Store
//!
//! sqlx-backed implementation of [`TransactionStore`]. The primary key on
//! `transactions.id` is the authoritative idempotency guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Amount, Transaction, TransactionFilter, TransactionType};

use super::{StoreError, TransactionStore};

type TransactionRow = (String, String, String, i64, DateTime<Utc>);

/// Transaction store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    /// Create a new store with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_transaction(row: TransactionRow) -> Result<Transaction, StoreError> {
        let (id, user_id, transaction_type, amount, timestamp) = row;

        let transaction_type: TransactionType = transaction_type
            .parse()
            .map_err(|e: crate::domain::DomainError| StoreError::Fatal(e.to_string()))?;
        let amount = Amount::from_i64(amount)
            .map_err(|e| StoreError::Fatal(format!("corrupt amount for {}: {}", id, e)))?;

        Ok(Transaction {
            id,
            user_id,
            transaction_type,
            amount,
            timestamp,
        })
    }

    fn rows_to_transactions(rows: Vec<TransactionRow>) -> Result<Vec<Transaction>, StoreError> {
        rows.into_iter().map(Self::row_to_transaction).collect()
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn save(&self, transaction: &Transaction) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, transaction_type, amount, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.user_id)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.amount.as_i64())
        .bind(transaction.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        let row: Option<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, transaction_type, amount, timestamp
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_transaction).transpose()
    }

    async fn get_by_user(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, transaction_type, amount, timestamp
            FROM transactions
            WHERE user_id = $1
              AND ($2::TEXT IS NULL OR transaction_type = $2)
            ORDER BY timestamp DESC, id COLLATE "C" ASC
            "#,
        )
        .bind(user_id)
        .bind(filter.transaction_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_transactions(rows)
    }

    async fn get_all(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, StoreError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, transaction_type, amount, timestamp
            FROM transactions
            WHERE ($1::TEXT IS NULL OR transaction_type = $1)
            ORDER BY timestamp DESC, id COLLATE "C" ASC
            "#,
        )
        .bind(filter.transaction_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Self::rows_to_transactions(rows)
    }
}
