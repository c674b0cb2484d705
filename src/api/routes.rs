//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::domain::{Transaction, TransactionFilter, TransactionType};
use crate::error::AppError;
use crate::logging::AsyncLogger;
use crate::processor::{CreateTransactionCommand, TransactionProcessor};
use crate::query::QueryService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub processor: TransactionProcessor,
    pub queries: QueryService,
    pub logger: AsyncLogger,
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub user_id: String,
    pub transaction_type: String,
    pub amount: u64,
}

impl From<CreateTransactionRequest> for CreateTransactionCommand {
    fn from(request: CreateTransactionRequest) -> Self {
        let command = CreateTransactionCommand::new(
            request.user_id,
            request.transaction_type,
            request.amount,
        );
        match request.id {
            Some(id) => command.with_id(id),
            None => command,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default)]
    pub transaction_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserTransactionsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionResponse {
    pub id: String,
    pub user_id: String,
    pub transaction_type: String,
    pub amount: u64,
    /// RFC 3339, second precision
    pub timestamp: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            transaction_type: tx.transaction_type.to_string(),
            amount: tx.amount.value(),
            timestamp: tx.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionResponse>,
}

impl From<Vec<Transaction>> for TransactionsResponse {
    fn from(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: transactions.into_iter().map(Into::into).collect(),
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/user", get(list_user_transactions))
}

/// Empty or missing type means no filter
fn parse_filter(transaction_type: Option<&str>) -> Result<TransactionFilter, AppError> {
    match transaction_type.map(str::trim).filter(|t| !t.is_empty()) {
        None => Ok(TransactionFilter::all()),
        Some(raw) => Ok(TransactionFilter::of_type(raw.parse::<TransactionType>()?)),
    }
}

// =========================================================================
// GET /transactions
// =========================================================================

async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let filter = parse_filter(query.transaction_type.as_deref())?;

    let transactions = match state.queries.list_all(&filter).await {
        Ok(transactions) => transactions,
        Err(e) => {
            state
                .logger
                .error("Failed to list transactions", vec![("error", e.to_string())])
                .await;
            return Err(e.into());
        }
    };

    Ok(Json(transactions.into()))
}

// =========================================================================
// GET /transactions/user
// =========================================================================

async fn list_user_transactions(
    State(state): State<AppState>,
    Query(query): Query<UserTransactionsQuery>,
) -> Result<Json<TransactionsResponse>, AppError> {
    let user_id = match query.user_id.as_deref().map(str::trim) {
        Some(user_id) if !user_id.is_empty() => user_id.to_string(),
        _ => {
            state.logger.error("user_id is required", vec![]).await;
            return Err(AppError::InvalidRequest("user_id is required".to_string()));
        }
    };
    let filter = parse_filter(query.transaction_type.as_deref())?;

    let transactions = match state.queries.list_for_user(&user_id, &filter).await {
        Ok(transactions) => transactions,
        Err(e) => {
            state
                .logger
                .error(
                    "Failed to list user transactions",
                    vec![("user_id", user_id), ("error", e.to_string())],
                )
                .await;
            return Err(e.into());
        }
    };

    Ok(Json(transactions.into()))
}

// =========================================================================
// POST /transactions
// =========================================================================

async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let transaction = state.processor.process(request.into()).await?;

    state
        .logger
        .info(
            "Transaction created",
            vec![
                ("id", transaction.id.clone()),
                ("user_id", transaction.user_id.clone()),
                ("transaction_type", transaction.transaction_type.to_string()),
            ],
        )
        .await;

    Ok((StatusCode::CREATED, Json(transaction.into())))
}
