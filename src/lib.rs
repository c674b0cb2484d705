//! Casino transaction service library
//!
//! Re-exports modules for the server binary, integration testing and
//! external use.

pub mod api;
pub mod config;
pub mod consumer;
pub mod db;
pub mod domain;
mod error;
pub mod logging;
pub mod processor;
pub mod query;
pub mod store;

pub use config::{Config, StorageBackend};
pub use domain::{Amount, AmountError, DomainError, Transaction, TransactionFilter, TransactionType};
pub use error::{AppError, ErrorResponse};
