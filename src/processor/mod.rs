//! Transaction processing
//!
//! Validation and idempotent persistence of inbound creation requests.
//! Both the broker consumer and the HTTP creation endpoint go through here.

mod command;
mod error;
mod transaction_processor;

pub use command::CreateTransactionCommand;
pub(crate) use command::normalize_id;
pub use error::ProcessError;
pub use transaction_processor::TransactionProcessor;
