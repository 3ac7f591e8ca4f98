use async_trait::async_trait;
use thiserror::Error;

use crate::types::OrderResult;

pub mod memory;
pub mod sheet_log;

/// Durable audit trail: exactly one row per candidate, appended synchronously
/// in processing order.
#[async_trait]
pub trait TradeLog: Send + Sync {
    fn name(&self) -> &str;
    /// Called once at startup, before any candidate is processed.
    async fn ensure_ready(&self) -> Result<(), TradeLogError>;
    async fn append(&self, result: &OrderResult) -> Result<(), TradeLogError>;
}

#[derive(Debug, Error)]
pub enum TradeLogError {
    /// Fatal: happens before any order side effects
    #[error("Failed to prepare the trade log: {0}")]
    Setup(String),
    /// Non-fatal: reported as a warning, never reverses a placed order
    #[error("Failed to append a trade log row: {0}")]
    Append(String),
}
