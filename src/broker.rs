use async_trait::async_trait;
use thiserror::Error;

use crate::types::{AccountState, OrderAck, OrderRequest};

pub mod alpaca;
pub mod paper;

/// Narrow brokerage capability surface, so the sizing and submission logic
/// can run against a substitutable fake with no network dependency.
#[async_trait]
pub trait Broker: Send + Sync {
    fn name(&self) -> &str;
    async fn account_state(&self) -> Result<AccountState, BrokerError>;
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError>;
}

#[derive(Debug, Error)]
pub enum BrokerError {
    /// The brokerage understood and refused the order (not tradable,
    /// insufficient buying power, ...). Recoverable at the run level.
    #[error("Order rejected: {0}")]
    Rejected(String),
    #[error("Brokerage authentication failed: {0}")]
    Auth(String),
    #[error("Brokerage API error ({0}): {1}")]
    Api(u16, String),
    #[error("Brokerage transport failure: {0}")]
    Transport(String),
}
