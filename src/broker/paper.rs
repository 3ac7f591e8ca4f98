use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use super::{Broker, BrokerError};
use crate::types::{AccountState, OrderAck, OrderRequest};

/// In-process broker that accepts every order and records it. Backs `DRY_RUN`
/// runs and tests.
pub struct PaperBroker {
    name: String,
    account: AccountState,
    orders: Mutex<Vec<OrderRequest>>,
    next_id: AtomicU64,
}

impl PaperBroker {
    pub fn new(name: String, account: AccountState) -> Self {
        Self {
            name,
            account,
            orders: Default::default(),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn placed_orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().await.clone()
    }
}

#[async_trait]
impl Broker for PaperBroker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn account_state(&self) -> Result<AccountState, BrokerError> {
        Ok(self.account)
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.orders.lock().await.push(order.clone());
        info!(
            "Paper broker `{}` accepted buy {} for ${}",
            self.name, order.symbol, order.notional
        );
        Ok(OrderAck {
            order_id: format!("paper-{id}"),
            status: "accepted".to_string(),
            qty: None,
        })
    }
}
