use std::io::Write;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sheet_trader::broker::{Broker, BrokerError};
use sheet_trader::types::{AccountState, OrderAck, OrderRequest};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

/// Write a screener CSV with a `Ticker,Score` header and the given data rows.
pub fn screener_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Ticker,Score").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

pub fn account(equity: i64) -> AccountState {
    AccountState {
        equity: Decimal::from(equity),
        buying_power: Decimal::from(equity),
    }
}

/// Broker fake with per-symbol scripted failures; everything else is
/// accepted and recorded.
pub struct ScriptedBroker {
    account: AccountState,
    rejects: Vec<String>,
    transport_fails: Vec<String>,
    account_fails: bool,
    orders: Mutex<Vec<OrderRequest>>,
}

impl ScriptedBroker {
    pub fn new(account: AccountState) -> Self {
        Self {
            account,
            rejects: Vec::new(),
            transport_fails: Vec::new(),
            account_fails: false,
            orders: Default::default(),
        }
    }

    pub fn rejecting(mut self, symbol: &str) -> Self {
        self.rejects.push(symbol.to_string());
        self
    }

    pub fn failing_transport(mut self, symbol: &str) -> Self {
        self.transport_fails.push(symbol.to_string());
        self
    }

    pub fn failing_account(mut self) -> Self {
        self.account_fails = true;
        self
    }

    pub async fn placed_orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().await.clone()
    }
}

#[async_trait]
impl Broker for ScriptedBroker {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn account_state(&self) -> Result<AccountState, BrokerError> {
        if self.account_fails {
            return Err(BrokerError::Transport("connection reset".to_string()));
        }
        Ok(self.account)
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        if self.rejects.contains(&order.symbol) {
            return Err(BrokerError::Rejected("not tradable".to_string()));
        }
        if self.transport_fails.contains(&order.symbol) {
            return Err(BrokerError::Transport("connection reset".to_string()));
        }
        let mut orders = self.orders.lock().await;
        orders.push(order.clone());
        Ok(OrderAck {
            order_id: format!("scripted-{}", orders.len()),
            status: "accepted".to_string(),
            qty: None,
        })
    }
}
