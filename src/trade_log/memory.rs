use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{TradeLog, TradeLogError};
use crate::types::OrderResult;

/// Recording trade log for tests.
pub struct MemoryTradeLog {
    name: String,
    fail_appends: bool,
    rows: Mutex<Vec<OrderResult>>,
}

impl MemoryTradeLog {
    pub fn new(name: String) -> Self {
        Self {
            name,
            fail_appends: false,
            rows: Default::default(),
        }
    }

    /// A log whose every append fails, for exercising the warn-and-continue
    /// path.
    pub fn failing(name: String) -> Self {
        Self {
            fail_appends: true,
            ..Self::new(name)
        }
    }

    pub async fn rows(&self) -> Vec<OrderResult> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl TradeLog for MemoryTradeLog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ensure_ready(&self) -> Result<(), TradeLogError> {
        Ok(())
    }

    async fn append(&self, result: &OrderResult) -> Result<(), TradeLogError> {
        if self.fail_appends {
            return Err(TradeLogError::Append("log tab unreachable".to_string()));
        }
        self.rows.lock().await.push(result.clone());
        Ok(())
    }
}
