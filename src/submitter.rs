use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::broker::{Broker, BrokerError};
use crate::types::{
    format_usd, OrderAck, OrderRequest, OrderResult, OrderStatus, SizeAction, SizingDecision,
};

/// Turns sizing decisions into brokerage orders. Owns extended-hours
/// eligibility, client-order-id generation, and the post-attempt rate-limit
/// pause; skip decisions never touch the broker and never pause.
pub struct OrderSubmitter {
    broker: Arc<dyn Broker>,
    extended_hours: bool,
    pause: Duration,
}

impl OrderSubmitter {
    pub fn new(broker: Arc<dyn Broker>, extended_hours: bool, pause: Duration) -> Self {
        Self {
            broker,
            extended_hours,
            pause,
        }
    }

    pub async fn submit(&self, decision: &SizingDecision) -> OrderResult {
        match decision.action {
            SizeAction::SkipNoCandidate => {
                warn!("Skipping candidate with no tradable symbol");
                skipped(decision, "No tradable symbol".to_string())
            }
            SizeAction::SkipBelowMinNotional => {
                let detail = format!(
                    "Notional {} below the minimum order size",
                    format_usd(decision.notional)
                );
                warn!("{} {detail}", decision.symbol);
                skipped(decision, detail)
            }
            SizeAction::Submit => {
                let order = self.build_request(decision);
                let result = match self.broker.place_order(&order).await {
                    Ok(ack) => {
                        info!(
                            "Submitted BUY {} ${} (order {}, status {})",
                            order.symbol,
                            format_usd(order.notional),
                            ack.order_id,
                            ack.status
                        );
                        accepted(decision, ack)
                    }
                    Err(BrokerError::Rejected(message)) => {
                        warn!("{} rejected by the brokerage: {message}", order.symbol);
                        outcome(decision, OrderStatus::Rejected, message)
                    }
                    Err(err) => {
                        // Transport/auth/API failures stay contained to this
                        // candidate; the run moves on and the row records it
                        error!("Failed to submit BUY {}: {err}", order.symbol);
                        outcome(decision, OrderStatus::Error, err.to_string())
                    }
                };
                // Rate-limit pause after every attempt, whatever the outcome
                if !self.pause.is_zero() {
                    tokio::time::sleep(self.pause).await;
                }
                result
            }
        }
    }

    fn build_request(&self, decision: &SizingDecision) -> OrderRequest {
        // Idempotent id: a retried run will not silently double-buy
        let client_order_id = format!(
            "buy-{}-{}",
            decision.symbol,
            Utc::now().timestamp_millis()
        );
        OrderRequest {
            symbol: decision.symbol.clone(),
            notional: decision.notional.round_dp(2),
            extended_hours: self.extended_hours,
            client_order_id,
        }
    }
}

fn skipped(decision: &SizingDecision, detail: String) -> OrderResult {
    outcome(decision, OrderStatus::Skipped, detail)
}

fn accepted(decision: &SizingDecision, ack: OrderAck) -> OrderResult {
    OrderResult {
        symbol: decision.symbol.clone(),
        requested_notional: decision.notional,
        quantity: ack.qty,
        order_id: Some(ack.order_id),
        status: OrderStatus::Accepted,
        detail: None,
        timestamp: Utc::now(),
    }
}

fn outcome(decision: &SizingDecision, status: OrderStatus, detail: String) -> OrderResult {
    OrderResult {
        symbol: decision.symbol.clone(),
        requested_notional: decision.notional,
        quantity: None,
        order_id: None,
        status,
        detail: Some(detail),
        timestamp: Utc::now(),
    }
}
