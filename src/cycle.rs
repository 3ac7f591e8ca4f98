use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::broker::Broker;
use crate::sizer::PercentOfEquitySizer;
use crate::submitter::OrderSubmitter;
use crate::trade_log::TradeLog;
use crate::types::{Candidate, OrderResult, OrderStatus};
use crate::watchlist::{WatchlistError, WatchlistSource};

/// One sequential pass over the watchlist: refresh account state, size,
/// submit, append the audit row, then move to the next candidate. No
/// candidate starts before the previous one's log append has completed.
pub struct BuyCycle {
    watchlist: Box<dyn WatchlistSource>,
    broker: Arc<dyn Broker>,
    sizer: PercentOfEquitySizer,
    submitter: OrderSubmitter,
    trade_log: Arc<dyn TradeLog>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub errors: usize,
    pub logged: usize,
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Watchlist(#[from] WatchlistError),
}

impl BuyCycle {
    pub fn new(
        watchlist: Box<dyn WatchlistSource>,
        broker: Arc<dyn Broker>,
        sizer: PercentOfEquitySizer,
        submitter: OrderSubmitter,
        trade_log: Arc<dyn TradeLog>,
    ) -> Self {
        Self {
            watchlist,
            broker,
            sizer,
            submitter,
            trade_log,
        }
    }

    pub async fn run(&self) -> Result<RunSummary, CycleError> {
        let candidates = self.watchlist.list_candidates().await?;
        if candidates.is_empty() {
            info!(
                "Watchlist `{}` has no candidates, nothing to buy",
                self.watchlist.name()
            );
            return Ok(RunSummary::default());
        }
        info!(
            "Processing {} candidates from `{}` via broker `{}`",
            candidates.len(),
            self.watchlist.name(),
            self.broker.name()
        );

        let mut summary = RunSummary {
            candidates: candidates.len(),
            ..Default::default()
        };
        for candidate in &candidates {
            // Refresh before every candidate so a shrinking account is never
            // sized against a stale snapshot
            let result = match self.broker.account_state().await {
                Ok(account) => {
                    let decision = self.sizer.size(candidate, &account);
                    self.submitter.submit(&decision).await
                }
                Err(err) => {
                    error!(
                        "Failed to refresh account state for {}: {err}",
                        candidate.symbol
                    );
                    account_failure(candidate, err.to_string())
                }
            };
            match result.status {
                OrderStatus::Accepted => summary.accepted += 1,
                OrderStatus::Rejected => summary.rejected += 1,
                OrderStatus::Skipped => summary.skipped += 1,
                OrderStatus::Error => summary.errors += 1,
            }
            match self.trade_log.append(&result).await {
                Ok(()) => summary.logged += 1,
                // Best effort: a placed order stands even when its row could
                // not be written, so a human can reconcile manually
                Err(err) => warn!("Failed to append log row for {}: {err}", result.symbol),
            }
        }
        Ok(summary)
    }
}

fn account_failure(candidate: &Candidate, detail: String) -> OrderResult {
    OrderResult {
        symbol: candidate.symbol.clone(),
        requested_notional: Decimal::ZERO,
        quantity: None,
        order_id: None,
        status: OrderStatus::Error,
        detail: Some(detail),
        timestamp: Utc::now(),
    }
}
