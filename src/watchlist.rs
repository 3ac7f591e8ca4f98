use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Candidate;

pub mod csv_watchlist;
pub mod sheet_watchlist;

const TICKER_HEADER: &str = "Ticker";
const SCORE_HEADER: &str = "Score";

#[async_trait]
pub trait WatchlistSource: Send + Sync {
    fn name(&self) -> &str;
    /// The ordered candidate sequence for this run. An empty watchlist is a
    /// valid zero-trade run, not an error.
    async fn list_candidates(&self) -> Result<Vec<Candidate>, WatchlistError>;
}

#[derive(Debug, Error)]
pub enum WatchlistError {
    /// Fatal: aborts the run before any orders
    #[error("Watchlist source unavailable: {0}")]
    SourceUnavailable(String),
}

/// Turn raw screener rows into candidates. The first row is a header; the
/// ticker column is the one titled `Ticker`, falling back to the first column
/// when absent. Values are trimmed and uppercased, blanks are dropped, and
/// duplicates are removed preserving first-occurrence order. A `Score` column,
/// when present, populates the candidate's score.
pub fn extract_candidates(values: &[Vec<String>]) -> Vec<Candidate> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    let ticker_idx = header
        .iter()
        .position(|cell| cell.trim() == TICKER_HEADER)
        .unwrap_or(0);
    let score_idx = header.iter().position(|cell| cell.trim() == SCORE_HEADER);

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for row in rows {
        let Some(cell) = row.get(ticker_idx) else {
            continue;
        };
        let symbol = cell.trim().to_uppercase();
        if symbol.is_empty() || !seen.insert(symbol.clone()) {
            continue;
        }
        let score = score_idx
            .and_then(|idx| row.get(idx))
            .and_then(|cell| Decimal::from_str(cell.trim()).ok());
        candidates.push(Candidate { symbol, score });
    }
    candidates
}
