use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{extract_candidates, WatchlistError, WatchlistSource};
use crate::sheets::SheetsClient;
use crate::types::Candidate;

/// Candidates from the configured screener tab of the Google Sheet.
pub struct SheetWatchlist {
    name: String,
    sheets: Arc<SheetsClient>,
    spreadsheet_id: String,
    tab: String,
}

impl SheetWatchlist {
    pub fn new(name: String, sheets: Arc<SheetsClient>, spreadsheet_id: String, tab: String) -> Self {
        Self {
            name,
            sheets,
            spreadsheet_id,
            tab,
        }
    }
}

#[async_trait]
impl WatchlistSource for SheetWatchlist {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, WatchlistError> {
        let values = self
            .sheets
            .read_tab(&self.spreadsheet_id, &self.tab)
            .await
            .map_err(|err| WatchlistError::SourceUnavailable(err.to_string()))?;
        let candidates = extract_candidates(&values);
        debug!(
            "Screener tab `{}` yielded {} candidates from {} rows",
            self.tab,
            candidates.len(),
            values.len()
        );
        Ok(candidates)
    }
}
