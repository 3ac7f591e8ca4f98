use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{TradeLog, TradeLogError};
use crate::sheets::SheetsClient;
use crate::types::{OrderResult, LOG_HEADERS, LOG_TABLE_RANGE};

/// Audit log backed by the configured log tab of the Google Sheet.
pub struct SheetTradeLog {
    name: String,
    sheets: Arc<SheetsClient>,
    spreadsheet_id: String,
    sheet_id: i64,
    anchor_range: String,
}

impl SheetTradeLog {
    pub fn new(
        name: String,
        sheets: Arc<SheetsClient>,
        spreadsheet_id: String,
        sheet_id: i64,
        tab: String,
    ) -> Self {
        Self {
            name,
            sheets,
            spreadsheet_id,
            sheet_id,
            anchor_range: format!("'{tab}'!{LOG_TABLE_RANGE}"),
        }
    }
}

#[async_trait]
impl TradeLog for SheetTradeLog {
    fn name(&self) -> &str {
        &self.name
    }

    /// Make sure the header row is exactly the schema in `A1:H1` and frozen,
    /// so appended rows cannot drift. A freeze failure is tolerated.
    async fn ensure_ready(&self) -> Result<(), TradeLogError> {
        let values = self
            .sheets
            .get_values(&self.spreadsheet_id, &self.anchor_range)
            .await
            .map_err(|err| TradeLogError::Setup(err.to_string()))?;
        let header_ok = values
            .first()
            .map(|row| row.iter().map(String::as_str).eq(LOG_HEADERS))
            == Some(true);
        if !header_ok {
            let header: Vec<String> = LOG_HEADERS.iter().map(|h| h.to_string()).collect();
            self.sheets
                .update_values(&self.spreadsheet_id, &self.anchor_range, &[header])
                .await
                .map_err(|err| TradeLogError::Setup(err.to_string()))?;
        }
        if let Err(err) = self
            .sheets
            .freeze_top_row(&self.spreadsheet_id, self.sheet_id)
            .await
        {
            warn!("Failed to freeze the header row of `{}`: {err}", self.name);
        }
        Ok(())
    }

    async fn append(&self, result: &OrderResult) -> Result<(), TradeLogError> {
        // to_row renders exactly one cell per header column; the range anchor
        // keeps the row inside the audit table
        self.sheets
            .append_rows(&self.spreadsheet_id, &self.anchor_range, &[result.to_row()])
            .await
            .map_err(|err| TradeLogError::Append(err.to_string()))
    }
}
