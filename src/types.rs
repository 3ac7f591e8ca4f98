use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Fixed audit-row schema of the log tab.
pub const LOG_HEADERS: [&str; 8] = [
    "Timestamp",
    "Action",
    "Symbol",
    "NotionalUSD",
    "Qty",
    "OrderID",
    "Status",
    "Note",
];
/// Appends anchor here so rows land in the audit table instead of drifting right.
pub const LOG_TABLE_RANGE: &str = "A1:H1";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A symbol surfaced by the screener for possible trading this run.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub symbol: String,
    /// Optional screener metadata; carried for visibility, never used for sizing
    pub score: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountState {
    pub equity: Decimal,
    pub buying_power: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeAction {
    Submit,
    SkipBelowMinNotional,
    SkipNoCandidate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizingDecision {
    pub symbol: String,
    pub action: SizeAction,
    pub notional: Decimal,
    /// Stays unset under notional sizing; the brokerage resolves shares
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub notional: Decimal,
    pub extended_hours: bool,
    pub client_order_id: String,
}

/// What the brokerage reported back for an accepted order.
#[derive(Debug, Clone)]
pub struct OrderAck {
    pub order_id: String,
    pub status: String,
    /// May be empty pre-fill for notional orders
    pub qty: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Accepted,
    Rejected,
    Error,
    Skipped,
}

/// The outcome of one candidate, written once to the log tab.
#[derive(Debug, Clone)]
pub struct OrderResult {
    pub symbol: String,
    pub requested_notional: Decimal,
    pub quantity: Option<Decimal>,
    pub order_id: Option<String>,
    pub status: OrderStatus,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl OrderResult {
    pub fn action_label(&self) -> &'static str {
        match self.status {
            OrderStatus::Accepted => "BUY",
            OrderStatus::Skipped => "BUY-SKIP",
            OrderStatus::Rejected => "BUY-REJECT",
            OrderStatus::Error => "BUY-ERROR",
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self.status {
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Skipped => "SKIPPED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Error => "ERROR",
        }
    }

    /// Render the audit row, exactly one cell per `LOG_HEADERS` column.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.action_label().to_string(),
            self.symbol.clone(),
            format_usd(self.requested_notional),
            self.quantity.map(|q| q.to_string()).unwrap_or_default(),
            self.order_id.clone().unwrap_or_default(),
            self.status_label().to_string(),
            self.detail.clone().unwrap_or_default(),
        ]
    }
}

/// Render a dollar amount at exactly two decimal places.
pub fn format_usd(value: Decimal) -> String {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn format_usd_forces_two_decimal_places() {
        assert_eq!(format_usd(dec!(500)), "500.00");
        assert_eq!(format_usd(dec!(0.754)), "0.75");
        assert_eq!(format_usd(dec!(0.755)), "0.76");
    }

    #[test]
    fn audit_row_has_one_cell_per_header() {
        let result = OrderResult {
            symbol: "AAPL".to_string(),
            requested_notional: dec!(500),
            quantity: None,
            order_id: Some("abc-123".to_string()),
            status: OrderStatus::Accepted,
            detail: None,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap(),
        };
        let row = result.to_row();
        assert_eq!(row.len(), LOG_HEADERS.len());
        assert_eq!(
            row,
            vec![
                "2024-03-01T14:30:00Z",
                "BUY",
                "AAPL",
                "500.00",
                "",
                "abc-123",
                "ACCEPTED",
                "",
            ]
        );
    }

    #[test]
    fn skip_and_error_rows_carry_their_labels() {
        let skip = OrderResult {
            symbol: "XYZ".to_string(),
            requested_notional: dec!(0.75),
            quantity: None,
            order_id: None,
            status: OrderStatus::Skipped,
            detail: Some("too small".to_string()),
            timestamp: Utc::now(),
        };
        assert_eq!(skip.action_label(), "BUY-SKIP");
        assert_eq!(skip.to_row()[3], "0.75");
        assert_eq!(skip.to_row()[7], "too small");

        let error = OrderResult { status: OrderStatus::Error, ..skip.clone() };
        assert_eq!(error.action_label(), "BUY-ERROR");
        assert_eq!(error.status_label(), "ERROR");
    }
}
