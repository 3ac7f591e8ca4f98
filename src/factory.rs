use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use crate::broker::{alpaca::AlpacaBroker, paper::PaperBroker, Broker};
use crate::config::Config;
use crate::cycle::BuyCycle;
use crate::sheets::{auth::TokenProvider, SheetsClient};
use crate::sizer::PercentOfEquitySizer;
use crate::submitter::OrderSubmitter;
use crate::trade_log::{sheet_log::SheetTradeLog, TradeLog};
use crate::types::AccountState;
use crate::watchlist::{csv_watchlist::CsvWatchlist, sheet_watchlist::SheetWatchlist, WatchlistSource};

/// Build the component graph for one run. Everything here is startup work:
/// it happens before any order side effects, so failures are fatal.
pub async fn build_cycle(config: &Config) -> Result<BuyCycle, FactoryError> {
    let http = reqwest::Client::new();
    let token = TokenProvider::new(http.clone(), config.google_creds.clone());
    let sheets = Arc::new(SheetsClient::new(http.clone(), token));

    let spreadsheet_id = sheets
        .find_spreadsheet(&config.sheet_name)
        .await
        .map_err(|err| FactoryError::Spreadsheet(config.sheet_name.clone(), err.to_string()))?;
    debug!(
        "Resolved spreadsheet `{}` to {spreadsheet_id}",
        config.sheet_name
    );

    let watchlist: Box<dyn WatchlistSource> = match &config.screener_csv {
        Some(path) => {
            info!("SCREENER_CSV is set, reading candidates from {path}");
            Box::new(CsvWatchlist::new("screener-csv".to_string(), path.clone()))
        }
        None => {
            sheets
                .ensure_worksheet(&spreadsheet_id, &config.screener_tab)
                .await
                .map_err(|err| {
                    FactoryError::Worksheet(config.screener_tab.clone(), err.to_string())
                })?;
            Box::new(SheetWatchlist::new(
                config.screener_tab.clone(),
                sheets.clone(),
                spreadsheet_id.clone(),
                config.screener_tab.clone(),
            ))
        }
    };

    let log_sheet_id = sheets
        .ensure_worksheet(&spreadsheet_id, &config.log_tab)
        .await
        .map_err(|err| FactoryError::Worksheet(config.log_tab.clone(), err.to_string()))?;
    let trade_log = Arc::new(SheetTradeLog::new(
        config.log_tab.clone(),
        sheets.clone(),
        spreadsheet_id,
        log_sheet_id,
        config.log_tab.clone(),
    ));
    trade_log
        .ensure_ready()
        .await
        .map_err(|err| FactoryError::TradeLogSetup(err.to_string()))?;

    let broker: Arc<dyn Broker> = if config.dry_run {
        info!("DRY_RUN is set, routing orders to the local paper broker");
        Arc::new(PaperBroker::new(
            "paper".to_string(),
            AccountState {
                equity: Decimal::from(100_000),
                buying_power: Decimal::from(100_000),
            },
        ))
    } else {
        Arc::new(AlpacaBroker::new(
            "alpaca".to_string(),
            http,
            config.alpaca_base_url.clone(),
            config.alpaca_api_key.clone(),
            config.alpaca_secret_key.clone(),
        ))
    };

    let sizer = PercentOfEquitySizer::new(config.percent_per_trade, config.min_order_notional);
    let submitter = OrderSubmitter::new(
        broker.clone(),
        config.extended_hours,
        config.sleep_between_orders,
    );
    Ok(BuyCycle::new(watchlist, broker, sizer, submitter, trade_log))
}

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Failed to resolve spreadsheet `{0}`: {1}")]
    Spreadsheet(String, String),
    #[error("Failed to prepare worksheet `{0}`: {1}")]
    Worksheet(String, String),
    #[error("Failed to prepare the trade log tab: {0}")]
    TradeLogSetup(String),
}
