use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal_macros::dec;
use sheet_trader::broker::paper::PaperBroker;
use sheet_trader::broker::Broker;
use sheet_trader::cycle::BuyCycle;
use sheet_trader::sizer::PercentOfEquitySizer;
use sheet_trader::submitter::OrderSubmitter;
use sheet_trader::trade_log::memory::MemoryTradeLog;
use sheet_trader::types::OrderStatus;
use sheet_trader::watchlist::csv_watchlist::CsvWatchlist;
use sheet_trader::watchlist::WatchlistSource;

mod common;
use common::{account, screener_csv, ScriptedBroker};

fn cycle_with(
    broker: Arc<dyn Broker>,
    csv_path: String,
    log: Arc<MemoryTradeLog>,
    pause: Duration,
) -> BuyCycle {
    let sizer = PercentOfEquitySizer::new(dec!(5.0), dec!(1.00));
    let submitter = OrderSubmitter::new(broker.clone(), false, pause);
    BuyCycle::new(
        Box::new(CsvWatchlist::new("screener-csv".to_string(), csv_path)),
        broker,
        sizer,
        submitter,
        log,
    )
}

#[tokio::test]
async fn buys_five_percent_of_equity_per_candidate() {
    let csv = screener_csv(&["AAPL,2.5", "MSFT,1.0"]);
    let broker = Arc::new(PaperBroker::new("paper".to_string(), account(10_000)));
    let log = Arc::new(MemoryTradeLog::new("memory".to_string()));
    let cycle = cycle_with(
        broker.clone(),
        csv.path().to_string_lossy().to_string(),
        log.clone(),
        Duration::ZERO,
    );

    let summary = cycle.run().await.unwrap();
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.logged, 2);

    let orders = broker.placed_orders().await;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].symbol, "AAPL");
    assert_eq!(orders[0].notional, dec!(500.00));
    assert!(orders[0].client_order_id.starts_with("buy-AAPL-"));
    assert!(!orders[0].extended_hours);
    assert_eq!(orders[1].symbol, "MSFT");

    let rows = log.rows().await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.status == OrderStatus::Accepted));
    assert_eq!(rows[0].requested_notional, dec!(500.00));
    assert_eq!(rows[0].order_id.as_deref(), Some("paper-1"));
}

#[tokio::test]
async fn undersized_targets_are_skipped_but_still_logged() {
    let csv = screener_csv(&["AAPL,1", "MSFT,1"]);
    // 5% of $15 is $0.75, below the $1 floor
    let broker = Arc::new(PaperBroker::new("paper".to_string(), account(15)));
    let log = Arc::new(MemoryTradeLog::new("memory".to_string()));
    let cycle = cycle_with(
        broker.clone(),
        csv.path().to_string_lossy().to_string(),
        log.clone(),
        Duration::ZERO,
    );

    let summary = cycle.run().await.unwrap();
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.accepted, 0);
    assert_eq!(summary.logged, 2);
    // Zero brokerage calls for skip decisions
    assert!(broker.placed_orders().await.is_empty());

    let rows = log.rows().await;
    assert!(rows.iter().all(|r| r.status == OrderStatus::Skipped));
    assert_eq!(rows[0].requested_notional, dec!(0.75));
    assert!(rows[0].detail.as_deref().unwrap().contains("0.75"));
}

#[tokio::test]
async fn empty_watchlist_is_a_valid_zero_row_run() {
    let csv = screener_csv(&[]);
    let broker = Arc::new(PaperBroker::new("paper".to_string(), account(10_000)));
    let log = Arc::new(MemoryTradeLog::new("memory".to_string()));
    let cycle = cycle_with(
        broker.clone(),
        csv.path().to_string_lossy().to_string(),
        log.clone(),
        Duration::ZERO,
    );

    let summary = cycle.run().await.unwrap();
    assert_eq!(summary.candidates, 0);
    assert!(broker.placed_orders().await.is_empty());
    assert!(log.rows().await.is_empty());
}

#[tokio::test]
async fn unreadable_watchlist_aborts_before_any_orders() {
    let broker = Arc::new(PaperBroker::new("paper".to_string(), account(10_000)));
    let log = Arc::new(MemoryTradeLog::new("memory".to_string()));
    let cycle = cycle_with(
        broker.clone(),
        "/nonexistent/screener.csv".to_string(),
        log.clone(),
        Duration::ZERO,
    );

    assert!(cycle.run().await.is_err());
    assert!(broker.placed_orders().await.is_empty());
    assert!(log.rows().await.is_empty());
}

#[tokio::test]
async fn csv_watchlist_normalizes_and_dedupes() {
    let csv = screener_csv(&["aapl,2.5", " msft ,1.0", "AAPL,9.0", ","]);
    let watchlist = CsvWatchlist::new(
        "screener-csv".to_string(),
        csv.path().to_string_lossy().to_string(),
    );
    let candidates = watchlist.list_candidates().await.unwrap();
    let symbols: Vec<_> = candidates.iter().map(|c| c.symbol.as_str()).collect();
    assert_eq!(symbols, ["AAPL", "MSFT"]);
    assert_eq!(candidates[0].score, Some(dec!(2.5)));
}

#[tokio::test]
async fn rejection_of_one_symbol_does_not_stop_the_run() {
    let csv = screener_csv(&["XYZ,1", "AAPL,1"]);
    let broker = Arc::new(ScriptedBroker::new(account(10_000)).rejecting("XYZ"));
    let log = Arc::new(MemoryTradeLog::new("memory".to_string()));
    let cycle = cycle_with(
        broker.clone(),
        csv.path().to_string_lossy().to_string(),
        log.clone(),
        Duration::ZERO,
    );

    let summary = cycle.run().await.unwrap();
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.logged, 2);

    let rows = log.rows().await;
    assert_eq!(rows[0].symbol, "XYZ");
    assert_eq!(rows[0].status, OrderStatus::Rejected);
    assert_eq!(rows[0].detail.as_deref(), Some("not tradable"));
    assert_eq!(rows[1].symbol, "AAPL");
    assert_eq!(rows[1].status, OrderStatus::Accepted);
}

#[tokio::test]
async fn transport_error_continues_to_the_next_candidate() {
    let csv = screener_csv(&["XYZ,1", "AAPL,1"]);
    let broker = Arc::new(ScriptedBroker::new(account(10_000)).failing_transport("XYZ"));
    let log = Arc::new(MemoryTradeLog::new("memory".to_string()));
    let cycle = cycle_with(
        broker.clone(),
        csv.path().to_string_lossy().to_string(),
        log.clone(),
        Duration::ZERO,
    );

    let summary = cycle.run().await.unwrap();
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.accepted, 1);

    let rows = log.rows().await;
    assert_eq!(rows[0].status, OrderStatus::Error);
    assert_eq!(rows[1].status, OrderStatus::Accepted);
}

#[tokio::test]
async fn account_refresh_failure_yields_an_error_row_per_candidate() {
    let csv = screener_csv(&["AAPL,1", "MSFT,1"]);
    let broker = Arc::new(ScriptedBroker::new(account(10_000)).failing_account());
    let log = Arc::new(MemoryTradeLog::new("memory".to_string()));
    let cycle = cycle_with(
        broker.clone(),
        csv.path().to_string_lossy().to_string(),
        log.clone(),
        Duration::ZERO,
    );

    let summary = cycle.run().await.unwrap();
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.logged, 2);
    assert!(broker.placed_orders().await.is_empty());
}

#[tokio::test]
async fn log_append_failure_is_a_warning_not_an_abort() {
    let csv = screener_csv(&["AAPL,1", "MSFT,1"]);
    let broker = Arc::new(PaperBroker::new("paper".to_string(), account(10_000)));
    let log = Arc::new(MemoryTradeLog::failing("memory".to_string()));
    let cycle = cycle_with(
        broker.clone(),
        csv.path().to_string_lossy().to_string(),
        log.clone(),
        Duration::ZERO,
    );

    let summary = cycle.run().await.unwrap();
    // Orders still go out, the audit rows are the casualty
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.logged, 0);
    assert_eq!(broker.placed_orders().await.len(), 2);
}

#[tokio::test]
async fn skip_only_runs_do_not_pause() {
    let csv = screener_csv(&["AAPL,1", "MSFT,1", "NVDA,1"]);
    let broker = Arc::new(PaperBroker::new("paper".to_string(), account(15)));
    let log = Arc::new(MemoryTradeLog::new("memory".to_string()));
    let cycle = cycle_with(
        broker.clone(),
        csv.path().to_string_lossy().to_string(),
        log.clone(),
        Duration::from_millis(200),
    );

    let started = Instant::now();
    let summary = cycle.run().await.unwrap();
    assert_eq!(summary.skipped, 3);
    // Three skips with a 200ms pause each would take 600ms; skips never sleep
    assert!(started.elapsed() < Duration::from_millis(150));
}
