pub mod broker;
pub mod config;
pub mod cycle;
pub mod factory;
pub mod sheets;
pub mod sizer;
pub mod submitter;
pub mod trade_log;
pub mod types;
pub mod watchlist;
