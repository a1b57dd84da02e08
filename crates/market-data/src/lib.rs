//! Fundfolio Market Data Crate
//!
//! This crate provides upstream fund data fetching for the Fundfolio
//! application: live intraday valuation estimates, interval returns, NAV
//! history, and fund search.
//!
//! # Overview
//!
//! The market data crate supports:
//! - A provider seam (`FundDataProvider`) the domain layer depends on
//! - The Eastmoney public fund endpoints as the concrete provider
//! - Time-bucketed memoization of provider calls
//! - Bounded concurrent batch fetching with per-fund timeouts
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Domain Layer   | --> | FundDataProvider |  (trait seam)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          | MemoizedProvider |  (bucketed reuse)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          | EastmoneyProvider|  (HTTP endpoints)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`ValuationQuote`] - Live intraday estimate for one fund
//! - [`FundReturns`] - Interval return percentages plus latest NAV
//! - [`FundHistory`] - Returns bundled with a dated NAV series
//! - [`NavRecord`] - One published NAV row
//! - [`FundSearchHit`] - One row from keyword fund search

pub mod batch;
pub mod errors;
pub mod memo;
pub mod model;
pub mod provider;

// Re-export all public types from model
pub use model::{
    parse_decimal, FundHistory, FundReturns, FundSearchHit, HistoryDepth, NavRecord,
    ValuationQuote,
};

// Re-export provider types
pub use provider::eastmoney::EastmoneyProvider;
pub use provider::{FundDataProvider, ProviderConfig};

// Re-export orchestration helpers
pub use batch::{BatchFetcher, BATCH_CONCURRENCY, BATCH_TASK_TIMEOUT};
pub use errors::MarketDataError;
pub use memo::{MemoCache, MemoConfig, MemoizedProvider};
