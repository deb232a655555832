use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::CoreError;
use crate::models::dividend::{DividendRecord, Instrument};
use crate::models::quote::MarketDataBlock;

/// Source of per-board market data for a security.
///
/// The fetcher only depends on this trait, so the live MOEX ISS client can be
/// swapped for a mock (tests) or another exchange without touching the
/// price cache logic.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the `marketdata` block for `secid` (already upper-cased) on
    /// `board`. Any HTTP or decoding problem is an error; the caller moves
    /// on to the next board.
    async fn fetch_board(&self, secid: &str, board: &str) -> Result<MarketDataBlock, CoreError>;
}

/// External broker API used for instrument lookup and dividend history.
#[async_trait]
pub trait BrokerProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Search instruments by ticker or name.
    async fn find_instrument(&self, query: &str) -> Result<Vec<Instrument>, CoreError>;

    /// Dividends for an instrument with a record date from `from` onwards.
    async fn dividends(
        &self,
        instrument_uid: &str,
        from: DateTime<Utc>,
    ) -> Result<Vec<DividendRecord>, CoreError>;
}
