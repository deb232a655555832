use futures::future::join_all;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::models::quote::{FetchOutcome, MarketDataBlock, Quote};
use crate::providers::traits::MarketDataProvider;

/// Error code recorded for a ticker no board could price.
pub const PRICE_NOT_FOUND: &str = "PRICE_NOT_FOUND";

/// Everything the fetcher knows about tickers, keyed by upper-cased ticker.
#[derive(Debug, Default)]
struct QuoteBook {
    quotes: HashMap<String, Quote>,
    loading: HashSet<String>,
    errors: HashMap<String, String>,
}

/// Resolves tickers to live prices by walking the configured boards.
///
/// Cache strategy:
/// - A successful fetch overwrites the ticker's quote; entries are never evicted.
/// - A failed fetch records `PRICE_NOT_FOUND` and leaves any earlier quote alone.
/// - At most one fetch per ticker is in flight; re-entrant calls are no-ops.
///
/// The loading check-and-set happens under one short lock, so concurrent
/// callers on any runtime see a consistent dedup decision.
pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    boards: Vec<String>,
    book: Mutex<QuoteBook>,
}

impl MarketDataService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, boards: Vec<String>) -> Self {
        Self {
            provider,
            boards,
            book: Mutex::new(QuoteBook::default()),
        }
    }

    pub fn boards(&self) -> &[String] {
        &self.boards
    }

    fn book(&self) -> MutexGuard<'_, QuoteBook> {
        self.book.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fetch the live price for `ticker` (case-insensitive).
    ///
    /// 1. Skip blank tickers and tickers already being fetched.
    /// 2. Clear the previous error, then try each board in order.
    /// 3. The first usable row wins and is cached.
    /// 4. If no board works, record `PRICE_NOT_FOUND`.
    ///
    /// Per-board failures are logged and swallowed.
    pub async fn fetch_price(&self, ticker: &str) -> FetchOutcome {
        let secid = ticker.trim().to_uppercase();
        if secid.is_empty() {
            return FetchOutcome::Skipped;
        }

        {
            let mut book = self.book();
            if !book.loading.insert(secid.clone()) {
                debug!(ticker = %secid, "price fetch already in flight");
                return FetchOutcome::AlreadyLoading;
            }
            book.errors.remove(&secid);
        }
        let _loading = LoadingMarker {
            book: &self.book,
            secid: secid.clone(),
        };

        for board in &self.boards {
            match self.provider.fetch_board(&secid, board).await {
                Ok(block) => match resolve_quote(&block) {
                    Some(quote) => {
                        info!(ticker = %secid, %board, price = quote.price, "price resolved");
                        self.book().quotes.insert(secid.clone(), quote);
                        return FetchOutcome::Fetched(quote);
                    }
                    None => debug!(ticker = %secid, %board, "board has no usable price row"),
                },
                Err(e) => {
                    debug!(
                        ticker = %secid,
                        %board,
                        provider = self.provider.name(),
                        error = %e,
                        "board fetch failed"
                    );
                }
            }
        }

        warn!(ticker = %secid, boards = self.boards.len(), "price not found on any board");
        self.book().errors.insert(secid, PRICE_NOT_FOUND.to_string());
        FetchOutcome::NotFound
    }

    /// Fetch many tickers concurrently, once per distinct (upper-cased)
    /// ticker. Blank tickers are ignored.
    pub async fn fetch_many<I, S>(&self, tickers: I) -> HashMap<String, FetchOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = tickers
            .into_iter()
            .map(|t| t.as_ref().trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();

        let outcomes = join_all(distinct.iter().map(|t| self.fetch_price(t))).await;
        distinct.into_iter().zip(outcomes).collect()
    }

    pub fn quote(&self, ticker: &str) -> Option<Quote> {
        self.book().quotes.get(&normalize(ticker)).copied()
    }

    pub fn price(&self, ticker: &str) -> Option<f64> {
        self.quote(ticker).map(|q| q.price)
    }

    pub fn change_percent(&self, ticker: &str) -> Option<f64> {
        self.quote(ticker).and_then(|q| q.change_percent)
    }

    /// Error code of the last failed fetch, cleared when a new one starts.
    pub fn error(&self, ticker: &str) -> Option<String> {
        self.book().errors.get(&normalize(ticker)).cloned()
    }

    pub fn is_loading(&self, ticker: &str) -> bool {
        self.book().loading.contains(&normalize(ticker))
    }

    /// Snapshot of every cached quote.
    pub fn quotes(&self) -> HashMap<String, Quote> {
        self.book().quotes.clone()
    }
}

/// Pick a price out of a board's `marketdata` block.
///
/// `LAST` wins when it is present and strictly positive, otherwise
/// `MARKETPRICE` is used. The day change always comes from
/// `LASTTOPREVPRICE`. Returns `None` when neither yields a finite number.
pub fn resolve_quote(block: &MarketDataBlock) -> Option<Quote> {
    let last = block.first_row_number("LAST").filter(|v| *v > 0.0);
    let market = block.first_row_number("MARKETPRICE");
    let price = last.or(market).filter(|p| p.is_finite())?;
    let change_percent = block
        .first_row_number("LASTTOPREVPRICE")
        .filter(|v| v.is_finite());
    Some(Quote {
        price,
        change_percent,
    })
}

fn normalize(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Holds a ticker's loading slot for the whole board walk.
struct LoadingMarker<'a> {
    book: &'a Mutex<QuoteBook>,
    secid: String,
}

impl Drop for LoadingMarker<'_> {
    fn drop(&mut self) {
        let mut book = self.book.lock().unwrap_or_else(|e| e.into_inner());
        book.loading.remove(&self.secid);
    }
}
