use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::dividend::{DividendEntry, DividendRecord, DividendSchedule, Instrument};
use crate::providers::traits::BrokerProvider;

/// Upcoming dividends for held tickers, looked up through the broker API.
pub struct DividendService {
    broker: Arc<dyn BrokerProvider>,
    boards: Vec<String>,
}

impl DividendService {
    /// `boards` limits instrument matches to these class codes, so a ticker
    /// resolves to the same listing the price fetcher uses.
    pub fn new(broker: Arc<dyn BrokerProvider>, boards: Vec<String>) -> Self {
        Self { broker, boards }
    }

    /// Dividends with a last buy date from now on.
    pub async fn dividends_for_ticker(&self, ticker: &str) -> Result<DividendSchedule, CoreError> {
        self.dividends_since(ticker, Utc::now()).await
    }

    pub async fn dividends_since(
        &self,
        ticker: &str,
        from: DateTime<Utc>,
    ) -> Result<DividendSchedule, CoreError> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(CoreError::ValidationError("ticker must not be empty".into()));
        }

        let instruments = self.broker.find_instrument(&ticker).await?;
        let instrument = self
            .pick_instrument(&ticker, &instruments)
            .ok_or_else(|| CoreError::AssetNotFound(ticker.clone()))?;
        debug!(%ticker, uid = %instrument.uid, class_code = %instrument.class_code, "instrument matched");

        let records = self.broker.dividends(&instrument.uid, from).await?;
        let entries = records.iter().filter_map(to_entry).collect();

        Ok(DividendSchedule {
            instrument_name: instrument.name.clone(),
            entries,
        })
    }

    fn pick_instrument<'a>(&self, ticker: &str, instruments: &'a [Instrument]) -> Option<&'a Instrument> {
        instruments.iter().find(|i| {
            i.ticker.eq_ignore_ascii_case(ticker)
                && self.boards.iter().any(|b| b.eq_ignore_ascii_case(&i.class_code))
        })
    }
}

fn to_entry(record: &DividendRecord) -> Option<DividendEntry> {
    let Some(last_buy_date) = parse_day(&record.last_buy_date) else {
        warn!(raw = %record.last_buy_date, "skipping dividend with unreadable last buy date");
        return None;
    };
    Some(DividendEntry {
        last_buy_date,
        value: record.dividend_net.to_f64(),
    })
}

/// RFC 3339 timestamps are reduced to their UTC day; a bare `YYYY-MM-DD`
/// prefix is accepted too.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}
