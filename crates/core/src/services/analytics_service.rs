use std::collections::HashMap;

use crate::models::analytics::{AllocationEntry, AllocationKey, Mover, MoverKind};
use crate::models::exchange_asset::ExchangeAsset;
use crate::models::quote::Quote;

/// Label for holdings whose grouping field is empty.
pub const OTHER_LABEL: &str = "Other";

/// Derived overview figures over exchange holdings.
///
/// Pure business logic, no I/O. Callers pass in the ledger snapshot and the
/// fetcher's quote cache.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    /// Holdings that moved at least `threshold_percent` today.
    ///
    /// Only holdings with a ticker and a finite day change count. The change
    /// comes from `quotes` when cached, otherwise from the record itself.
    /// Falls are ordered steepest first, gains largest first, and the list is
    /// cut to `limit`.
    pub fn top_movers(
        &self,
        items: &[ExchangeAsset],
        quotes: &HashMap<String, Quote>,
        kind: MoverKind,
        threshold_percent: f64,
        limit: usize,
    ) -> Vec<Mover> {
        let threshold = threshold_percent.abs();
        let mut movers: Vec<Mover> = items
            .iter()
            .filter_map(|item| {
                let ticker = item.normalized_ticker()?;
                let change_percent = quotes
                    .get(&ticker)
                    .and_then(|q| q.change_percent)
                    .or(item.change_percent)
                    .filter(|p| p.is_finite())?;
                Some(Mover {
                    name: item.name.clone(),
                    ticker,
                    change_percent,
                })
            })
            .filter(|m| match kind {
                MoverKind::Fallen => m.change_percent <= -threshold,
                MoverKind::Grown => m.change_percent >= threshold,
            })
            .collect();

        // The same ticker held in several rows is listed once.
        movers.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        movers.dedup_by(|a, b| a.ticker == b.ticker);

        movers.sort_by(|a, b| {
            let ord = a.change_percent.total_cmp(&b.change_percent);
            match kind {
                MoverKind::Fallen => ord,
                MoverKind::Grown => ord.reverse(),
            }
        });
        movers.truncate(limit);
        movers
    }

    /// Market value of exchange holdings grouped by `key`.
    ///
    /// A holding is valued at `price × quantity`, using the cached quote for
    /// its ticker and falling back to the record's own price. Unpriced and
    /// zero-value holdings are left out. Groups are sorted by value, largest
    /// first, and carry their share of the total.
    pub fn allocation_by(
        &self,
        items: &[ExchangeAsset],
        quotes: &HashMap<String, Quote>,
        key: AllocationKey,
    ) -> Vec<AllocationEntry> {
        let mut groups: HashMap<String, f64> = HashMap::new();

        for item in items {
            let price = item
                .normalized_ticker()
                .and_then(|t| quotes.get(&t).map(|q| q.price))
                .or(item.price);
            let Some(value) = price.map(|p| p * item.quantity).filter(|v| v.is_finite() && *v > 0.0) else {
                continue;
            };

            let label = match key {
                AllocationKey::Name => item.name.trim(),
                AllocationKey::Category => item.category.trim(),
                AllocationKey::Sector => item.sector.trim(),
            };
            let label = if label.is_empty() { OTHER_LABEL } else { label };
            *groups.entry(label.to_string()).or_insert(0.0) += value;
        }

        let total: f64 = groups.values().sum();
        let mut entries: Vec<AllocationEntry> = groups
            .into_iter()
            .map(|(label, value)| AllocationEntry {
                percent: if total > 0.0 { value / total * 100.0 } else { 0.0 },
                label,
                value,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.value
                .total_cmp(&a.value)
                .then_with(|| a.label.cmp(&b.label))
        });
        entries
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
