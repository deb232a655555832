use std::cmp::Ordering;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::deposit::{Deposit, DepositChanges, NewDeposit};
use crate::models::exchange_asset::{ExchangeAsset, ExchangeAssetChanges, NewExchangeAsset};
use crate::models::unified::{
    AssetKind, AssetSummary, CompositionSlice, SortDirection, SortField, SortState, UnifiedAsset,
};
use crate::services::deposit_ledger::DepositLedger;
use crate::services::exchange_ledger::ExchangeLedger;

/// One view over both ledgers.
///
/// Holds no state of its own: every read is rebuilt from the ledgers, and
/// every write is forwarded to the ledger that owns the record.
#[derive(Debug, Clone)]
pub struct UnifiedAssetsService {
    deposits: Arc<DepositLedger>,
    exchange: Arc<ExchangeLedger>,
}

impl UnifiedAssetsService {
    pub fn new(deposits: Arc<DepositLedger>, exchange: Arc<ExchangeLedger>) -> Self {
        Self { deposits, exchange }
    }

    pub fn deposits(&self) -> &Arc<DepositLedger> {
        &self.deposits
    }

    pub fn exchange(&self) -> &Arc<ExchangeLedger> {
        &self.exchange
    }

    // ── Derived views ───────────────────────────────────────────────

    /// Deposits first, then exchange holdings, each in ledger order.
    pub fn all_assets(&self) -> Vec<UnifiedAsset> {
        self.deposits
            .items()
            .into_iter()
            .map(UnifiedAsset::Deposit)
            .chain(self.exchange.items().into_iter().map(UnifiedAsset::Exchange))
            .collect()
    }

    /// Totals across both ledgers. Unpriced exchange holdings are counted but
    /// add nothing to the value.
    pub fn summary(&self) -> AssetSummary {
        summarize(&self.all_assets())
    }

    pub fn sorted(&self, state: &SortState) -> Vec<UnifiedAsset> {
        let mut assets = self.all_assets();
        sort_assets(&mut assets, state);
        assets
    }

    /// Deposit and exchange slices for the overview chart. Empty slices are
    /// left out.
    pub fn composition(&self) -> Vec<CompositionSlice> {
        let summary = self.summary();
        [
            (AssetKind::Deposit, summary.deposit_value),
            (AssetKind::Exchange, summary.exchange_value),
        ]
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(kind, value)| CompositionSlice { kind, value })
        .collect()
    }

    // ── Delegating mutations ────────────────────────────────────────

    pub async fn remove_asset(&self, id: &str, kind: AssetKind) -> Result<(), CoreError> {
        match kind {
            AssetKind::Deposit => self.deposits.remove(id).await,
            AssetKind::Exchange => self.exchange.remove(id).await,
        }
    }

    pub async fn add_deposit(&self, deposit: NewDeposit) -> Result<(), CoreError> {
        self.deposits.add(deposit).await
    }

    pub async fn add_exchange(&self, asset: NewExchangeAsset) -> Result<(), CoreError> {
        self.exchange.add(asset).await
    }

    pub async fn adjust_deposit_amount(&self, id: &str, delta: f64) -> Result<Deposit, CoreError> {
        self.deposits.adjust_amount(id, delta).await
    }

    pub async fn update_deposit(&self, id: &str, changes: DepositChanges) -> Result<Deposit, CoreError> {
        self.deposits.update_fields(id, changes).await
    }

    pub async fn update_exchange_quantity(
        &self,
        id: &str,
        quantity: f64,
    ) -> Result<ExchangeAsset, CoreError> {
        self.exchange.update_quantity(id, quantity).await
    }

    pub async fn update_exchange(
        &self,
        id: &str,
        changes: ExchangeAssetChanges,
    ) -> Result<ExchangeAsset, CoreError> {
        self.exchange.update_fields(id, changes).await
    }

    /// Whether any mutation on `id` in the ledger for `kind` is in flight.
    pub fn is_updating(&self, id: &str, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Deposit => self.deposits.is_updating(id),
            AssetKind::Exchange => self.exchange.is_updating(id),
        }
    }
}

pub fn summarize(assets: &[UnifiedAsset]) -> AssetSummary {
    let mut summary = AssetSummary::default();
    for asset in assets {
        let value = asset.value().unwrap_or(0.0);
        match asset.kind() {
            AssetKind::Deposit => {
                summary.deposit_value += value;
                summary.deposit_count += 1;
            }
            AssetKind::Exchange => {
                summary.exchange_value += value;
                summary.exchange_count += 1;
            }
        }
    }
    summary.total_value = summary.deposit_value + summary.exchange_value;
    summary
}

/// Stable sort by `state`. Fields a deposit does not have sort as an empty
/// string (category, sector) or zero (quantity, price); an unpriced holding
/// sorts as zero by price and value.
pub fn sort_assets(assets: &mut [UnifiedAsset], state: &SortState) {
    assets.sort_by(|a, b| {
        let ord = compare_by(a, b, state.field);
        match state.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

fn compare_by(a: &UnifiedAsset, b: &UnifiedAsset, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name().to_lowercase().cmp(&b.name().to_lowercase()),
        SortField::Type => kind_rank(a.kind()).cmp(&kind_rank(b.kind())),
        SortField::Category => text_field(a, |e| &e.category).cmp(&text_field(b, |e| &e.category)),
        SortField::Sector => text_field(a, |e| &e.sector).cmp(&text_field(b, |e| &e.sector)),
        SortField::Quantity => cmp_f64(number_field(a, |e| e.quantity), number_field(b, |e| e.quantity)),
        SortField::Price => cmp_f64(
            number_field(a, |e| e.price.unwrap_or(0.0)),
            number_field(b, |e| e.price.unwrap_or(0.0)),
        ),
        SortField::Value => cmp_f64(a.value().unwrap_or(0.0), b.value().unwrap_or(0.0)),
    }
}

fn kind_rank(kind: AssetKind) -> u8 {
    match kind {
        AssetKind::Deposit => 0,
        AssetKind::Exchange => 1,
    }
}

fn text_field(asset: &UnifiedAsset, field: impl Fn(&ExchangeAsset) -> &String) -> String {
    match asset {
        UnifiedAsset::Deposit(_) => String::new(),
        UnifiedAsset::Exchange(e) => field(e).to_lowercase(),
    }
}

fn number_field(asset: &UnifiedAsset, field: impl Fn(&ExchangeAsset) -> f64) -> f64 {
    match asset {
        UnifiedAsset::Deposit(_) => 0.0,
        UnifiedAsset::Exchange(e) => field(e),
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}
