use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::deposit::Deposit;
use super::exchange_asset::ExchangeAsset;

/// Which ledger a unified row comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Deposit,
    Exchange,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Deposit => write!(f, "deposit"),
            AssetKind::Exchange => write!(f, "exchange"),
        }
    }
}

/// View-time projection of one ledger record, rebuilt on every read.
///
/// Ids are only unique within their own ledger; a deposit and an exchange
/// asset may share an id. Serializes as `{ id, type, data }`.
#[derive(Debug, Clone, PartialEq)]
pub enum UnifiedAsset {
    Deposit(Deposit),
    Exchange(ExchangeAsset),
}

impl UnifiedAsset {
    pub fn id(&self) -> &str {
        match self {
            UnifiedAsset::Deposit(d) => &d.id,
            UnifiedAsset::Exchange(e) => &e.id,
        }
    }

    pub fn kind(&self) -> AssetKind {
        match self {
            UnifiedAsset::Deposit(_) => AssetKind::Deposit,
            UnifiedAsset::Exchange(_) => AssetKind::Exchange,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UnifiedAsset::Deposit(d) => &d.name,
            UnifiedAsset::Exchange(e) => &e.name,
        }
    }

    /// Current valuation. Deposits are worth their balance; an exchange
    /// asset is worth its `total_price`, or nothing known yet.
    pub fn value(&self) -> Option<f64> {
        match self {
            UnifiedAsset::Deposit(d) => Some(d.amount),
            UnifiedAsset::Exchange(e) => e.total_price,
        }
    }
}

impl Serialize for UnifiedAsset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("UnifiedAsset", 3)?;
        state.serialize_field("id", self.id())?;
        state.serialize_field("type", &self.kind())?;
        match self {
            UnifiedAsset::Deposit(d) => state.serialize_field("data", d)?,
            UnifiedAsset::Exchange(e) => state.serialize_field("data", e)?,
        }
        state.end()
    }
}

/// Aggregate figures across both ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub total_value: f64,
    pub deposit_value: f64,
    pub exchange_value: f64,
    pub deposit_count: usize,
    pub exchange_count: usize,
}

/// One slice of the overall composition chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionSlice {
    pub kind: AssetKind,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Type,
    Category,
    Sector,
    Quantity,
    Price,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    /// Most valuable holdings first.
    fn default() -> Self {
        Self {
            field: SortField::Value,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Selecting the active field flips the direction; any other field
    /// starts ascending.
    pub fn toggle(&mut self, field: SortField) {
        self.direction = if self.field == field && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.field = field;
    }
}
