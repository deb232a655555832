use serde::{Deserialize, Serialize};

use super::quote::Quote;

/// An exchange-traded holding (share, fund, currency pair).
///
/// `price`, `change_percent` and `total_price` are market-data enrichments:
/// they are `None` until a price has been resolved, and such a holding is
/// left out of value sums rather than counted as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeAsset {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub sector: String,

    #[serde(default)]
    pub quantity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_name: Option<String>,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub total_price: Option<f64>,

    #[serde(default)]
    pub change_percent: Option<f64>,

    #[serde(default)]
    pub comment: String,

    /// Set by the backend when it could not price the asset at write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

/// Shape returned by the quantity/field edit endpoints: the record without
/// any live pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeAssetRecord {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub ticker: Option<String>,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub sector: String,

    #[serde(default)]
    pub quantity: f64,

    #[serde(default)]
    pub board_name: Option<String>,

    #[serde(default)]
    pub comment: String,
}

/// Fields for an exchange asset that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExchangeAsset {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub category: String,
    pub sector: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_name: Option<String>,
    pub comment: String,
}

/// Pricing-orthogonal edit of an exchange asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeAssetChanges {
    pub category: String,
    pub sector: String,
    pub comment: String,
}

pub fn total_price(price: Option<f64>, quantity: f64) -> Option<f64> {
    price.map(|p| p * quantity)
}

impl ExchangeAsset {
    /// Upper-cased, trimmed ticker, if the asset has a non-blank one.
    pub fn normalized_ticker(&self) -> Option<String> {
        self.ticker
            .as_deref()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
    }

    pub fn has_error(&self) -> bool {
        self.error_reason.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Build a full asset from an edit-endpoint record, carrying over the
    /// pricing fields from the previously known version.
    pub fn from_record(record: ExchangeAssetRecord, previous: &ExchangeAsset) -> Self {
        Self {
            id: record.id,
            name: record.name,
            ticker: record.ticker,
            category: record.category,
            sector: record.sector,
            quantity: record.quantity,
            board_name: record.board_name,
            price: previous.price,
            total_price: previous.total_price,
            change_percent: previous.change_percent,
            comment: record.comment,
            error_reason: None,
        }
    }

    /// Overlay a freshly fetched quote and recompute the total.
    pub fn apply_quote(&mut self, quote: &Quote) {
        self.price = Some(quote.price);
        if quote.change_percent.is_some() {
            self.change_percent = quote.change_percent;
        }
        self.total_price = total_price(self.price, self.quantity);
    }

    pub fn set_quantity(&mut self, quantity: f64) {
        self.quantity = quantity;
        self.total_price = total_price(self.price, quantity);
    }
}

impl From<ExchangeAssetRecord> for ExchangeAsset {
    fn from(record: ExchangeAssetRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            ticker: record.ticker,
            category: record.category,
            sector: record.sector,
            quantity: record.quantity,
            board_name: record.board_name,
            price: None,
            total_price: None,
            change_percent: None,
            comment: record.comment,
            error_reason: None,
        }
    }
}

impl From<&ExchangeAsset> for ExchangeAssetRecord {
    fn from(asset: &ExchangeAsset) -> Self {
        Self {
            id: asset.id.clone(),
            name: asset.name.clone(),
            ticker: asset.ticker.clone(),
            category: asset.category.clone(),
            sector: asset.sector.clone(),
            quantity: asset.quantity,
            board_name: asset.board_name.clone(),
            comment: asset.comment.clone(),
        }
    }
}

/// An entry of the backend's accepted-assets catalogue (ticker autocomplete).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedAsset {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub ticker: String,

    #[serde(default)]
    pub board_name: Option<String>,
}
