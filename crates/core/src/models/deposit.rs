use serde::{Deserialize, Serialize};

/// A bank deposit held by the user.
///
/// Ids are assigned by the backend; a deposit is never synthesized locally
/// without a server round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Maturity date as an ISO date string (`YYYY-MM-DD`).
    #[serde(default)]
    pub end_date: String,

    /// Current balance in currency units (always >= 0)
    #[serde(default)]
    pub amount: f64,

    /// Annual interest rate in percent (always >= 0)
    #[serde(default)]
    pub rate_percent: f64,
}

/// Fields for a deposit that does not exist yet (server assigns the id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeposit {
    pub name: String,
    pub end_date: String,
    pub amount: f64,
    pub rate_percent: f64,
}

/// Full-field edit of a deposit. The balance is edited separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositChanges {
    pub name: String,
    pub end_date: String,
    pub rate_percent: f64,
}

impl Deposit {
    pub fn apply_changes(&mut self, changes: &DepositChanges) {
        self.name = changes.name.clone();
        self.end_date = changes.end_date.clone();
        self.rate_percent = changes.rate_percent;
    }
}
