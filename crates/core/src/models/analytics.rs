use serde::{Deserialize, Serialize};

/// Direction of a day move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoverKind {
    Fallen,
    Grown,
}

/// A holding whose price moved by at least the requested threshold today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mover {
    pub name: String,

    /// Upper-cased ticker
    pub ticker: String,

    /// Day change in percent (negative for a fall)
    pub change_percent: f64,
}

/// Field exchange holdings are grouped by in the allocation breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationKey {
    Name,
    Category,
    Sector,
}

/// One group of the allocation breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationEntry {
    pub label: String,

    /// Market value of the group
    pub value: f64,

    /// Share of the breakdown total, 0–100
    pub percent: f64,
}
