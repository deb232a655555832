pub mod alert;
pub mod analytics;
pub mod deposit;
pub mod dividend;
pub mod exchange_asset;
pub mod quote;
pub mod settings;
pub mod unified;
