pub mod alert_service;
pub mod analytics_service;
pub mod deposit_ledger;
pub mod dividend_service;
pub mod exchange_ledger;
pub mod in_flight;
pub mod market_data_service;
pub mod unified_service;
