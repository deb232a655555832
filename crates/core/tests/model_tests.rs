// ═══════════════════════════════════════════════════════════════════
// Model Tests — Deposit, ExchangeAsset, Quote/MarketDataBlock,
// UnifiedAsset, SortState, dividends, Settings
// ═══════════════════════════════════════════════════════════════════

use serde_json::json;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::alert::{AlertState, Severity};
use portfolio_tracker_core::models::deposit::{Deposit, DepositChanges};
use portfolio_tracker_core::models::dividend::MoneyValue;
use portfolio_tracker_core::models::exchange_asset::{ExchangeAsset, ExchangeAssetRecord};
use portfolio_tracker_core::models::quote::{FetchOutcome, MarketDataBlock, Quote};
use portfolio_tracker_core::models::settings::{Settings, DEFAULT_BOARDS};
use portfolio_tracker_core::models::unified::{
    AssetKind, SortDirection, SortField, SortState, UnifiedAsset,
};

fn sber(quantity: f64, price: Option<f64>) -> ExchangeAsset {
    ExchangeAsset {
        id: "a1".into(),
        name: "Sberbank".into(),
        ticker: Some("sber ".into()),
        category: "Shares".into(),
        sector: "Finance".into(),
        quantity,
        board_name: Some("TQBR".into()),
        price,
        total_price: price.map(|p| p * quantity),
        change_percent: Some(0.5),
        comment: String::new(),
        error_reason: None,
    }
}

// ═══════════════════════════════════════════════════════════════════
// Deposit
// ═══════════════════════════════════════════════════════════════════

mod deposit {
    use super::*;

    #[test]
    fn deserializes_camel_case() {
        let d: Deposit = serde_json::from_value(json!({
            "id": "d1",
            "name": "Savings",
            "endDate": "2026-12-31",
            "amount": 100000,
            "ratePercent": 5.5
        }))
        .unwrap();
        assert_eq!(d.end_date, "2026-12-31");
        assert_eq!(d.amount, 100000.0);
        assert_eq!(d.rate_percent, 5.5);
    }

    #[test]
    fn missing_fields_default() {
        let d: Deposit = serde_json::from_value(json!({ "id": "d1" })).unwrap();
        assert_eq!(d.name, "");
        assert_eq!(d.amount, 0.0);
    }

    #[test]
    fn apply_changes_keeps_amount() {
        let mut d = Deposit {
            id: "d1".into(),
            name: "Old".into(),
            end_date: "2025-01-01".into(),
            amount: 500.0,
            rate_percent: 4.0,
        };
        d.apply_changes(&DepositChanges {
            name: "New".into(),
            end_date: "2027-01-01".into(),
            rate_percent: 7.25,
        });
        assert_eq!(d.name, "New");
        assert_eq!(d.end_date, "2027-01-01");
        assert_eq!(d.rate_percent, 7.25);
        assert_eq!(d.amount, 500.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// ExchangeAsset
// ═══════════════════════════════════════════════════════════════════

mod exchange_asset {
    use super::*;

    #[test]
    fn normalized_ticker_trims_and_uppercases() {
        assert_eq!(sber(1.0, None).normalized_ticker().as_deref(), Some("SBER"));
    }

    #[test]
    fn blank_ticker_is_none() {
        let mut a = sber(1.0, None);
        a.ticker = Some("   ".into());
        assert_eq!(a.normalized_ticker(), None);
        a.ticker = None;
        assert_eq!(a.normalized_ticker(), None);
    }

    #[test]
    fn set_quantity_recomputes_total() {
        let mut a = sber(10.0, Some(250.0));
        a.set_quantity(4.0);
        assert_eq!(a.total_price, Some(1000.0));
    }

    #[test]
    fn set_quantity_without_price_leaves_total_unknown() {
        let mut a = sber(10.0, None);
        a.set_quantity(4.0);
        assert_eq!(a.total_price, None);
    }

    #[test]
    fn apply_quote_overrides_price_and_change() {
        let mut a = sber(2.0, Some(100.0));
        a.apply_quote(&Quote {
            price: 120.0,
            change_percent: Some(-3.0),
        });
        assert_eq!(a.price, Some(120.0));
        assert_eq!(a.change_percent, Some(-3.0));
        assert_eq!(a.total_price, Some(240.0));
    }

    #[test]
    fn apply_quote_without_change_keeps_previous_change() {
        let mut a = sber(2.0, Some(100.0));
        a.apply_quote(&Quote {
            price: 101.0,
            change_percent: None,
        });
        assert_eq!(a.change_percent, Some(0.5));
    }

    #[test]
    fn from_record_carries_pricing_over() {
        let previous = sber(10.0, Some(250.0));
        let record = ExchangeAssetRecord {
            comment: "long term".into(),
            ..ExchangeAssetRecord::from(&previous)
        };
        let rebuilt = ExchangeAsset::from_record(record, &previous);
        assert_eq!(rebuilt.price, Some(250.0));
        assert_eq!(rebuilt.change_percent, Some(0.5));
        assert_eq!(rebuilt.total_price, Some(2500.0));
        assert_eq!(rebuilt.comment, "long term");
    }

    #[test]
    fn record_without_pricing_deserializes() {
        let r: ExchangeAssetRecord = serde_json::from_value(json!({
            "id": "a1",
            "name": "Sberbank",
            "ticker": "SBER",
            "quantity": 3,
            "boardName": "TQBR"
        }))
        .unwrap();
        let a = ExchangeAsset::from(r);
        assert_eq!(a.quantity, 3.0);
        assert_eq!(a.board_name.as_deref(), Some("TQBR"));
        assert_eq!(a.price, None);
    }

    #[test]
    fn has_error_ignores_empty_reason() {
        let mut a = sber(1.0, None);
        assert!(!a.has_error());
        a.error_reason = Some(String::new());
        assert!(!a.has_error());
        a.error_reason = Some("PRICE_NOT_FOUND".into());
        assert!(a.has_error());
    }
}

// ═══════════════════════════════════════════════════════════════════
// MarketDataBlock / FetchOutcome
// ═══════════════════════════════════════════════════════════════════

mod market_data_block {
    use super::*;

    #[test]
    fn columns_looked_up_by_name() {
        let block = MarketDataBlock::new(
            &["SECID", "LAST", "MARKETPRICE"],
            vec![vec![json!("SBER"), json!(250.5), json!(249.0)]],
        );
        assert_eq!(block.column_index("MARKETPRICE"), Some(2));
        assert_eq!(block.first_row_number("LAST"), Some(250.5));
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let block = MarketDataBlock::new(&["LAST"], vec![vec![json!(" 12.5 ")]]);
        assert_eq!(block.first_row_number("LAST"), Some(12.5));
    }

    #[test]
    fn null_missing_column_and_empty_data_are_none() {
        let block = MarketDataBlock::new(&["LAST"], vec![vec![json!(null)]]);
        assert_eq!(block.first_row_number("LAST"), None);
        assert_eq!(block.first_row_number("MARKETPRICE"), None);
        let empty = MarketDataBlock::new(&["LAST"], vec![]);
        assert_eq!(empty.first_row_number("LAST"), None);
    }

    #[test]
    fn short_row_is_none() {
        let block = MarketDataBlock::new(&["A", "B"], vec![vec![json!(1)]]);
        assert_eq!(block.first_row_number("B"), None);
    }

    #[test]
    fn fetch_outcome_quote() {
        let q = Quote {
            price: 1.0,
            change_percent: None,
        };
        assert_eq!(FetchOutcome::Fetched(q).quote(), Some(q));
        assert_eq!(FetchOutcome::NotFound.quote(), None);
        assert_eq!(FetchOutcome::AlreadyLoading.quote(), None);
    }
}

// ═══════════════════════════════════════════════════════════════════
// UnifiedAsset / SortState
// ═══════════════════════════════════════════════════════════════════

mod unified {
    use super::*;

    #[test]
    fn deposit_value_is_amount() {
        let d = UnifiedAsset::Deposit(Deposit {
            id: "d1".into(),
            name: "Savings".into(),
            end_date: String::new(),
            amount: 100000.0,
            rate_percent: 5.0,
        });
        assert_eq!(d.value(), Some(100000.0));
        assert_eq!(d.kind(), AssetKind::Deposit);

        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["id"], "d1");
        assert_eq!(v["type"], "deposit");
        assert_eq!(v["data"]["amount"], 100000.0);
    }

    #[test]
    fn unpriced_exchange_value_is_none() {
        let e = UnifiedAsset::Exchange(sber(10.0, None));
        assert_eq!(e.value(), None);
        assert_eq!(e.kind(), AssetKind::Exchange);
    }

    #[test]
    fn serializes_with_id_and_type_tag() {
        let e = UnifiedAsset::Exchange(sber(1.0, Some(2.0)));
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["id"], "a1");
        assert_eq!(v["type"], "exchange");
        assert_eq!(v["data"]["id"], "a1");
        assert_eq!(v["data"]["totalPrice"], 2.0);
    }

    #[test]
    fn default_sort_is_value_desc() {
        let s = SortState::default();
        assert_eq!(s.field, SortField::Value);
        assert_eq!(s.direction, SortDirection::Desc);
    }

    #[test]
    fn toggle_same_field_flips() {
        let mut s = SortState::new(SortField::Name, SortDirection::Asc);
        s.toggle(SortField::Name);
        assert_eq!(s.direction, SortDirection::Desc);
        s.toggle(SortField::Name);
        assert_eq!(s.direction, SortDirection::Asc);
    }

    #[test]
    fn toggle_new_field_starts_ascending() {
        let mut s = SortState::default();
        s.toggle(SortField::Sector);
        assert_eq!(s, SortState::new(SortField::Sector, SortDirection::Asc));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Dividends / Alerts
// ═══════════════════════════════════════════════════════════════════

mod misc {
    use super::*;

    #[test]
    fn money_value_from_string_units() {
        let m = MoneyValue {
            currency: "rub".into(),
            units: json!("33"),
            nano: 300_000_000,
        };
        assert!((m.to_f64() - 33.3).abs() < 1e-9);
    }

    #[test]
    fn money_value_from_number_units() {
        let m = MoneyValue {
            currency: "rub".into(),
            units: json!(12),
            nano: 0,
        };
        assert_eq!(m.to_f64(), 12.0);
    }

    #[test]
    fn alert_state_default_is_closed_info() {
        let s = AlertState::default();
        assert!(!s.is_showing);
        assert_eq!(s.severity, Severity::Info);
        assert!(s.message.is_empty());
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Success.to_string(), "success");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.boards, DEFAULT_BOARDS);
        assert_eq!(s.alert_clear_delay_ms, 2000);
        assert!(s.broker_token.is_none());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn from_vars_reads_prefixed_keys() {
        let s = Settings::from_vars(vars(&[
            ("PORTFOLIO_USER_ID", "u-1"),
            ("PORTFOLIO_BOARDS", "tqbr, cets,"),
            ("PORTFOLIO_REQUEST_TIMEOUT_SECS", "5"),
            ("PORTFOLIO_BROKER_TOKEN", "t.abc"),
            ("HOME", "/root"),
        ]))
        .unwrap();
        assert_eq!(s.user_id, "u-1");
        assert_eq!(s.boards, vec!["TQBR", "CETS"]);
        assert_eq!(s.request_timeout_secs, 5);
        assert_eq!(s.broker_token.as_deref(), Some("t.abc"));
    }

    #[test]
    fn blank_token_is_none() {
        let s = Settings::from_vars(vars(&[("PORTFOLIO_BROKER_TOKEN", "  ")])).unwrap();
        assert!(s.broker_token.is_none());
    }

    #[test]
    fn bad_number_is_config_error() {
        let err = Settings::from_vars(vars(&[("PORTFOLIO_ALERT_AUTO_HIDE_MS", "soon")])).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn empty_boards_rejected() {
        let err = Settings::from_vars(vars(&[("PORTFOLIO_BOARDS", " , ")])).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = Settings::from_json(r#"{"request_timeout_secs": 0}"#).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn from_json_fills_defaults() {
        let s = Settings::from_json(r#"{"user_id": "u-2", "storage_dir": "/tmp/p"}"#).unwrap();
        assert_eq!(s.user_id, "u-2");
        assert_eq!(s.moex_base_url, Settings::default().moex_base_url);
        assert!(s.storage_dir.is_some());
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            Settings::from_json("{"),
            Err(CoreError::Config(_))
        ));
    }
}
