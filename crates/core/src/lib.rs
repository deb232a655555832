pub mod backend;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;
pub mod utils;

use backend::{http::HttpBackend, local::LocalBackend, traits::BackendApi};
use models::{
    analytics::{AllocationEntry, AllocationKey, Mover, MoverKind},
    dividend::DividendSchedule,
    quote::FetchOutcome,
    settings::Settings,
    unified::{AssetSummary, SortState, UnifiedAsset},
};
use providers::{moex::MoexIssProvider, tinvest::TInvestProvider, traits::BrokerProvider};
use services::{
    alert_service::AlertChannel, analytics_service::AnalyticsService,
    deposit_ledger::DepositLedger, dividend_service::DividendService,
    exchange_ledger::ExchangeLedger, market_data_service::MarketDataService,
    unified_service::UnifiedAssetsService,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storage::manager::LocalStore;
use tracing::{info, warn};

use errors::CoreError;

/// Main entry point for the portfolio tracker core library.
///
/// Constructed once at startup and shared by reference. Holds the two
/// ledgers, the market data fetcher, the unified view over them and the
/// alert channel the backend client publishes to.
#[must_use]
pub struct PortfolioTracker {
    settings: Settings,
    alerts: AlertChannel,
    market_data: Arc<MarketDataService>,
    deposits: Arc<DepositLedger>,
    exchange: Arc<ExchangeLedger>,
    unified: UnifiedAssetsService,
    analytics_service: AnalyticsService,
    dividends: Option<DividendService>,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("user_id", &self.settings.user_id)
            .field("deposits", &self.deposits.len())
            .field("exchange_assets", &self.exchange.len())
            .field("cached_quotes", &self.market_data.quotes().len())
            .field("dividends", &self.dividends.is_some())
            .finish()
    }
}

impl PortfolioTracker {
    /// Wire up the live stack described by `settings`.
    ///
    /// With `storage_dir` set the ledgers run against local JSON files,
    /// otherwise against the REST backend. Dividends are only available
    /// when a broker token is configured.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let alerts = AlertChannel::from_settings(&settings);

        let api: Arc<dyn BackendApi> = match &settings.storage_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "using local storage backend");
                Arc::new(LocalBackend::new(LocalStore::new(dir)))
            }
            None => Arc::new(HttpBackend::new(
                settings.api_base_url.clone(),
                timeout,
                Some(alerts.clone()),
            )),
        };
        let market_data = Arc::new(MarketDataService::new(
            Arc::new(MoexIssProvider::new(settings.moex_base_url.clone(), timeout)),
            settings.boards.clone(),
        ));
        let broker: Option<Arc<dyn BrokerProvider>> = match &settings.broker_token {
            Some(token) => Some(Arc::new(TInvestProvider::new(
                settings.broker_base_url.clone(),
                token.clone(),
                timeout,
            ))),
            None => None,
        };

        Ok(Self::with_components(settings, api, market_data, broker, alerts))
    }

    /// Assemble a tracker from already constructed parts.
    pub fn with_components(
        settings: Settings,
        api: Arc<dyn BackendApi>,
        market_data: Arc<MarketDataService>,
        broker: Option<Arc<dyn BrokerProvider>>,
        alerts: AlertChannel,
    ) -> Self {
        let deposits = Arc::new(DepositLedger::new(Arc::clone(&api), settings.user_id.clone()));
        let exchange = Arc::new(ExchangeLedger::new(
            api,
            Arc::clone(&market_data),
            settings.user_id.clone(),
        ));
        let unified = UnifiedAssetsService::new(Arc::clone(&deposits), Arc::clone(&exchange));
        let dividends = broker.map(|b| DividendService::new(b, settings.boards.clone()));

        Self {
            settings,
            alerts,
            market_data,
            deposits,
            exchange,
            unified,
            analytics_service: AnalyticsService::new(),
            dividends,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Load both ledgers concurrently. Both loads always run to completion;
    /// the first error is returned and the failed ledger keeps its previous
    /// list.
    pub async fn load(&self) -> Result<(), CoreError> {
        let (deposits, exchange) = tokio::join!(self.deposits.load_all(), self.exchange.load_all());
        if let Err(e) = &deposits {
            warn!(error = %e, "failed to load deposits");
        }
        if let Err(e) = &exchange {
            warn!(error = %e, "failed to load exchange assets");
        }
        deposits.and(exchange)
    }

    /// Re-price every held ticker.
    pub async fn refresh_prices(&self) -> HashMap<String, FetchOutcome> {
        self.exchange.refresh_prices().await
    }

    // ── Components ──────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn alerts(&self) -> &AlertChannel {
        &self.alerts
    }

    #[must_use]
    pub fn market_data(&self) -> &Arc<MarketDataService> {
        &self.market_data
    }

    #[must_use]
    pub fn deposits(&self) -> &Arc<DepositLedger> {
        &self.deposits
    }

    #[must_use]
    pub fn exchange(&self) -> &Arc<ExchangeLedger> {
        &self.exchange
    }

    #[must_use]
    pub fn unified(&self) -> &UnifiedAssetsService {
        &self.unified
    }

    // ── Views ───────────────────────────────────────────────────────

    pub fn all_assets(&self) -> Vec<UnifiedAsset> {
        self.unified.all_assets()
    }

    pub fn sorted_assets(&self, state: &SortState) -> Vec<UnifiedAsset> {
        self.unified.sorted(state)
    }

    pub fn summary(&self) -> AssetSummary {
        self.unified.summary()
    }

    /// Up to `limit` holdings that moved at least `threshold_percent` today.
    pub fn top_movers(&self, kind: MoverKind, threshold_percent: f64, limit: usize) -> Vec<Mover> {
        self.analytics_service.top_movers(
            &self.exchange.items(),
            &self.market_data.quotes(),
            kind,
            threshold_percent,
            limit,
        )
    }

    pub fn allocation(&self, key: AllocationKey) -> Vec<AllocationEntry> {
        self.analytics_service
            .allocation_by(&self.exchange.items(), &self.market_data.quotes(), key)
    }

    // ── Dividends ───────────────────────────────────────────────────

    pub async fn dividends_for_ticker(&self, ticker: &str) -> Result<DividendSchedule, CoreError> {
        let service = self
            .dividends
            .as_ref()
            .ok_or_else(|| CoreError::Config("broker token is not configured".into()))?;
        service.dividends_for_ticker(ticker).await
    }
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Calling it more than once is harmless.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
