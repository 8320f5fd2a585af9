//! Wiring of configuration, rate source, cache and converter.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use travelfx_core::budget::{BudgetError, BudgetSettings, TripBudgetModel};
use travelfx_core::currency::{CurrencyConverter, RateCache, RateSource, SupportedCurrencies};
use travelfx_rates::{HttpRateSource, RatesError, SnapshotStore};
use travelfx_shared::{AppConfig, CurrencyCode};

/// Everything a command needs, built once per run.
pub struct App {
    config: AppConfig,
    cache: Arc<RateCache>,
    converter: Arc<CurrencyConverter>,
    snapshot: Option<SnapshotStore>,
}

impl App {
    /// Builds the app around the configured HTTP provider.
    pub fn new(config: AppConfig) -> Result<Self, RatesError> {
        let source = HttpRateSource::from_config(&config.rates)?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Builds the app around any rate source.
    pub fn with_source(config: AppConfig, source: Arc<dyn RateSource>) -> Self {
        let cache = Arc::new(RateCache::new(source));
        let supported = SupportedCurrencies::new(config.budget.supported_currencies.iter().copied());
        let converter = Arc::new(CurrencyConverter::new(Arc::clone(&cache), supported));
        let snapshot = config.rates.snapshot_path.clone().map(SnapshotStore::new);

        Self {
            config,
            cache,
            converter,
            snapshot,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    /// Freshness window for every conversion in this run.
    pub fn max_age(&self) -> Duration {
        self.config.rates.cache_max_age()
    }

    /// Creates an empty trip budget, optionally overriding the base currency.
    pub fn budget_model(&self, base: Option<CurrencyCode>) -> Result<TripBudgetModel, BudgetError> {
        let mut settings = BudgetSettings::from_config(&self.config.budget, &self.config.rates);
        if let Some(base) = base {
            settings.base_currency = base;
        }
        TripBudgetModel::new(Arc::clone(&self.converter), settings)
    }

    /// Seeds the cache from the snapshot file, if one is configured.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn load_snapshot(&self) {
        let Some(store) = &self.snapshot else {
            return;
        };
        match store.restore_into(&self.cache) {
            Ok(count) => debug!(entries = count, "Rate snapshot loaded"),
            Err(err) => warn!(error = %err, "Ignoring unreadable rate snapshot"),
        }
    }

    /// Writes the cache to the snapshot file, if one is configured.
    pub fn save_snapshot(&self) {
        let Some(store) = &self.snapshot else {
            return;
        };
        if let Err(err) = store.persist_from(&self.cache) {
            warn!(error = %err, "Failed to save rate snapshot");
        }
    }
}
