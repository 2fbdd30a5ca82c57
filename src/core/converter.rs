//! Conversion workflow.
//!
//! Performs a conversion through the backend, then records it locally and on
//! the best-effort side channels (history sync, analytics). Only the backend
//! conversion itself can fail the call.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::api::analytics::AnalyticsService;
use crate::api::client::ApiClient;
use crate::api::currency::CurrencyService;
use crate::api::history::HistoryService;
use crate::core::history::ConversionHistory;
use crate::core::rate_cache::RateCache;
use crate::core::storage::{open_or_in_memory, LocalStorage};
use crate::shared::error::AppResult;
use crate::shared::settings::{AppSettings, UserPreferences};
use crate::shared::types::{ConversionHistoryItem, ConvertCurrencyRequest, CurrencyConversion, CurrencyInfo, RatesSnapshot};

pub struct ConversionWorkflow {
    currency: CurrencyService,
    history_sync: HistoryService,
    analytics: AnalyticsService,
    history: ConversionHistory,
    storage: Arc<dyn LocalStorage>,
    preferences: UserPreferences,
}

impl ConversionWorkflow {
    pub fn new(client: Arc<ApiClient>, storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            currency: CurrencyService::new(client.clone(), RateCache::new(storage.clone())),
            history_sync: HistoryService::new(client.clone()),
            analytics: AnalyticsService::new(client),
            history: ConversionHistory::load(storage.clone()),
            storage,
            preferences: UserPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: UserPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Wires everything from settings: endpoints from env + overrides, storage at the configured path.
    pub fn from_settings(settings: &AppSettings) -> AppResult<Self> {
        let client = Arc::new(ApiClient::new(settings.endpoints())?);
        let storage = open_or_in_memory(&settings.storage_path()?);
        Ok(Self::new(client, storage).with_preferences(settings.preferences.clone()))
    }

    pub fn storage(&self) -> &Arc<dyn LocalStorage> {
        &self.storage
    }

    pub fn analytics(&self) -> &AnalyticsService {
        &self.analytics
    }

    pub async fn convert_currency(&self, amount: Decimal, from: &str, to: &str) -> AppResult<CurrencyConversion> {
        let request = ConvertCurrencyRequest::new(amount, from, to)?;
        let conversion = self.currency.convert(&request).await?;

        info!(
            "[ConversionWorkflow] {} {} -> {} {} (rate={})",
            conversion.amount, conversion.from, conversion.result, conversion.to, conversion.rate
        );

        let item = ConversionHistoryItem::currency(&conversion.from, &conversion.to, conversion.rate);
        self.record(item).await;
        Ok(conversion)
    }

    /// `(from, to)` a conversion starts from when the user has not picked one.
    pub fn default_pair(&self) -> (&str, &str) {
        (
            &self.preferences.default_currency_from,
            &self.preferences.default_currency_to,
        )
    }

    pub async fn convert_default_pair(&self, amount: Decimal) -> AppResult<CurrencyConversion> {
        let (from, to) = self.default_pair();
        self.convert_currency(amount, from, to).await
    }

    /// Logs a unit conversion computed elsewhere.
    pub async fn record_unit_conversion(&self, from: &str, to: &str, category: &str) -> ConversionHistoryItem {
        let item = ConversionHistoryItem::unit(from, to, category);
        self.record(item.clone()).await;
        item
    }

    async fn record(&self, item: ConversionHistoryItem) {
        self.history.add(item.clone());
        let (_synced, _tracked) = tokio::join!(
            self.history_sync.save_conversion(&item),
            self.analytics.track_conversion(&item)
        );
    }

    pub fn history(&self) -> Vec<ConversionHistoryItem> {
        self.history.items()
    }

    /// Clears the local log, then the server-side one.
    pub async fn clear_history(&self) -> AppResult<()> {
        self.history.clear();
        self.history_sync.clear_history().await
    }

    pub async fn remote_history(&self, limit: Option<usize>) -> AppResult<Vec<ConversionHistoryItem>> {
        self.history_sync.get_history(limit).await
    }

    pub async fn currencies(&self) -> AppResult<Vec<CurrencyInfo>> {
        self.currency.get_currencies().await
    }

    pub async fn rates(&self, base: &str) -> AppResult<RatesSnapshot> {
        self.currency.get_rates(base).await
    }
}
