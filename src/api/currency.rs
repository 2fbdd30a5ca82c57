use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::api::client::{ApiClient, Service};
use crate::api::tier::Operation;
use crate::core::rate_cache::RateCache;
use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{is_valid_code, ConvertCurrencyRequest, CurrencyConversion, CurrencyInfo, RatesSnapshot};

const CONVERT_ENDPOINT: &str = "/api/tools/unit-converter/currency";
const LIST_ENDPOINT: &str = "/api/tools/unit-converter/currency/list";
const RATES_ENDPOINT: &str = "/api/tools/unit-converter/currency/rates";

pub const CONVERT: Operation = Operation::critical("currency.convert");
pub const LIST_CURRENCIES: Operation = Operation::critical("currency.list");
pub const GET_RATES: Operation = Operation::critical("currency.rates");

pub struct CurrencyService {
    client: Arc<ApiClient>,
    cache: RateCache,
}

impl CurrencyService {
    pub fn new(client: Arc<ApiClient>, cache: RateCache) -> Self {
        Self { client, cache }
    }

    pub async fn convert(&self, request: &ConvertCurrencyRequest) -> AppResult<CurrencyConversion> {
        debug!(
            "[CurrencyService] convert called: amount={}, from={}, to={}",
            request.amount, request.from, request.to
        );
        let result = async {
            self.client
                .post::<_, CurrencyConversion>(Service::Tools, CONVERT_ENDPOINT, request)
                .await?
                .into_data()
        }
        .await;
        CONVERT.propagate(result)
    }

    pub async fn get_currencies(&self) -> AppResult<Vec<CurrencyInfo>> {
        let result = async {
            self.client
                .get::<Vec<CurrencyInfo>>(Service::Tools, LIST_ENDPOINT)
                .await?
                .into_data()
        }
        .await;
        LIST_CURRENCIES.propagate(result)
    }

    /// Rates against `base`, served from the local cache while it is fresh.
    ///
    /// The cache holds one table; it only answers for `base` if that table is
    /// quoted against it (the base maps to exactly one).
    pub async fn get_rates(&self, base: &str) -> AppResult<RatesSnapshot> {
        let base = base.trim().to_ascii_uppercase();
        if !is_valid_code(&base) {
            return Err(AppError::Validation(format!("Currency not supported: {}", base)));
        }

        if let Some(cached) = self.cache.get_cached_rates() {
            if cached.rates.get(&base) == Some(&Decimal::ONE) {
                debug!("[CurrencyService] Serving {} rates from cache", base);
                return Ok(RatesSnapshot {
                    base,
                    rates: cached.rates,
                    last_updated: cached.last_updated,
                    next_update: None,
                });
            }
        }

        let endpoint = format!("{}?base={}", RATES_ENDPOINT, urlencoding::encode(&base));
        let result = async {
            self.client
                .get::<RatesSnapshot>(Service::Tools, &endpoint)
                .await?
                .into_data()
        }
        .await;
        let mut snapshot = GET_RATES.propagate(result)?;

        snapshot.rates.insert(snapshot.base.to_ascii_uppercase(), Decimal::ONE);
        let stale_upstream = snapshot
            .next_update
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|next| next.with_timezone(&Utc) < Utc::now())
            .unwrap_or(false);
        self.cache
            .set_cached_rates(snapshot.rates.clone(), &snapshot.last_updated, stale_upstream);

        info!(
            "[CurrencyService] Fetched {} rates for {} (last updated {})",
            snapshot.rates.len(),
            snapshot.base,
            snapshot.last_updated
        );
        Ok(snapshot)
    }
}
