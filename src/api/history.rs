use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::api::client::{ApiClient, Service};
use crate::api::tier::{Delivery, Operation};
use crate::shared::error::AppResult;
use crate::shared::types::{ApiResponse, ConversionHistoryItem};

const HISTORY_ENDPOINT: &str = "/api/user/conversion-history";

pub const SAVE_CONVERSION: Operation = Operation::best_effort("history.save_conversion");
pub const GET_HISTORY: Operation = Operation::critical("history.get");
pub const CLEAR_HISTORY: Operation = Operation::critical("history.clear");

/// Syncs conversion records with the user's server-side history.
pub struct HistoryService {
    client: Arc<ApiClient>,
}

impl HistoryService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn save_conversion(&self, item: &ConversionHistoryItem) -> Delivery<()> {
        let result = self
            .client
            .post::<_, Value>(Service::Gateway, HISTORY_ENDPOINT, item)
            .await
            .and_then(ApiResponse::into_optional)
            .map(|_| ());
        SAVE_CONVERSION.settle(result)
    }

    /// Server-side history. Being rate limited (HTTP 429) yields an empty list.
    pub async fn get_history(&self, limit: Option<usize>) -> AppResult<Vec<ConversionHistoryItem>> {
        let endpoint = match limit {
            Some(n) => format!("{}?limit={}", HISTORY_ENDPOINT, n),
            None => HISTORY_ENDPOINT.to_string(),
        };

        let result = async {
            self.client
                .get::<Vec<ConversionHistoryItem>>(Service::Gateway, &endpoint)
                .await?
                .into_data()
        }
        .await;

        match result {
            Err(e) if e.is_rate_limited() => {
                warn!("[HistoryService] History fetch rate limited; returning empty list");
                Ok(Vec::new())
            }
            other => GET_HISTORY.propagate(other),
        }
    }

    pub async fn clear_history(&self) -> AppResult<()> {
        let result = self
            .client
            .delete::<Value>(Service::Gateway, HISTORY_ENDPOINT)
            .await
            .and_then(ApiResponse::into_optional)
            .map(|_| ());
        CLEAR_HISTORY.propagate(result)
    }
}
