use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::client::{ApiClient, Service};
use crate::api::tier::{Delivery, Operation};
use crate::shared::types::{Advertisement, AnalyticsEvent, ApiResponse, ConversionHistoryItem, ToolCard};

const TRACK_ENDPOINT: &str = "/api/analytics/track";

pub const TRACK_EVENT: Operation = Operation::best_effort("analytics.track");

/// Fire-and-forget event tracking. Nothing here ever returns an error.
pub struct AnalyticsService {
    client: Arc<ApiClient>,
    session_id: String,
}

impl AnalyticsService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn track_event(&self, mut event: AnalyticsEvent) -> Delivery<()> {
        if event.session_id.is_none() {
            event.session_id = Some(self.session_id.clone());
        }
        let result = self
            .client
            .post::<_, Value>(Service::Analytics, TRACK_ENDPOINT, &event)
            .await
            .and_then(ApiResponse::into_optional)
            .map(|_| ());
        TRACK_EVENT.settle(result)
    }

    pub async fn track_conversion(&self, item: &ConversionHistoryItem) -> Delivery<()> {
        let properties = json!({
            "type": item.kind,
            "from": item.from,
            "to": item.to,
            "category": item.category,
        });
        self.track_event(AnalyticsEvent::new("conversion", properties)).await
    }

    pub async fn track_ad_impression(&self, ad: &Advertisement) -> Delivery<()> {
        self.track_ad("ad_impression", ad).await
    }

    pub async fn track_ad_click(&self, ad: &Advertisement) -> Delivery<()> {
        self.track_ad("ad_click", ad).await
    }

    async fn track_ad(&self, name: &str, ad: &Advertisement) -> Delivery<()> {
        let properties = json!({ "adId": ad.id, "placement": ad.placement });
        self.track_event(AnalyticsEvent::new(name, properties)).await
    }

    pub async fn track_tool_open(&self, tool: &ToolCard) -> Delivery<()> {
        let properties = json!({ "toolId": tool.id, "category": tool.category });
        self.track_event(AnalyticsEvent::new("tool_open", properties)).await
    }
}
