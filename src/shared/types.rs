use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::error::{AppError, AppResult};

// ===== Local state =====

/// Rate table persisted in the single rate-cache slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedRates {
    #[serde(with = "crate::shared::decimal::rates")]
    pub rates: HashMap<String, Decimal>,
    /// Epoch milliseconds at which the slot was written.
    pub timestamp: i64,
    pub last_updated: String,
    pub is_expired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionKind {
    Unit,
    Currency,
}

/// One logged conversion. Newest records sit at the front of the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionHistoryItem {
    #[serde(rename = "type")]
    pub kind: ConversionKind,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::shared::decimal::option"
    )]
    pub rate: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl ConversionHistoryItem {
    pub fn currency(from: impl Into<String>, to: impl Into<String>, rate: Decimal) -> Self {
        Self {
            kind: ConversionKind::Currency,
            from: from.into(),
            to: to.into(),
            category: None,
            rate: Some(rate),
            timestamp: Utc::now(),
        }
    }

    pub fn unit(from: impl Into<String>, to: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            kind: ConversionKind::Unit,
            from: from.into(),
            to: to.into(),
            category: Some(category.into()),
            rate: None,
            timestamp: Utc::now(),
        }
    }
}

// ===== Wire types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

/// Envelope every backend service answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiResponse<T> {
    /// Envelope standing in for a 2xx reply without a body.
    pub fn empty(request_id: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            request_id: request_id.into(),
            error: None,
        }
    }

    /// Turns `success: false` into an error. A missing payload is not one.
    pub fn into_optional(self) -> AppResult<Option<T>> {
        if !self.success {
            let body = self.error.unwrap_or_else(|| ApiErrorBody {
                code: "UNKNOWN".to_string(),
                message: "request failed without details".to_string(),
            });
            return Err(AppError::Api {
                code: body.code,
                message: body.message,
            });
        }
        Ok(self.data)
    }

    /// Unwraps the payload, turning `success: false` or a missing `data` into an error.
    pub fn into_data(self) -> AppResult<T> {
        let request_id = self.request_id.clone();
        self.into_optional()?.ok_or_else(|| AppError::Api {
            code: "EMPTY_RESPONSE".to_string(),
            message: format!("response {} carried no data", request_id),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertCurrencyRequest {
    #[serde(with = "crate::shared::decimal")]
    pub amount: Decimal,
    pub from: String,
    pub to: String,
}

impl ConvertCurrencyRequest {
    /// Normalizes both codes to upper case and rejects anything that is not a 3-letter code.
    pub fn new(amount: Decimal, from: &str, to: &str) -> AppResult<Self> {
        let from = from.trim().to_ascii_uppercase();
        let to = to.trim().to_ascii_uppercase();
        for code in [&from, &to] {
            if !is_valid_code(code) {
                return Err(AppError::Validation(format!("Currency not supported: {}", code)));
            }
        }
        Ok(Self { amount, from, to })
    }
}

#[inline]
pub fn is_valid_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConversion {
    pub from: String,
    pub to: String,
    #[serde(with = "crate::shared::decimal")]
    pub amount: Decimal,
    #[serde(with = "crate::shared::decimal")]
    pub result: Decimal,
    #[serde(with = "crate::shared::decimal")]
    pub rate: Decimal,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Payload of the rates endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesSnapshot {
    pub base: String,
    #[serde(with = "crate::shared::decimal::rates")]
    pub rates: HashMap<String, Decimal>,
    pub last_updated: String,
    #[serde(default)]
    pub next_update: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event: String,
    #[serde(default)]
    pub properties: Value,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AnalyticsEvent {
    pub fn new(event: impl Into<String>, properties: Value) -> Self {
        Self {
            event: event.into(),
            properties,
            timestamp: Utc::now(),
            session_id: None,
        }
    }
}

// ===== Display records =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub link_url: String,
    pub placement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub message: String,
    pub level: AnnouncementLevel,
    pub published_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub dismissible: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub plan: String,
    #[serde(default)]
    pub usage_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub href: String,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_premium: bool,
}
