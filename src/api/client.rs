use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::ApiEndpoints;
use crate::shared::types::ApiResponse;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Backend services the client can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Tools,
    Analytics,
    Gateway,
}

/// JSON client for the NekoStack backends.
///
/// Built once and shared (`Arc<ApiClient>`) by the domain services.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    endpoints: ApiEndpoints,
}

impl ApiClient {
    pub fn new(endpoints: ApiEndpoints) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("nekostack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    fn url(&self, service: Service, endpoint: &str) -> String {
        let base = match service {
            Service::Tools => &self.endpoints.tools,
            Service::Analytics => &self.endpoints.analytics,
            Service::Gateway => &self.endpoints.gateway,
        };
        format!("{}/{}", base, endpoint.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, service: Service, endpoint: &str) -> AppResult<ApiResponse<T>> {
        self.send(self.request(Method::GET, service, endpoint)).await
    }

    pub async fn post<B, T>(&self, service: Service, endpoint: &str, body: &B) -> AppResult<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, service, endpoint).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, service: Service, endpoint: &str) -> AppResult<ApiResponse<T>> {
        self.send(self.request(Method::DELETE, service, endpoint)).await
    }

    fn request(&self, method: Method, service: Service, endpoint: &str) -> RequestBuilder {
        let url = self.url(service, endpoint);
        debug!("[ApiClient] {} {}", method, url);
        self.http
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<ApiResponse<T>> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Http {
                status: status.as_u16(),
                message: error_message(&text)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
            });
        }

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            debug!("[ApiClient] {} with empty body", status);
            return Ok(ApiResponse::empty(request_id));
        }

        serde_json::from_str::<ApiResponse<T>>(&body)
            .map_err(|e| AppError::Serialization(format!("Invalid response: {}", e)))
    }
}

/// Pulls `error.message` out of an error envelope, falling back to the raw body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ApiResponse<serde_json::Value>>(trimmed) {
        Ok(ApiResponse { error: Some(err), .. }) => Some(err.message),
        _ => Some(trimmed.to_string()),
    }
}
