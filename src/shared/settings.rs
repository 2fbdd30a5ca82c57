use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::shared::error::{AppError, AppResult};

pub const TOOLS_API_ENV: &str = "NEXT_PUBLIC_TOOLS_API_URL";
pub const ANALYTICS_API_ENV: &str = "NEXT_PUBLIC_ANALYTICS_API_URL";
pub const GATEWAY_API_ENV: &str = "NEXT_PUBLIC_API_GATEWAY_URL";

const DEFAULT_TOOLS_URL: &str = "http://localhost:8001";
const DEFAULT_ANALYTICS_URL: &str = "http://localhost:8002";
const DEFAULT_GATEWAY_URL: &str = "http://localhost:8000";

/// Base URLs of the backend services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    pub tools: String,
    pub analytics: String,
    pub gateway: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            tools: DEFAULT_TOOLS_URL.to_string(),
            analytics: DEFAULT_ANALYTICS_URL.to_string(),
            gateway: DEFAULT_GATEWAY_URL.to_string(),
        }
    }
}

impl ApiEndpoints {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves each URL through `lookup`, falling back to the localhost defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, fallback: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            tools: pick(TOOLS_API_ENV, DEFAULT_TOOLS_URL),
            analytics: pick(ANALYTICS_API_ENV, DEFAULT_ANALYTICS_URL),
            gateway: pick(GATEWAY_API_ENV, DEFAULT_GATEWAY_URL),
        }
        .normalized()
    }

    fn normalized(mut self) -> Self {
        for url in [&mut self.tools, &mut self.analytics, &mut self.gateway] {
            while url.ends_with('/') {
                url.pop();
            }
        }
        self
    }
}

/// Per-service overrides stored in the settings file. Empty means "use the environment".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointOverrides {
    #[serde(default)]
    pub tools: Option<String>,
    #[serde(default)]
    pub analytics: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
}

/// Currency pair a fresh conversion starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub default_currency_from: String,
    pub default_currency_to: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_currency_from: "USD".to_string(),
            default_currency_to: "EUR".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub endpoints: EndpointOverrides,
    #[serde(default)]
    pub preferences: UserPreferences,
    /// Location of the local state database. `None` uses the platform data directory.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            endpoints: EndpointOverrides::default(),
            preferences: UserPreferences::default(),
            storage_path: None,
        }
    }
}

impl AppSettings {
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "nekostack", "nekostack")
            .ok_or_else(|| AppError::Config("Failed to determine project directories".to_string()))
    }

    pub fn default_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("settings.json"))
    }

    /// Database path: the configured one, else `<data dir>/local_state.redb`.
    pub fn storage_path(&self) -> AppResult<PathBuf> {
        match &self.storage_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("local_state.redb")),
        }
    }

    /// Loads settings, writing the defaults first if the file does not exist yet.
    pub async fn load_from(path: &Path) -> AppResult<Self> {
        if !fs::try_exists(path).await? {
            let settings = Self::default();
            settings.save_to(path).await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse settings: {}", e)))
    }

    pub async fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Io(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| AppError::Io(format!("Failed to write settings file: {}", e)))
    }

    /// Environment endpoints with the file overrides layered on top.
    pub fn endpoints(&self) -> ApiEndpoints {
        let env = ApiEndpoints::from_env();
        let o = &self.endpoints;
        ApiEndpoints {
            tools: o.tools.clone().unwrap_or(env.tools),
            analytics: o.analytics.clone().unwrap_or(env.analytics),
            gateway: o.gateway.clone().unwrap_or(env.gateway),
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_endpoints_fall_back_to_defaults() {
        let endpoints = ApiEndpoints::from_lookup(|_| None);
        assert_eq!(endpoints, ApiEndpoints::default());
    }

    #[test]
    fn test_endpoints_trim_trailing_slash() {
        let vars = HashMap::from([
            (TOOLS_API_ENV, "https://tools.nekostack.dev/"),
            (ANALYTICS_API_ENV, "  "),
        ]);
        let endpoints = ApiEndpoints::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(endpoints.tools, "https://tools.nekostack.dev");
        assert_eq!(endpoints.analytics, DEFAULT_ANALYTICS_URL);
        assert_eq!(endpoints.gateway, DEFAULT_GATEWAY_URL);
    }

    #[test]
    fn test_overrides_win_over_environment() {
        let settings = AppSettings {
            endpoints: EndpointOverrides {
                gateway: Some("https://gw.example.com//".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(settings.endpoints().gateway, "https://gw.example.com");
    }

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let loaded = AppSettings::load_from(&path).await.unwrap();
        assert_eq!(loaded, AppSettings::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = AppSettings::default();
        settings.preferences.default_currency_to = "JPY".to_string();
        settings.save_to(&path).await.unwrap();

        let loaded = AppSettings::load_from(&path).await.unwrap();
        assert_eq!(loaded.preferences.default_currency_to, "JPY");
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = AppSettings::load_from(&path).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
