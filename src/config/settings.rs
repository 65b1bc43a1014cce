use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::GatewayError;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CLASSIFY_URL: &str = "https://dummyjson.com/test";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub gateway: GatewaySettings,
    pub chat: ChatConfig,
    pub classify: ClassifyConfig,
    pub models: ModelsConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub app_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            app_name: "Captain Exoplanet".to_string(),
        }
    }
}

/// Upstream chat gateway as configured at startup.
///
/// `base_url` and `api_key` stay optional here: a missing credential is only
/// an error for the chat relay, and it is reported per request by [`GatewaySettings::resolve`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Fully resolved chat gateway configuration for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GatewaySettings {
    pub fn resolve(&self) -> Result<GatewayConfig, GatewayError> {
        let base_url = non_empty(self.base_url.as_deref()).ok_or_else(|| {
            GatewayError::Config("Missing AI gateway base URL (AI_GATEWAY_URL)".into())
        })?;
        let api_key = non_empty(self.api_key.as_deref()).ok_or_else(|| {
            GatewayError::Config(
                "Missing AI gateway API key (AI_GATEWAY_API_KEY or OPENAI_API_KEY)".into(),
            )
        })?;
        let model = non_empty(self.model.as_deref()).unwrap_or(DEFAULT_CHAT_MODEL);
        Ok(GatewayConfig {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub max_body_bytes: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    pub url: String,
    pub max_body_bytes: usize,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CLASSIFY_URL.to_string(),
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub artifacts_dir: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("data").join("pipeline").join("artifacts"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: Option<u64>,
}

impl Settings {
    /// Reads the optional config file, then applies environment overrides.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = match Self::find_config_file() {
            Some(path) => {
                let config_content = std::fs::read_to_string(&path)?;
                tracing::info!("Loaded configuration from {}", path);
                toml::from_str(&config_content)?
            }
            None => Settings::default(),
        };
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    /// Overlays environment-style values onto the settings. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| lookup(n).filter(|v| !v.trim().is_empty()))
        };

        if let Some(v) = first(&["AI_GATEWAY_URL", "OPENAI_BASE_URL"]) {
            self.gateway.base_url = Some(v);
        }
        if let Some(v) = first(&["AI_GATEWAY_API_KEY", "OPENAI_API_KEY"]) {
            self.gateway.api_key = Some(v);
        }
        if let Some(v) = first(&["AI_GATEWAY_MODEL", "OPENAI_MODEL"]) {
            self.gateway.model = Some(v);
        }
        if let Some(v) = first(&["MODEL_API_CLASSIFY"]) {
            self.classify.url = v;
        }
        if let Some(v) = first(&["MODELS_ARTIFACTS_DIR"]) {
            self.models.artifacts_dir = PathBuf::from(v);
        }
        if let Some(v) = first(&["HOST"]) {
            self.server.host = v;
        }
        if let Some(v) = first(&["PORT"]) {
            match v.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", v),
            }
        }
    }

    fn find_config_file() -> Option<String> {
        let possible_names = ["custom-config.toml", "config.toml"];

        possible_names
            .iter()
            .find(|name| Path::new(name).exists())
            .map(|name| name.to_string())
    }
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}
