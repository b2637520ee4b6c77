use std::path::PathBuf;
use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};
use tracing::warn;

use crate::ai_provider::{AIConfig, AIProvider, ImageConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default = "default_being_id")]
    pub being_id: String,
    pub default_provider: String,
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub image: ImageSettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_decay_interval_secs")]
    pub decay_interval_secs: u64,
    #[serde(default = "default_dropping_delay_ms")]
    pub dropping_delay_ms: i64,
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub default_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSettings {
    pub model: String,
    pub size: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        ImageSettings {
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteStoreConfig>,
}

/// Remote document store; only used when every field is filled in
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteStoreConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl RemoteStoreConfig {
    pub fn is_complete(&self) -> bool {
        !self.base_url.trim().is_empty()
            && self.api_key.as_ref().map_or(false, |key| !key.trim().is_empty())
    }
}

fn default_being_id() -> String {
    "piyo-chan-01".to_string()
}

fn default_decay_interval_secs() -> u64 {
    60
}

fn default_dropping_delay_ms() -> i64 {
    crate::session::DEFAULT_DROPPING_DELAY_MS
}

fn default_autosave() -> bool {
    true
}

impl Config {
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(Self::default_data_dir);

        std::fs::create_dir_all(&data_dir)
            .context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");

        if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .context("Failed to read config.json")?;

            if config_str.trim().is_empty() {
                warn!(path = %config_path.display(), "config file is empty, using defaults");
            } else {
                match serde_json::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        config.data_dir = data_dir;
                        config.fill_api_key_from_env();
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to parse config.json, using defaults");
                        return Ok(Self::default_config(data_dir));
                    }
                }
            }
        }

        let config = Self::default_config(data_dir);
        config.save()?;
        Ok(config)
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nurtureverse")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.data_dir.join("config.json");
        let json_str = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(&config_path, json_str)
            .context("Failed to write config.json")?;
        Ok(())
    }

    fn default_config(data_dir: PathBuf) -> Self {
        let mut providers = HashMap::new();

        providers.insert("ollama".to_string(), ProviderConfig {
            default_model: "qwen2.5".to_string(),
            host: Some("http://localhost:11434".to_string()),
            api_key: None,
        });

        providers.insert("openai".to_string(), ProviderConfig {
            default_model: "gpt-4o-mini".to_string(),
            host: None,
            api_key: std::env::var("OPENAI_API_KEY").ok(),
        });

        Config {
            data_dir,
            being_id: default_being_id(),
            default_provider: "ollama".to_string(),
            providers,
            image: ImageSettings::default(),
            storage: StorageConfig::default(),
            decay_interval_secs: default_decay_interval_secs(),
            dropping_delay_ms: default_dropping_delay_ms(),
            autosave: default_autosave(),
        }
    }

    fn fill_api_key_from_env(&mut self) {
        if let Some(openai_config) = self.providers.get_mut("openai") {
            if openai_config.api_key.as_ref().map_or(true, |key| key.is_empty()) {
                openai_config.api_key = std::env::var("OPENAI_API_KEY").ok();
            }
        }
    }

    pub fn get_provider(&self, provider_name: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider_name)
    }

    pub fn get_ai_config(&self, provider: Option<String>, model: Option<String>) -> Result<AIConfig> {
        let provider_name = provider.as_deref().unwrap_or(&self.default_provider);
        let provider_config = self.get_provider(provider_name)
            .ok_or_else(|| anyhow::anyhow!("Unknown provider: {}", provider_name))?;

        let ai_provider: AIProvider = provider_name.parse()?;
        let model_name = model.unwrap_or_else(|| provider_config.default_model.clone());

        Ok(AIConfig {
            provider: ai_provider,
            model: model_name,
            api_key: provider_config.api_key.clone(),
            base_url: provider_config.host.clone(),
            max_tokens: Some(512),
            temperature: Some(0.9),
        })
    }

    /// Images always come from OpenAI; Ollama has no image endpoint.
    pub fn get_image_config(&self) -> ImageConfig {
        ImageConfig {
            model: self.image.model.clone(),
            size: self.image.size.clone(),
            api_key: self.get_provider("openai").and_then(|p| p.api_key.clone()),
            base_url: self.get_provider("openai").and_then(|p| p.host.clone()),
        }
    }

    /// Remote store settings, if they are complete enough to use.
    pub fn remote_store(&self) -> Option<&RemoteStoreConfig> {
        self.storage.remote.as_ref().filter(|remote| remote.is_complete())
    }

    pub fn beings_dir(&self) -> PathBuf {
        self.data_dir.join("beings")
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn dropping_delay(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.dropping_delay_ms.max(0))
    }

    pub fn decay_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.decay_interval_secs.max(1))
    }
}
