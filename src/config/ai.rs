// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_cache_dir() -> Option<PathBuf> {
    Some(PathBuf::from("cache/generation"))
}
fn default_max_references() -> usize {
    10
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1200
}
fn default_timeout_secs() -> u64 {
    60
}

/// `[generation]` section: which backend writes the article and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// "openai" | "static" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY at startup.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Body returned by the "static" provider.
    #[serde(default)]
    pub static_body: Option<String>,
    /// Directory for the response cache; `None` disables caching.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: Option<PathBuf>,
    /// How many cluster items go into the request as references.
    #[serde(default = "default_max_references")]
    pub max_references: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            static_body: None,
            cache_dir: default_cache_dir(),
            max_references: default_max_references(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    /// Lower-case the provider, resolve "ENV" keys and repair out-of-range values.
    pub fn resolved(mut self) -> anyhow::Result<Self> {
        self.provider = self.provider.trim().to_lowercase();

        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = match self.provider.as_str() {
                "openai" => env::var("OPENAI_API_KEY").unwrap_or_default(),
                "static" => String::new(),
                other => anyhow::bail!("Unsupported generation provider in config: {other}"),
            };
        }

        if self.max_references == 0 {
            self.max_references = default_max_references();
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }

        Ok(self)
    }
}
