use config::{Config, ConfigError, Environment};
use peon::agent::DEFAULT_MAX_STEPS;
use peon::providers::{
    configs::{GeminiProviderConfig, OllamaProviderConfig, ProviderConfig},
    gemini, ollama,
};
use serde::Deserialize;

/// Settings read from the environment, with `.env` already applied
#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_gemini_host")]
    pub gemini_host: String,
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default)]
    pub ollama_api_key: Option<String>,
    /// Replaces the built-in system prompt when set
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("gemini_model", default_gemini_model())?
            .set_default("gemini_host", default_gemini_host())?
            .set_default("ollama_base_url", default_ollama_base_url())?
            .set_default("ollama_model", default_ollama_model())?
            .set_default("max_steps", default_max_steps() as u64)?
            // Layer on the environment variables
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        let result: Result<Self, ConfigError> = config.try_deserialize();
        if let Err(err) = &result {
            tracing::debug!("Configuration error: {:?}", err);
        }
        result
    }

    /// Gemini needs a credential; a blank one counts as missing
    pub fn gemini_config(&self) -> Result<ProviderConfig, ConfigError> {
        let api_key = self
            .gemini_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::NotFound("GEMINI_API_KEY".to_string()))?;

        Ok(ProviderConfig::Gemini(GeminiProviderConfig {
            host: self.gemini_host.clone(),
            api_key,
            model: self.gemini_model.clone(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }))
    }

    pub fn ollama_config(&self) -> ProviderConfig {
        ProviderConfig::Ollama(OllamaProviderConfig {
            host: self.ollama_base_url.clone(),
            model: self.ollama_model.clone(),
            api_key: self.ollama_api_key.clone(),
            temperature: None,
            max_tokens: None,
        })
    }
}

fn default_gemini_model() -> String {
    gemini::GEMINI_MODEL.to_string()
}

fn default_gemini_host() -> String {
    gemini::GEMINI_HOST.to_string()
}

fn default_ollama_base_url() -> String {
    ollama::OLLAMA_HOST.to_string()
}

fn default_ollama_model() -> String {
    ollama::OLLAMA_MODEL.to_string()
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}
