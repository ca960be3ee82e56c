use super::{
    base::Provider, configs::ProviderConfig, gemini::GeminiProvider, ollama::OllamaProvider,
};
use crate::errors::ProviderResult;

/// Construct the provider selected by the configuration
pub fn get_provider(config: ProviderConfig) -> ProviderResult<Box<dyn Provider>> {
    match config {
        ProviderConfig::Gemini(gemini_config) => Ok(Box::new(GeminiProvider::new(gemini_config)?)),
        ProviderConfig::Ollama(ollama_config) => Ok(Box::new(OllamaProvider::new(ollama_config)?)),
    }
}
