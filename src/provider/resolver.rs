// src/provider/resolver.rs — Build the configured provider

use std::sync::Arc;

use super::ollama::OllamaProvider;
use super::openai::OpenAIProvider;
use super::{ModelProvider, ModelRef};
use crate::infra::config::LlmConfig;
use crate::infra::errors::BrandloopError;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Which provider and model the config points at.
///
/// A `model` written as `provider/model` with a known provider prefix
/// overrides `provider`; any other slash is part of the model name.
pub fn resolve_model(cfg: &LlmConfig) -> ModelRef {
    if let Some(r) = ModelRef::parse(&cfg.model) {
        if KNOWN_PROVIDERS.contains(&r.provider.as_str()) {
            return r;
        }
    }
    ModelRef::new(cfg.provider.clone(), cfg.model.clone())
}

fn resolve_api_key(configured: Option<&str>, from_env: Option<String>) -> Option<String> {
    configured
        .map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or(from_env.filter(|k| !k.trim().is_empty()))
}

/// Construct the provider named by `cfg`. The returned `ModelRef` carries the
/// model id to put in requests.
pub fn build_provider(
    cfg: &LlmConfig,
) -> Result<(Arc<dyn ModelProvider>, ModelRef), BrandloopError> {
    let model = resolve_model(cfg);
    let provider: Arc<dyn ModelProvider> = match model.provider.as_str() {
        "openai" => {
            let key = resolve_api_key(cfg.api_key.as_deref(), std::env::var(API_KEY_ENV).ok())
                .ok_or_else(|| {
                    BrandloopError::Config(format!(
                        "no API key: set llm.api_key or {API_KEY_ENV}"
                    ))
                })?;
            Arc::new(OpenAIProvider::new(
                key,
                cfg.base_url.clone(),
                cfg.timeout(),
            )?)
        }
        "ollama" => Arc::new(OllamaProvider::new(cfg.base_url.clone(), cfg.timeout())?),
        other => {
            return Err(BrandloopError::Config(format!(
                "unknown provider '{other}' (expected one of: {})",
                KNOWN_PROVIDERS.join(", ")
            )))
        }
    };
    tracing::debug!(model = %model, "Provider ready");
    Ok((provider, model))
}
