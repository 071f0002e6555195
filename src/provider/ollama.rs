// src/provider/ollama.rs — Ollama local model provider

use async_trait::async_trait;
use std::time::Duration;

use super::{ChatRequest, ChatResponse, ModelProvider, ResponseFormat, Role, StopReason, TokenUsage};
use crate::infra::errors::BrandloopError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, BrandloopError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrandloopError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.into())
                .trim_end_matches('/')
                .to_string(),
            client,
        })
    }
}

pub(crate) fn request_body(request: &ChatRequest) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => "system",
                },
                "content": m.content,
            })
        })
        .collect();

    let mut body = serde_json::json!({
        "model": request.model,
        "messages": messages,
        "stream": false,
    });

    let mut options = serde_json::Map::new();
    if let Some(temp) = request.temperature {
        options.insert("temperature".into(), serde_json::json!(temp));
    }
    if let Some(max_tokens) = request.max_tokens {
        options.insert("num_predict".into(), serde_json::json!(max_tokens));
    }
    if !options.is_empty() {
        body["options"] = serde_json::Value::Object(options);
    }
    if request.response_format == ResponseFormat::JsonObject {
        body["format"] = serde_json::json!("json");
    }
    body
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, BrandloopError> {
        let body = request_body(&request);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| BrandloopError::Provider {
                provider: "ollama".into(),
                message: e.to_string(),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(BrandloopError::Provider {
                provider: "ollama".into(),
                message: format!("HTTP {}: {}", status, error_body),
                retriable: status.is_server_error(),
            });
        }

        let resp: serde_json::Value =
            response.json().await.map_err(|e| BrandloopError::Provider {
                provider: "ollama".into(),
                message: format!("Failed to parse response: {}", e),
                retriable: false,
            })?;

        let content = resp["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        let usage = TokenUsage {
            input_tokens: resp["prompt_eval_count"].as_u64().unwrap_or(0) as u32,
            output_tokens: resp["eval_count"].as_u64().unwrap_or(0) as u32,
        };

        Ok(ChatResponse {
            content,
            usage,
            stop_reason: StopReason::EndTurn,
        })
    }
}
