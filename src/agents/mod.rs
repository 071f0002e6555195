// src/agents/mod.rs — Stage agents and the seams the orchestrator drives

pub mod brand_strategist;
pub mod campaign_manager;
pub mod creative_engine;
pub mod document;
pub mod prompts;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::types::WorkflowInput;
use crate::infra::config::LlmConfig;
use crate::infra::errors::BrandloopError;
use crate::provider::{ChatRequest, Message, ModelProvider, ResponseFormat};
use document::Document;
use types::{BrandAnalysisResult, CampaignResult, ContentGenerationResult, OptimizationFeedback};

pub const ORCHESTRATOR: &str = "orchestrator";
pub const BRAND_STRATEGIST: &str = "brand_strategist";
pub const CREATIVE_ENGINE: &str = "creative_engine";
pub const CAMPAIGN_MANAGER: &str = "campaign_manager";

/// Stage 1: brand analysis, plus refinement during the feedback loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrandAnalyzer: Send + Sync {
    async fn analyze(&self, input: &WorkflowInput) -> Result<BrandAnalysisResult, BrandloopError>;

    async fn refine(
        &self,
        analysis: &BrandAnalysisResult,
        feedback: &OptimizationFeedback,
    ) -> Result<BrandAnalysisResult, BrandloopError>;
}

/// Stage 2: platform content from a brand analysis.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        analysis: &BrandAnalysisResult,
        input: &WorkflowInput,
    ) -> Result<ContentGenerationResult, BrandloopError>;
}

/// Stage 3: plan, allocate, run (or simulate) and review a campaign.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CampaignExecutor: Send + Sync {
    async fn execute(
        &self,
        content: &ContentGenerationResult,
        analysis: &BrandAnalysisResult,
        input: &WorkflowInput,
    ) -> Result<CampaignResult, BrandloopError>;
}

/// A provider plus the request settings every agent shares.
#[derive(Clone)]
pub struct StageLlm {
    provider: Arc<dyn ModelProvider>,
    model: String,
    pub temperature: f32,
    pub creative_temperature: f32,
    max_tokens: u32,
}

impl StageLlm {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>, cfg: &LlmConfig) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: cfg.temperature,
            creative_temperature: cfg.creative_temperature,
            max_tokens: cfg.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One JSON-mode call, parsed into a `Document`. Boundary and parse
    /// errors come back untouched.
    pub async fn request_document(
        &self,
        stage: &str,
        system: &str,
        user: String,
        temperature: f32,
    ) -> Result<Document, BrandloopError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system), Message::user(user)],
            max_tokens: Some(self.max_tokens),
            temperature: Some(temperature),
            response_format: ResponseFormat::JsonObject,
        };

        let response = self.provider.chat(request).await?;
        tracing::debug!(
            stage,
            provider = self.provider.id(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "LLM reply"
        );
        Document::parse(stage, &response.content)
    }
}
