// src/agents/brand_strategist.rs — Brand profile, SWOT and positioning

use async_trait::async_trait;
use chrono::Utc;
use minijinja::context;
use std::sync::Arc;

use super::document::Document;
use super::prompts::{self, Prompts};
use super::types::{
    BrandAnalysisResult, BrandProfile, OptimizationFeedback, Platform, PositioningStrategy,
    SwotAnalysis, Tone,
};
use super::{BrandAnalyzer, StageLlm};
use crate::core::types::{slots, WorkflowInput};
use crate::infra::errors::BrandloopError;
use crate::infra::session::SharedStore;

/// Everything known about the brand before the first model call.
#[derive(Debug, Clone, Default)]
struct BrandData {
    website_url: Option<String>,
    materials: Vec<String>,
    brief: String,
}

impl BrandData {
    fn collect(input: &WorkflowInput) -> Self {
        Self {
            website_url: input.website_url.clone(),
            materials: input
                .brand_materials
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            brief: input.campaign_brief.trim().to_string(),
        }
    }
}

pub struct BrandStrategist {
    llm: StageLlm,
    prompts: Arc<Prompts>,
    store: SharedStore,
    refine_with_feedback: bool,
}

impl BrandStrategist {
    pub fn new(llm: StageLlm, prompts: Arc<Prompts>, store: SharedStore) -> Self {
        Self {
            llm,
            prompts,
            store,
            refine_with_feedback: true,
        }
    }

    /// When off, `refine` hands the analysis back unchanged.
    pub fn with_refinement(mut self, enabled: bool) -> Self {
        self.refine_with_feedback = enabled;
        self
    }

    async fn extract_profile(&self, data: &BrandData) -> Result<BrandProfile, BrandloopError> {
        tracing::info!("Extracting brand profile");
        let tones: Vec<&str> = Tone::ALL.iter().map(Tone::as_str).collect();
        let user = self.prompts.render(
            prompts::BRAND_PROFILE,
            context! {
                website_url => data.website_url,
                materials => data.materials,
                brief => data.brief,
                tones => tones,
            },
        )?;
        let doc = self
            .llm
            .request_document(
                "brand_profile",
                prompts::STRATEGIST_SYSTEM,
                user,
                self.llm.temperature,
            )
            .await?;
        Ok(BrandProfile::from_document(&doc, data.website_url.as_deref()))
    }

    async fn swot(&self, profile: &BrandProfile) -> Result<SwotAnalysis, BrandloopError> {
        tracing::info!("Performing SWOT analysis");
        let user = self
            .prompts
            .render(prompts::SWOT, context! { profile => profile })?;
        let doc = self
            .llm
            .request_document("swot", prompts::STRATEGIST_SYSTEM, user, self.llm.temperature)
            .await?;
        Ok(SwotAnalysis::from_document(&doc))
    }

    async fn positioning(
        &self,
        profile: &BrandProfile,
        swot: &SwotAnalysis,
    ) -> Result<PositioningStrategy, BrandloopError> {
        tracing::info!("Generating positioning strategy");
        let user = self.prompts.render(
            prompts::POSITIONING,
            context! {
                profile => profile,
                swot => swot,
                platforms => platform_labels(),
            },
        )?;
        let doc = self
            .llm
            .request_document(
                "positioning",
                prompts::STRATEGIST_SYSTEM,
                user,
                self.llm.temperature,
            )
            .await?;
        Ok(PositioningStrategy::from_document(&doc))
    }
}

fn platform_labels() -> Vec<&'static str> {
    Platform::ALL.iter().map(Platform::as_str).collect()
}

#[async_trait]
impl BrandAnalyzer for BrandStrategist {
    async fn analyze(&self, input: &WorkflowInput) -> Result<BrandAnalysisResult, BrandloopError> {
        let data = BrandData::collect(input);

        let brand_profile = self.extract_profile(&data).await?;
        let swot_analysis = self.swot(&brand_profile).await?;
        let positioning_strategy = self.positioning(&brand_profile, &swot_analysis).await?;

        let result = BrandAnalysisResult {
            analysis_id: uuid::Uuid::new_v4().to_string(),
            brand_profile,
            swot_analysis,
            positioning_strategy,
            created_at: Utc::now(),
        };

        self.store.save(slots::BRAND_ANALYSIS, &result)?;
        tracing::info!(
            brand = %result.brand_profile.brand_name,
            industry = %result.brand_profile.industry,
            "Brand analysis completed"
        );
        Ok(result)
    }

    async fn refine(
        &self,
        analysis: &BrandAnalysisResult,
        feedback: &OptimizationFeedback,
    ) -> Result<BrandAnalysisResult, BrandloopError> {
        if !self.refine_with_feedback || !feedback.is_actionable() {
            tracing::debug!("Nothing to refine, keeping current analysis");
            return Ok(analysis.clone());
        }

        tracing::info!("Refining positioning from campaign feedback");
        let user = self.prompts.render(
            prompts::REFINE_POSITIONING,
            context! {
                profile => analysis.brand_profile,
                positioning => analysis.positioning_strategy,
                feedback => feedback,
                platforms => platform_labels(),
            },
        )?;
        let doc: Document = self
            .llm
            .request_document(
                "refine_positioning",
                prompts::STRATEGIST_SYSTEM,
                user,
                self.llm.temperature,
            )
            .await?;

        let refined = BrandAnalysisResult {
            analysis_id: uuid::Uuid::new_v4().to_string(),
            brand_profile: analysis.brand_profile.clone(),
            swot_analysis: analysis.swot_analysis.clone(),
            positioning_strategy: analysis.positioning_strategy.revised_by(&doc),
            created_at: Utc::now(),
        };
        self.store.save(slots::BRAND_ANALYSIS, &refined)?;
        Ok(refined)
    }
}
