// src/agents/creative_engine.rs — Platform copy, visual prompts and A/B variants

use async_trait::async_trait;
use chrono::Utc;
use minijinja::context;
use serde::Serialize;
use serde_json::{json, Map};
use std::sync::Arc;

use super::document::{defaults, Document};
use super::prompts::{self, Prompts};
use super::types::{
    BrandAnalysisResult, ContentAsset, ContentGenerationResult, Platform, VisualAsset,
};
use super::{ContentGenerator, StageLlm};
use crate::core::types::{slots, WorkflowInput};
use crate::infra::errors::BrandloopError;
use crate::infra::session::SharedStore;
use crate::util::ellipsize;

/// Characters of copy shown to the visual prompt writer.
const VISUAL_EXCERPT_CHARS: usize = 200;

/// Per-platform writing rules fed into the content prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformGuidelines {
    pub tone: &'static str,
    pub best_practices: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_max: Option<u32>,
}

impl PlatformGuidelines {
    pub fn for_platform(platform: Platform) -> Self {
        let base = Self {
            tone: "engaging",
            best_practices: &[],
            max_length: None,
            headline_max: None,
            description_max: None,
            subject_max: None,
        };
        match platform {
            Platform::Linkedin => Self {
                tone: "professional",
                best_practices: &[
                    "Start with a hook",
                    "Use line breaks for readability",
                    "Include relevant hashtags (3-5)",
                    "End with a call-to-action",
                ],
                max_length: Some(3000),
                ..base
            },
            Platform::GoogleAds => Self {
                tone: "compelling",
                best_practices: &[
                    "Include keywords",
                    "Clear value proposition",
                    "Strong call-to-action",
                ],
                headline_max: Some(30),
                description_max: Some(90),
                ..base
            },
            Platform::Email => Self {
                tone: "personal",
                best_practices: &[
                    "Personalized subject line",
                    "Clear value in first paragraph",
                    "Single clear CTA",
                    "Mobile-friendly format",
                ],
                subject_max: Some(50),
                ..base
            },
            Platform::Facebook => Self {
                tone: "engaging",
                best_practices: &[
                    "Visual-first approach",
                    "Emotional connection",
                    "Encourage engagement",
                ],
                max_length: Some(500),
                ..base
            },
            Platform::Instagram => Self {
                tone: "visual",
                best_practices: &[
                    "Strong visual component",
                    "Storytelling",
                    "Hashtags (10-30)",
                    "First line is crucial",
                ],
                max_length: Some(2200),
                ..base
            },
            Platform::Twitter => Self {
                tone: "concise",
                best_practices: &[
                    "Lead with the point",
                    "One or two hashtags",
                    "Single clear CTA",
                ],
                max_length: Some(280),
                ..base
            },
        }
    }
}

/// How far an A/B variant may drift from its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariationLevel {
    Minor = 1,
    Restructured = 2,
    NewAngle = 3,
}

impl VariationLevel {
    pub fn instruction(&self) -> &'static str {
        match self {
            VariationLevel::Minor => {
                "Make minor adjustments to wording while keeping the same structure and message"
            }
            VariationLevel::Restructured => {
                "Restructure the content with a different approach while maintaining the core message"
            }
            VariationLevel::NewAngle => {
                "Create a significantly different version with a new angle or hook"
            }
        }
    }
}

impl TryFrom<u8> for VariationLevel {
    type Error = BrandloopError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(VariationLevel::Minor),
            2 => Ok(VariationLevel::Restructured),
            3 => Ok(VariationLevel::NewAngle),
            other => Err(BrandloopError::InvalidInput(format!(
                "variation level must be 1, 2 or 3 (got {other})"
            ))),
        }
    }
}

pub struct CreativeEngine {
    llm: StageLlm,
    prompts: Arc<Prompts>,
    store: SharedStore,
    num_variants: u32,
}

impl CreativeEngine {
    pub fn new(llm: StageLlm, prompts: Arc<Prompts>, store: SharedStore) -> Self {
        Self {
            llm,
            prompts,
            store,
            num_variants: 1,
        }
    }

    /// Assets per platform. Zero is treated as one.
    pub fn with_variants(mut self, n: u32) -> Self {
        self.num_variants = n.max(1);
        self
    }

    async fn platform_content(
        &self,
        analysis: &BrandAnalysisResult,
        brief: &str,
        platform: Platform,
        variant: u32,
    ) -> Result<ContentAsset, BrandloopError> {
        let profile = &analysis.brand_profile;
        let positioning = &analysis.positioning_strategy;
        // Positioning wins so refined messaging reaches the next round.
        let key_messages = if positioning.key_messages.is_empty() {
            &profile.key_messages
        } else {
            &positioning.key_messages
        };

        let user = self.prompts.render(
            prompts::PLATFORM_CONTENT,
            context! {
                platform => platform.as_str(),
                profile => profile,
                key_messages => key_messages,
                themes => positioning.content_themes,
                brief => brief,
                variant => variant,
                guidelines => PlatformGuidelines::for_platform(platform),
            },
        )?;
        let doc = self
            .llm
            .request_document(
                "platform_content",
                &prompts::platform_system_prompt(platform),
                user,
                self.llm.creative_temperature,
            )
            .await?;

        Ok(ContentAsset {
            content_id: uuid::Uuid::new_v4().to_string(),
            platform,
            content_type: platform.content_type(),
            content: doc.text("content", ""),
            headline: doc.opt_text("headline"),
            subject_line: doc.opt_text("subject_line"),
            cta: doc.opt_text("cta"),
            hashtags: doc.list("hashtags"),
            keywords: profile.brand_keywords.clone(),
            visual_prompt: doc.opt_text("visual_prompt"),
            tone: profile.primary_tone(),
            variant,
            estimated_engagement_score: None,
        })
    }

    async fn visual_for(
        &self,
        asset: &ContentAsset,
        analysis: &BrandAnalysisResult,
    ) -> Result<VisualAsset, BrandloopError> {
        let user = self.prompts.render(
            prompts::VISUAL_PROMPT,
            context! {
                profile => analysis.brand_profile,
                platform => asset.platform.as_str(),
                excerpt => ellipsize(&asset.content, VISUAL_EXCERPT_CHARS),
            },
        )?;
        let doc = self
            .llm
            .request_document(
                "visual_prompt",
                prompts::VISUAL_SYSTEM,
                user,
                self.llm.temperature,
            )
            .await?;

        Ok(VisualAsset {
            asset_id: uuid::Uuid::new_v4().to_string(),
            content_id: Some(asset.content_id.clone()),
            prompt: doc.text("prompt", ""),
            generated_url: None,
            local_path: None,
            style: doc.text("style", defaults::VISUAL_STYLE),
        })
    }

    /// Rewrite `base` for A/B testing. `level` is 1 (wording), 2
    /// (structure) or 3 (new angle).
    pub async fn generate_variant(
        &self,
        base: &ContentAsset,
        level: u8,
    ) -> Result<ContentAsset, BrandloopError> {
        let level = VariationLevel::try_from(level)?;
        tracing::info!(platform = %base.platform, level = level as u8, "Generating content variant");

        let user = self.prompts.render(
            prompts::CONTENT_VARIANT,
            context! {
                asset => base,
                instruction => level.instruction(),
            },
        )?;
        let doc: Document = self
            .llm
            .request_document(
                "content_variant",
                prompts::VARIANT_SYSTEM,
                user,
                self.llm.creative_temperature,
            )
            .await?;

        Ok(ContentAsset {
            content_id: uuid::Uuid::new_v4().to_string(),
            platform: base.platform,
            content_type: base.content_type,
            content: doc.text("content", ""),
            headline: doc.opt_text("headline"),
            subject_line: None,
            cta: doc.opt_text("cta"),
            hashtags: doc.list("hashtags"),
            keywords: base.keywords.clone(),
            visual_prompt: None,
            tone: base.tone,
            variant: base.variant + level as u32,
            estimated_engagement_score: None,
        })
    }
}

#[async_trait]
impl ContentGenerator for CreativeEngine {
    async fn generate(
        &self,
        analysis: &BrandAnalysisResult,
        input: &WorkflowInput,
    ) -> Result<ContentGenerationResult, BrandloopError> {
        let mut content_assets = Vec::new();
        let mut visual_assets = Vec::new();

        for &platform in &input.target_platforms {
            tracing::info!(%platform, variants = self.num_variants, "Generating content");
            for variant in 0..self.num_variants {
                let mut asset = self
                    .platform_content(analysis, &input.campaign_brief, platform, variant)
                    .await?;

                if platform.has_visual() {
                    let visual = self.visual_for(&asset, analysis).await?;
                    if !visual.prompt.is_empty() {
                        asset.visual_prompt = Some(visual.prompt.clone());
                    }
                    visual_assets.push(visual);
                }
                content_assets.push(asset);
            }
        }

        let mut generation_metadata = Map::new();
        generation_metadata.insert("num_platforms".into(), json!(input.target_platforms.len()));
        generation_metadata.insert("num_variants".into(), json!(self.num_variants));
        generation_metadata.insert("total_assets".into(), json!(content_assets.len()));

        let result = ContentGenerationResult {
            content_assets,
            visual_assets,
            generation_metadata,
            created_at: Utc::now(),
        };

        self.store.save(slots::CONTENT_GENERATION, &result)?;
        tracing::info!(
            assets = result.content_assets.len(),
            visuals = result.visual_assets.len(),
            "Content generation completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::types::{
        BrandProfile, PositioningStrategy, SwotAnalysis, TargetAudience, Tone,
    };
    use crate::infra::config::LlmConfig;
    use crate::provider::{ChatResponse, MockModelProvider};
    use pretty_assertions::assert_eq;

    fn engine(mock: MockModelProvider, dir: &std::path::Path) -> CreativeEngine {
        let store = SharedStore::open(dir).unwrap();
        store.with(|s| s.create_session(Some("t"))).unwrap();
        CreativeEngine::new(
            StageLlm::new(Arc::new(mock), "m", &LlmConfig::default()),
            Arc::new(Prompts::new().unwrap()),
            store,
        )
    }

    fn analysis() -> BrandAnalysisResult {
        BrandAnalysisResult {
            analysis_id: "a1".into(),
            brand_profile: BrandProfile {
                brand_name: "Acme".into(),
                industry: "Tools".into(),
                website_url: None,
                tone_of_voice: vec![Tone::Friendly],
                value_proposition: "Better hammers".into(),
                key_messages: vec!["profile message".into()],
                target_audience: TargetAudience::default(),
                brand_keywords: vec!["hammer".into()],
                competitors: vec![],
            },
            swot_analysis: SwotAnalysis::default(),
            positioning_strategy: PositioningStrategy {
                key_messages: vec!["positioned message".into()],
                ..Default::default()
            },
            created_at: Utc::now(),
        }
    }

    fn input(platforms: Vec<Platform>) -> WorkflowInput {
        WorkflowInput {
            campaign_brief: "Spring launch".into(),
            budget: 1000.0,
            target_platforms: platforms,
            ..Default::default()
        }
    }

    #[test]
    fn test_guidelines_table() {
        let ads = PlatformGuidelines::for_platform(Platform::GoogleAds);
        assert_eq!(ads.headline_max, Some(30));
        assert_eq!(ads.description_max, Some(90));
        assert_eq!(ads.max_length, None);
        assert_eq!(PlatformGuidelines::for_platform(Platform::Email).subject_max, Some(50));
        assert_eq!(PlatformGuidelines::for_platform(Platform::Linkedin).max_length, Some(3000));
        assert_eq!(PlatformGuidelines::for_platform(Platform::Twitter).tone, "concise");
    }

    #[test]
    fn test_variation_level_bounds() {
        assert_eq!(VariationLevel::try_from(2).unwrap(), VariationLevel::Restructured);
        assert!(matches!(
            VariationLevel::try_from(4),
            Err(BrandloopError::InvalidInput(_))
        ));
        assert!(VariationLevel::try_from(0).is_err());
    }

    #[tokio::test]
    async fn test_generate_assets_and_visuals() {
        let mut mock = MockModelProvider::new();
        mock.expect_id().return_const("mock".to_string());
        mock.expect_chat()
            .withf(|r| r.messages[1].content.starts_with("Create a detailed image generation prompt"))
            .times(2)
            .returning(|r| {
                assert_eq!(r.temperature, Some(0.7));
                Ok(ChatResponse::text(r#"{"prompt": "a bright workshop"}"#))
            });
        mock.expect_chat()
            .withf(|r| r.messages[1].content.starts_with("Generate marketing content"))
            .times(3)
            .returning(|r| {
                assert_eq!(r.temperature, Some(0.8));
                assert!(r.messages[1].content.contains("positioned message"));
                Ok(ChatResponse::text(
                    r##"{"content": "Hammer time", "cta": "Shop now", "hashtags": ["#tools"]}"##,
                ))
            });

        let dir = tempfile::tempdir().unwrap();
        let engine = engine(mock, dir.path());
        let result = engine
            .generate(
                &analysis(),
                &input(vec![Platform::Linkedin, Platform::Email, Platform::Instagram]),
            )
            .await
            .unwrap();

        assert_eq!(result.content_assets.len(), 3);
        assert_eq!(result.visual_assets.len(), 2);
        assert_eq!(result.generation_metadata["total_assets"], 3);
        assert_eq!(result.generation_metadata["num_platforms"], 3);

        let linkedin = &result.content_assets[0];
        assert_eq!(linkedin.cta.as_deref(), Some("Shop now"));
        assert_eq!(linkedin.tone, Tone::Friendly);
        assert_eq!(linkedin.keywords, vec!["hammer"]);
        assert_eq!(linkedin.visual_prompt.as_deref(), Some("a bright workshop"));
        assert_eq!(
            result.visual_assets[0].content_id.as_deref(),
            Some(linkedin.content_id.as_str())
        );
        assert_eq!(result.visual_assets[0].style, "professional");
        assert_eq!(result.content_assets[1].visual_prompt, None);

        let saved: Option<ContentGenerationResult> = engine
            .store
            .with(|s| s.get_as(slots::CONTENT_GENERATION))
            .unwrap();
        assert_eq!(saved.unwrap(), result);
    }

    #[tokio::test]
    async fn test_empty_visual_reply_keeps_model_visual_prompt() {
        let mut mock = MockModelProvider::new();
        mock.expect_id().return_const("mock".to_string());
        mock.expect_chat()
            .withf(|r| r.messages[1].content.starts_with("Create a detailed image generation prompt"))
            .times(1)
            .returning(|_| Ok(ChatResponse::text(r#"{"style": "bold"}"#)));
        mock.expect_chat()
            .withf(|r| r.messages[1].content.starts_with("Generate marketing content"))
            .times(1)
            .returning(|_| {
                Ok(ChatResponse::text(
                    r#"{"content": "Hammer time", "visual_prompt": "hammer on oak"}"#,
                ))
            });

        let dir = tempfile::tempdir().unwrap();
        let engine = engine(mock, dir.path());
        let result = engine
            .generate(&analysis(), &input(vec![Platform::Instagram]))
            .await
            .unwrap();

        assert_eq!(
            result.content_assets[0].visual_prompt.as_deref(),
            Some("hammer on oak")
        );
        assert_eq!(result.visual_assets[0].prompt, "");
        assert_eq!(result.visual_assets[0].style, "bold");
    }

    #[tokio::test]
    async fn test_variants_per_platform() {
        let mut mock = MockModelProvider::new();
        mock.expect_id().return_const("mock".to_string());
        mock.expect_chat()
            .times(2)
            .returning(|_| Ok(ChatResponse::text(r#"{"subject_line": "Hi", "content": "Body"}"#)));

        let dir = tempfile::tempdir().unwrap();
        let engine = engine(mock, dir.path()).with_variants(2);
        let result = engine
            .generate(&analysis(), &input(vec![Platform::Email]))
            .await
            .unwrap();

        let variants: Vec<u32> = result.content_assets.iter().map(|a| a.variant).collect();
        assert_eq!(variants, vec![0, 1]);
        assert_eq!(result.content_assets[0].subject_line.as_deref(), Some("Hi"));
        assert!(result.visual_assets.is_empty());
    }

    #[tokio::test]
    async fn test_generate_variant() {
        let mut mock = MockModelProvider::new();
        mock.expect_id().return_const("mock".to_string());
        mock.expect_chat()
            .withf(|r| {
                r.messages[0].content == prompts::VARIANT_SYSTEM
                    && r.messages[1].content.contains("new angle or hook")
            })
            .times(1)
            .returning(|_| Ok(ChatResponse::text(r#"{"content": "Fresh take", "cta": "Try it"}"#)));

        let dir = tempfile::tempdir().unwrap();
        let engine = engine(mock, dir.path());
        let base = ContentAsset {
            content_id: "c1".into(),
            platform: Platform::Facebook,
            content_type: Platform::Facebook.content_type(),
            content: "Original".into(),
            headline: None,
            subject_line: None,
            cta: None,
            hashtags: vec![],
            keywords: vec!["hammer".into()],
            visual_prompt: None,
            tone: Tone::Playful,
            variant: 0,
            estimated_engagement_score: None,
        };

        let v = engine.generate_variant(&base, 3).await.unwrap();
        assert_ne!(v.content_id, base.content_id);
        assert_eq!(v.content, "Fresh take");
        assert_eq!(v.tone, Tone::Playful);
        assert_eq!(v.keywords, base.keywords);
        assert_eq!(v.variant, 3);

        assert!(engine.generate_variant(&base, 7).await.is_err());
    }
}
