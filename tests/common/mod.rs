// tests/common/mod.rs — Fixtures and hand-written fakes shared by the integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use brandloop::agents::types::*;
use brandloop::agents::{BrandAnalyzer, CampaignExecutor, ContentGenerator};
use brandloop::core::types::{ProgressEvent, WorkflowInput};
use brandloop::infra::errors::BrandloopError;
use brandloop::provider::{ChatRequest, ChatResponse, ModelProvider};

pub fn input(targets: &[(&str, f64)]) -> WorkflowInput {
    WorkflowInput {
        website_url: Some("https://kettle.test".into()),
        brand_materials: vec!["Kettle Co makes smart kettles.".into()],
        campaign_brief: "Winter launch of the smart kettle".into(),
        budget: 5000.0,
        target_platforms: vec![Platform::Linkedin, Platform::Email],
        target_kpis: targets.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
}

pub fn analysis(tag: &str) -> BrandAnalysisResult {
    BrandAnalysisResult {
        analysis_id: format!("analysis-{tag}"),
        brand_profile: BrandProfile {
            brand_name: "Kettle Co".into(),
            industry: "Home appliances".into(),
            website_url: Some("https://kettle.test".into()),
            tone_of_voice: vec![Tone::Friendly],
            value_proposition: "Tea at the right temperature".into(),
            key_messages: vec!["Precise".into()],
            target_audience: TargetAudience::default(),
            brand_keywords: vec!["kettle".into()],
            competitors: vec![],
        },
        swot_analysis: SwotAnalysis::default(),
        positioning_strategy: PositioningStrategy {
            key_messages: vec![format!("message {tag}")],
            ..Default::default()
        },
        created_at: Utc::now(),
    }
}

pub fn content() -> ContentGenerationResult {
    ContentGenerationResult {
        content_assets: vec![ContentAsset {
            content_id: "c1".into(),
            platform: Platform::Linkedin,
            content_type: ContentType::Post,
            content: "Meet the kettle that knows your tea.".into(),
            headline: None,
            subject_line: None,
            cta: Some("Pre-order".into()),
            hashtags: vec!["#tea".into()],
            keywords: vec!["kettle".into()],
            visual_prompt: None,
            tone: Tone::Friendly,
            variant: 1,
            estimated_engagement_score: None,
        }],
        visual_assets: vec![],
        generation_metadata: Default::default(),
        created_at: Utc::now(),
    }
}

pub fn campaign(roi: f64) -> CampaignResult {
    CampaignResult {
        campaign_plan: CampaignPlan {
            campaign_id: uuid::Uuid::new_v4().to_string(),
            campaign_name: "Winter launch".into(),
            total_budget: 5000.0,
            budget_allocations: vec![],
            channel_strategies: vec![],
            start_date: None,
            end_date: None,
            target_kpis: BTreeMap::new(),
        },
        performance_metrics: PerformanceMetrics {
            impressions: 100_000,
            clicks: 2_000,
            ctr: 0.02,
            conversions: 40,
            conversion_rate: 0.02,
            total_cost: 5000.0,
            revenue: 5000.0 * (1.0 + roi),
            roi,
            cost_per_acquisition: 125.0,
            engagement_score: 0.5,
        },
        optimization_feedback: OptimizationFeedback {
            recommendations: vec!["Shift budget to email".into()],
            ..Default::default()
        },
        executed_at: Utc::now(),
    }
}

/// Analyzer that fails its first `failures` analyze calls with `error`.
pub struct FakeAnalyzer {
    pub analyze_calls: AtomicU32,
    pub refine_calls: AtomicU32,
    failures: AtomicU32,
    error: fn() -> BrandloopError,
}

impl FakeAnalyzer {
    pub fn ok() -> Self {
        Self::failing(0, || BrandloopError::parse("brand_profile", "unused"))
    }

    pub fn failing(failures: u32, error: fn() -> BrandloopError) -> Self {
        Self {
            analyze_calls: AtomicU32::new(0),
            refine_calls: AtomicU32::new(0),
            failures: AtomicU32::new(failures),
            error,
        }
    }
}

#[async_trait]
impl BrandAnalyzer for FakeAnalyzer {
    async fn analyze(&self, _input: &WorkflowInput) -> Result<BrandAnalysisResult, BrandloopError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err((self.error)());
        }
        Ok(analysis("initial"))
    }

    async fn refine(
        &self,
        _analysis: &BrandAnalysisResult,
        _feedback: &OptimizationFeedback,
    ) -> Result<BrandAnalysisResult, BrandloopError> {
        let n = self.refine_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(analysis(&format!("refined-{n}")))
    }
}

/// Generator that always succeeds, or always fails with a parse error.
pub struct FakeGenerator {
    pub calls: AtomicU32,
    pub seen_analysis: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeGenerator {
    pub fn ok() -> Self {
        Self {
            calls: AtomicU32::new(0),
            seen_analysis: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn broken() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(
        &self,
        analysis: &BrandAnalysisResult,
        _input: &WorkflowInput,
    ) -> Result<ContentGenerationResult, BrandloopError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_analysis
            .lock()
            .unwrap()
            .push(analysis.analysis_id.clone());
        if self.fail {
            return Err(BrandloopError::parse("platform_content", "reply was not JSON"));
        }
        Ok(content())
    }
}

/// Executor that reports the scripted ROI values in order, repeating the last.
pub struct ScriptedExecutor {
    pub calls: AtomicU32,
    rois: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
    fail: bool,
}

impl ScriptedExecutor {
    pub fn new(rois: &[f64]) -> Self {
        Self {
            calls: AtomicU32::new(0),
            rois: Mutex::new(rois.iter().copied().collect()),
            last: Mutex::new(rois.last().copied().unwrap_or(0.0)),
            fail: false,
        }
    }

    /// Every call fails with a retryable provider error.
    pub fn unavailable() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }
}

#[async_trait]
impl CampaignExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        _content: &ContentGenerationResult,
        _analysis: &BrandAnalysisResult,
        _input: &WorkflowInput,
    ) -> Result<CampaignResult, BrandloopError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BrandloopError::Provider {
                provider: "openai".into(),
                message: "HTTP 503".into(),
                retriable: true,
            });
        }
        let roi = match self.rois.lock().unwrap().pop_front() {
            Some(roi) => roi,
            None => *self.last.lock().unwrap(),
        };
        Ok(campaign(roi))
    }
}

/// Progress sink that records every event.
pub fn recorder() -> (
    impl Fn(ProgressEvent) + Send + Sync + 'static,
    Arc<Mutex<Vec<ProgressEvent>>>,
) {
    let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    (move |e: ProgressEvent| sink.lock().unwrap().push(e), events)
}

/// Model that answers each request by matching a marker in the system or
/// user prompt against a table of canned JSON replies.
pub struct ScriptedModel {
    replies: Vec<(&'static str, String)>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<(&'static str, String)>) -> Self {
        Self {
            replies,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ModelProvider for ScriptedModel {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, BrandloopError> {
        let prompt: String = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.requests.lock().unwrap().push(request);
        self.replies
            .iter()
            .find(|(marker, _)| prompt.contains(marker))
            .map(|(_, reply)| ChatResponse::text(reply.clone()))
            .ok_or_else(|| BrandloopError::Provider {
                provider: "scripted".into(),
                message: "no scripted reply for prompt".into(),
                retriable: false,
            })
    }
}
