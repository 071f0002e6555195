// src/core/orchestrator.rs — Workflow controller
//
// Drives analyze → generate → execute, each stage wrapped in the retry
// policy, then the KPI feedback loop. State is mirrored into the session
// store on every transition.

use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

use super::kpi::{self, KpiVerdict};
use super::retry::RetryPolicy;
use super::types::*;
use crate::agents::types::{BrandAnalysisResult, CampaignResult, ContentGenerationResult};
use crate::agents::{
    BrandAnalyzer, CampaignExecutor, ContentGenerator, BRAND_STRATEGIST, CAMPAIGN_MANAGER,
    CREATIVE_ENGINE, ORCHESTRATOR,
};
use crate::infra::errors::BrandloopError;
use crate::infra::session::{AgentMessage, MessageType, SharedStore, METADATA_KEY};

type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Single entry point for running a workflow.
pub struct WorkflowOrchestrator {
    analyzer: Arc<dyn BrandAnalyzer>,
    generator: Arc<dyn ContentGenerator>,
    executor: Arc<dyn CampaignExecutor>,
    store: SharedStore,
    config: WorkflowEngineConfig,
    on_progress: Option<ProgressCallback>,
}

impl WorkflowOrchestrator {
    pub fn new(
        analyzer: Arc<dyn BrandAnalyzer>,
        generator: Arc<dyn ContentGenerator>,
        executor: Arc<dyn CampaignExecutor>,
        store: SharedStore,
        config: WorkflowEngineConfig,
    ) -> Self {
        Self {
            analyzer,
            generator,
            executor,
            store,
            config,
            on_progress: None,
        }
    }

    /// Set a callback for progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Run the whole workflow in a fresh session.
    ///
    /// Success always ends in `Completed`, whether or not the KPI targets were
    /// met. Any unrecovered stage error ends in `Failed` and comes back as a
    /// `WorkflowFailure` holding the partial result.
    pub async fn execute(&self, input: &WorkflowInput) -> Result<WorkflowResult, WorkflowFailure> {
        let session_id = match self
            .store
            .with(|s| s.create_session(self.config.session_id.as_deref()))
        {
            Ok(id) => id,
            Err(e) => return Err(self.fail(WorkflowResult::new(String::new()), e)),
        };
        tracing::info!(session = %session_id, "Workflow started");
        self.emit(ProgressEvent::SessionCreated {
            session_id: session_id.clone(),
        });

        let mut result = WorkflowResult::new(session_id);
        match self.drive(input, &mut result).await {
            Ok(()) => Ok(result),
            Err(e) => Err(self.fail(result, e)),
        }
    }

    async fn drive(
        &self,
        input: &WorkflowInput,
        result: &mut WorkflowResult,
    ) -> Result<(), BrandloopError> {
        input.validate()?;
        self.record_input(input)?;

        // Stage 1: brand analysis
        self.transition(result, WorkflowState::AnalyzingBrand)?;
        self.log_message(
            ORCHESTRATOR,
            BRAND_STRATEGIST,
            MessageType::TaskRequest,
            json!({
                "stage": slots::BRAND_ANALYSIS,
                "website_url": input.website_url,
                "campaign_brief": input.campaign_brief,
            }),
        )?;
        let mut analysis = self
            .run_stage(WorkflowState::AnalyzingBrand, "brand_analysis", true, || {
                self.analyzer.analyze(input)
            })
            .await?;
        result.brand_analysis = Some(analysis.clone());
        self.stage_done(WorkflowState::AnalyzingBrand, BRAND_STRATEGIST, analysis_summary(&analysis))?;

        // Stage 2: content generation
        self.transition(result, WorkflowState::GeneratingContent)?;
        self.log_message(
            ORCHESTRATOR,
            CREATIVE_ENGINE,
            MessageType::TaskRequest,
            json!({
                "stage": slots::CONTENT_GENERATION,
                "analysis_id": analysis.analysis_id,
                "platforms": input.target_platforms,
            }),
        )?;
        let mut content = self
            .run_stage(WorkflowState::GeneratingContent, "content_generation", true, || {
                self.generator.generate(&analysis, input)
            })
            .await?;
        result.content_generation = Some(content.clone());
        self.stage_done(WorkflowState::GeneratingContent, CREATIVE_ENGINE, content_summary(&content))?;

        // Stage 3: campaign execution
        self.transition(result, WorkflowState::ExecutingCampaign)?;
        self.log_message(
            ORCHESTRATOR,
            CAMPAIGN_MANAGER,
            MessageType::TaskRequest,
            json!({
                "stage": slots::CAMPAIGN_RESULT,
                "budget": input.budget,
                "target_kpis": input.target_kpis,
            }),
        )?;
        let mut campaign = self
            .run_stage(WorkflowState::ExecutingCampaign, "campaign_execution", true, || {
                self.executor.execute(&content, &analysis, input)
            })
            .await?;
        result.campaign_result = Some(campaign.clone());
        self.stage_done(WorkflowState::ExecutingCampaign, CAMPAIGN_MANAGER, campaign_summary(&campaign))?;

        // Feedback loop: stays in ExecutingCampaign
        if self.config.enable_feedback_loop {
            let rounds = self.config.max_iterations.saturating_sub(1);
            for iteration in 1..=rounds {
                let misses = match kpi::evaluate(&input.target_kpis, &campaign.performance_metrics) {
                    KpiVerdict::Satisfied => {
                        tracing::info!("KPI targets met, feedback loop done");
                        break;
                    }
                    KpiVerdict::NeedsOptimization { misses } => misses,
                };

                tracing::info!(
                    iteration,
                    max_iterations = rounds,
                    misses = %misses.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
                    "Running feedback iteration"
                );
                self.emit(ProgressEvent::FeedbackIteration {
                    iteration,
                    max_iterations: rounds,
                    misses: misses.clone(),
                });
                self.log_message(
                    CAMPAIGN_MANAGER,
                    BRAND_STRATEGIST,
                    MessageType::Feedback,
                    json!({
                        "iteration": iteration,
                        "misses": misses,
                        "feedback": campaign.optimization_feedback,
                    }),
                )?;

                let retry = self.config.retry_feedback_stages;
                let feedback = campaign.optimization_feedback.clone();
                let state = WorkflowState::ExecutingCampaign;

                analysis = self
                    .run_stage(state, "feedback_refine", retry, || {
                        self.analyzer.refine(&analysis, &feedback)
                    })
                    .await?;
                result.brand_analysis = Some(analysis.clone());

                content = self
                    .run_stage(state, "feedback_content", retry, || {
                        self.generator.generate(&analysis, input)
                    })
                    .await?;
                result.content_generation = Some(content.clone());

                campaign = self
                    .run_stage(state, "feedback_campaign", retry, || {
                        self.executor.execute(&content, &analysis, input)
                    })
                    .await?;
                result.campaign_result = Some(campaign.clone());
                result.feedback_iterations = iteration;

                self.log_message(
                    CAMPAIGN_MANAGER,
                    ORCHESTRATOR,
                    MessageType::StatusUpdate,
                    json!({ "iteration": iteration, "result": campaign_summary(&campaign) }),
                )?;
            }
        }

        // Verdict on the campaign the caller actually gets back
        result.kpis_met = match kpi::evaluate(&input.target_kpis, &campaign.performance_metrics) {
            KpiVerdict::Satisfied => true,
            KpiVerdict::NeedsOptimization { misses } => {
                tracing::warn!(
                    misses = %misses.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
                    "KPI targets still unmet after feedback"
                );
                false
            }
        };

        self.transition(result, WorkflowState::Completed)?;
        result.completed_at = Some(chrono::Utc::now());
        tracing::info!(
            session = %result.session_id,
            feedback_iterations = result.feedback_iterations,
            kpis_met = result.kpis_met,
            "Workflow completed"
        );
        self.emit(ProgressEvent::Complete {
            session_id: result.session_id.clone(),
            feedback_iterations: result.feedback_iterations,
            kpis_met: result.kpis_met,
        });
        Ok(())
    }

    /// One stage call under the retry policy (or a single attempt when
    /// `retry` is off). Store, input and config errors are never retried.
    async fn run_stage<T, F, Fut>(
        &self,
        state: WorkflowState,
        label: &str,
        retry: bool,
        op: F,
    ) -> Result<T, BrandloopError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BrandloopError>>,
    {
        let policy = if retry {
            self.config.retry.clone()
        } else {
            RetryPolicy::none()
        };
        let max_attempts = policy.max_attempts.max(1);
        tracing::debug!(stage = label, "Stage started");

        policy
            .run_if(
                label,
                BrandloopError::is_stage_retryable,
                |attempt, delay, e| {
                    self.emit(ProgressEvent::StageRetry {
                        state,
                        attempt,
                        max_attempts,
                        delay,
                        error: e.to_string(),
                    })
                },
                op,
            )
            .await
    }

    fn transition(
        &self,
        result: &mut WorkflowResult,
        state: WorkflowState,
    ) -> Result<(), BrandloopError> {
        result.state = state;
        self.store.with(|s| s.set_workflow_state(state.as_str()))?;
        tracing::info!(state = %state, "Workflow state changed");
        self.emit(ProgressEvent::StateChanged { state });
        Ok(())
    }

    fn stage_done(
        &self,
        state: WorkflowState,
        agent: &str,
        summary: Value,
    ) -> Result<(), BrandloopError> {
        self.log_message(agent, ORCHESTRATOR, MessageType::TaskResponse, summary)?;
        self.emit(ProgressEvent::StageCompleted { state });
        Ok(())
    }

    fn log_message(
        &self,
        from: &str,
        to: &str,
        message_type: MessageType,
        payload: Value,
    ) -> Result<(), BrandloopError> {
        let message = AgentMessage::new(from, to, message_type, payload);
        self.store.with(|s| s.append_message(message))
    }

    fn record_input(&self, input: &WorkflowInput) -> Result<(), BrandloopError> {
        let metadata = json!({
            "input": input,
            "max_iterations": self.config.max_iterations,
            "feedback_loop": self.config.enable_feedback_loop,
        });
        self.store.save(METADATA_KEY, &metadata)
    }

    /// Move to `Failed`, stamp the result and wrap the error. Store writes
    /// here are best effort; the original error is what the caller sees.
    fn fail(&self, mut result: WorkflowResult, source: BrandloopError) -> WorkflowFailure {
        let stage = result.state;
        let message = source.to_string();
        tracing::error!(stage = %stage, "Workflow failed: {message}");

        result.state = WorkflowState::Failed;
        result.error_message = Some(message.clone());
        let floor = result.started_at + chrono::Duration::microseconds(1);
        result.completed_at = Some(chrono::Utc::now().max(floor));

        if !result.session_id.is_empty() {
            let mirrored = self
                .store
                .with(|s| s.set_workflow_state(WorkflowState::Failed.as_str()))
                .and_then(|_| {
                    self.log_message(
                        ORCHESTRATOR,
                        ORCHESTRATOR,
                        MessageType::Error,
                        json!({ "stage": stage.as_str(), "error": message }),
                    )
                });
            if let Err(e) = mirrored {
                tracing::warn!("Could not record failure in session: {e}");
            }
        }

        self.emit(ProgressEvent::Failed {
            state: stage,
            error: message,
        });
        WorkflowFailure {
            stage,
            result: Box::new(result),
            source,
        }
    }

    /// Current session id, workflow state and which stage results exist.
    pub fn status(&self) -> Result<WorkflowStatus, BrandloopError> {
        self.store.with(|s| Ok(WorkflowStatus::read(s)))
    }

    /// The current session as JSON.
    pub fn export_results(&self) -> Result<Value, BrandloopError> {
        self.store.with(|s| s.export_session(None))
    }
}

fn analysis_summary(a: &BrandAnalysisResult) -> Value {
    json!({
        "analysis_id": a.analysis_id,
        "brand_name": a.brand_profile.brand_name,
        "recommended_channels": a.positioning_strategy.recommended_channels,
    })
}

fn content_summary(c: &ContentGenerationResult) -> Value {
    json!({
        "content_assets": c.content_assets.len(),
        "visual_assets": c.visual_assets.len(),
    })
}

fn campaign_summary(c: &CampaignResult) -> Value {
    let m = &c.performance_metrics;
    json!({
        "campaign_id": c.campaign_plan.campaign_id,
        "roi": m.roi,
        "conversions": m.conversions,
        "ctr": m.ctr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::types::{
        OptimizationFeedback, PerformanceMetrics, Platform, PositioningStrategy, SwotAnalysis,
    };
    use crate::agents::document::Document;
    use crate::agents::types::{BrandProfile, CampaignPlan};
    use crate::agents::{MockBrandAnalyzer, MockCampaignExecutor, MockContentGenerator};
    use chrono::Utc;
    use serde_json::Map;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn analysis(id: &str) -> BrandAnalysisResult {
        BrandAnalysisResult {
            analysis_id: id.into(),
            brand_profile: BrandProfile::from_document(&Document::default(), None),
            swot_analysis: SwotAnalysis::default(),
            positioning_strategy: PositioningStrategy::default(),
            created_at: Utc::now(),
        }
    }

    fn content() -> ContentGenerationResult {
        ContentGenerationResult {
            content_assets: vec![],
            visual_assets: vec![],
            generation_metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    fn campaign(roi: f64) -> CampaignResult {
        CampaignResult {
            campaign_plan: CampaignPlan {
                campaign_id: "c".into(),
                campaign_name: "Unknown Campaign".into(),
                total_budget: 1000.0,
                budget_allocations: vec![],
                channel_strategies: vec![],
                start_date: None,
                end_date: None,
                target_kpis: BTreeMap::new(),
            },
            performance_metrics: PerformanceMetrics {
                roi,
                ..Default::default()
            },
            optimization_feedback: OptimizationFeedback::default(),
            executed_at: Utc::now(),
        }
    }

    fn input(kpis: &[(&str, f64)]) -> WorkflowInput {
        WorkflowInput {
            campaign_brief: "b".into(),
            budget: 1000.0,
            target_platforms: vec![Platform::Email],
            target_kpis: kpis.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            ..Default::default()
        }
    }

    fn config(max_iterations: u32) -> WorkflowEngineConfig {
        WorkflowEngineConfig {
            max_iterations,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: std::time::Duration::from_millis(10),
                backoff_factor: 2.0,
            },
            session_id: Some("unit".into()),
            ..Default::default()
        }
    }

    fn orchestrator(
        analyzer: MockBrandAnalyzer,
        generator: MockContentGenerator,
        executor: MockCampaignExecutor,
        cfg: WorkflowEngineConfig,
        dir: &std::path::Path,
    ) -> WorkflowOrchestrator {
        WorkflowOrchestrator::new(
            Arc::new(analyzer),
            Arc::new(generator),
            Arc::new(executor),
            SharedStore::open(dir).unwrap(),
            cfg,
        )
    }

    #[tokio::test]
    async fn test_success_without_feedback_rounds() {
        let mut analyzer = MockBrandAnalyzer::new();
        analyzer.expect_analyze().times(1).returning(|_| Ok(analysis("a1")));
        analyzer.expect_refine().times(0);
        let mut generator = MockContentGenerator::new();
        generator.expect_generate().times(1).returning(|_, _| Ok(content()));
        let mut executor = MockCampaignExecutor::new();
        executor.expect_execute().times(1).returning(|_, _, _| Ok(campaign(3.0)));

        let dir = tempfile::tempdir().unwrap();
        let states = Arc::new(Mutex::new(Vec::new()));
        let seen = states.clone();
        let orch = orchestrator(analyzer, generator, executor, config(3), dir.path())
            .with_progress(move |e| {
                if let ProgressEvent::StateChanged { state } = e {
                    seen.lock().unwrap().push(state);
                }
            });

        let result = orch.execute(&input(&[("roi", 2.0)])).await.unwrap();
        assert_eq!(result.state, WorkflowState::Completed);
        assert_eq!(result.feedback_iterations, 0);
        assert!(result.completed_at.is_some());
        assert_eq!(
            *states.lock().unwrap(),
            vec![
                WorkflowState::AnalyzingBrand,
                WorkflowState::GeneratingContent,
                WorkflowState::ExecutingCampaign,
                WorkflowState::Completed,
            ]
        );

        let status = orch.status().unwrap();
        assert_eq!(status.session_id.as_deref(), Some("unit"));
        assert_eq!(status.workflow_state, "completed");

        let messages = orch.store().with(|s| Ok(s.messages(None, Some(ORCHESTRATOR)))).unwrap();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.message_type == MessageType::TaskResponse));
    }

    #[tokio::test]
    async fn test_invalid_input_fails_without_calling_stages() {
        let mut analyzer = MockBrandAnalyzer::new();
        analyzer.expect_analyze().times(0);
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            analyzer,
            MockContentGenerator::new(),
            MockCampaignExecutor::new(),
            config(2),
            dir.path(),
        );

        let mut bad = input(&[]);
        bad.target_platforms.clear();
        let failure = orch.execute(&bad).await.unwrap_err();
        assert_eq!(failure.stage, WorkflowState::Pending);
        assert_eq!(failure.result.state, WorkflowState::Failed);
        assert!(matches!(failure.source, BrandloopError::InvalidInput(_)));
        assert!(failure.result.completed_at.unwrap() > failure.result.started_at);
        assert_eq!(orch.status().unwrap().workflow_state, "failed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_feedback_errors_are_not_retried_by_default() {
        let mut analyzer = MockBrandAnalyzer::new();
        analyzer.expect_analyze().returning(|_| Ok(analysis("a1")));
        analyzer.expect_refine().times(1).returning(|_, _| {
            Err(BrandloopError::Provider {
                provider: "mock".into(),
                message: "boom".into(),
                retriable: true,
            })
        });
        let mut generator = MockContentGenerator::new();
        generator.expect_generate().times(1).returning(|_, _| Ok(content()));
        let mut executor = MockCampaignExecutor::new();
        executor.expect_execute().times(1).returning(|_, _, _| Ok(campaign(1.5)));

        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(analyzer, generator, executor, config(2), dir.path());
        let failure = orch.execute(&input(&[("roi", 2.0)])).await.unwrap_err();
        assert_eq!(failure.stage, WorkflowState::ExecutingCampaign);
        assert!(failure.result.campaign_result.is_some());
        assert_eq!(failure.result.feedback_iterations, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_errors_are_not_retried() {
        let mut analyzer = MockBrandAnalyzer::new();
        analyzer
            .expect_analyze()
            .times(1)
            .returning(|_| Err(BrandloopError::NoActiveSession));
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(
            analyzer,
            MockContentGenerator::new(),
            MockCampaignExecutor::new(),
            config(2),
            dir.path(),
        );
        let failure = orch.execute(&input(&[])).await.unwrap_err();
        assert_eq!(failure.stage, WorkflowState::AnalyzingBrand);
        assert!(failure.result.brand_analysis.is_none());
    }
}
