// src/core/types.rs — Workflow input, result, state and progress types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::kpi::KpiMiss;
use super::retry::RetryPolicy;
use crate::agents::types::{
    BrandAnalysisResult, CampaignResult, ContentGenerationResult, Platform,
};
use crate::infra::config::Config;
use crate::infra::errors::BrandloopError;
use crate::infra::session::SessionStore;

/// Session slots the stages write their results into.
pub mod slots {
    pub const BRAND_ANALYSIS: &str = "brand_analysis";
    pub const CONTENT_GENERATION: &str = "content_generation";
    pub const CAMPAIGN_RESULT: &str = "campaign_result";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Pending,
    AnalyzingBrand,
    GeneratingContent,
    ExecutingCampaign,
    Completed,
    Failed,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Pending => "pending",
            WorkflowState::AnalyzingBrand => "analyzing_brand",
            WorkflowState::GeneratingContent => "generating_content",
            WorkflowState::ExecutingCampaign => "executing_campaign",
            WorkflowState::Completed => "completed",
            WorkflowState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Completed | WorkflowState::Failed)
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller wants a workflow to work on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInput {
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub brand_materials: Vec<String>,
    #[serde(default)]
    pub campaign_brief: String,
    pub budget: f64,
    pub target_platforms: Vec<Platform>,
    #[serde(default)]
    pub target_kpis: BTreeMap<String, f64>,
}

impl WorkflowInput {
    pub fn validate(&self) -> Result<(), BrandloopError> {
        if let Some(ref raw) = self.website_url {
            url::Url::parse(raw).map_err(|e| {
                BrandloopError::InvalidInput(format!("website_url '{raw}' is not a valid URL: {e}"))
            })?;
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(BrandloopError::InvalidInput(format!(
                "budget must be a finite, non-negative number (got {})",
                self.budget
            )));
        }
        if self.target_platforms.is_empty() {
            return Err(BrandloopError::InvalidInput(
                "at least one target platform is required".into(),
            ));
        }
        if let Some((name, _)) = self.target_kpis.iter().find(|(_, v)| !v.is_finite()) {
            return Err(BrandloopError::InvalidInput(format!(
                "KPI target '{name}' must be a finite number"
            )));
        }
        Ok(())
    }
}

/// Outcome of one workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub session_id: String,
    pub state: WorkflowState,
    #[serde(default)]
    pub brand_analysis: Option<BrandAnalysisResult>,
    #[serde(default)]
    pub content_generation: Option<ContentGenerationResult>,
    #[serde(default)]
    pub campaign_result: Option<CampaignResult>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Feedback rounds that ran after the initial pass.
    #[serde(default)]
    pub feedback_iterations: u32,
    /// Whether the final campaign met every recognized KPI target.
    #[serde(default)]
    pub kpis_met: bool,
}

impl WorkflowResult {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            workflow_id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            state: WorkflowState::Pending,
            brand_analysis: None,
            content_generation: None,
            campaign_result: None,
            error_message: None,
            started_at: Utc::now(),
            completed_at: None,
            feedback_iterations: 0,
            kpis_met: false,
        }
    }
}

/// A workflow that ended in `Failed`. Carries the partial result and the
/// error that stopped it.
#[derive(Debug, thiserror::Error)]
#[error("workflow failed while {stage}: {source}")]
pub struct WorkflowFailure {
    pub stage: WorkflowState,
    pub result: Box<WorkflowResult>,
    #[source]
    pub source: BrandloopError,
}

/// Progress events emitted by the orchestrator at each lifecycle step.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    SessionCreated {
        session_id: String,
    },
    StateChanged {
        state: WorkflowState,
    },
    StageRetry {
        state: WorkflowState,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        error: String,
    },
    StageCompleted {
        state: WorkflowState,
    },
    FeedbackIteration {
        iteration: u32,
        max_iterations: u32,
        misses: Vec<KpiMiss>,
    },
    Complete {
        session_id: String,
        feedback_iterations: u32,
        kpis_met: bool,
    },
    Failed {
        state: WorkflowState,
        error: String,
    },
}

/// Snapshot returned by `WorkflowOrchestrator::status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub session_id: Option<String>,
    pub workflow_state: String,
    pub has_brand_analysis: bool,
    pub has_content: bool,
    pub has_campaign_results: bool,
}

impl WorkflowStatus {
    pub fn read(store: &SessionStore) -> Self {
        Self {
            session_id: store.session_id().map(str::to_string),
            workflow_state: store.workflow_state(),
            has_brand_analysis: store.contains(slots::BRAND_ANALYSIS),
            has_content: store.contains(slots::CONTENT_GENERATION),
            has_campaign_results: store.contains(slots::CAMPAIGN_RESULT),
        }
    }
}

/// Orchestrator settings, assembled from `Config` by the CLI.
#[derive(Debug, Clone)]
pub struct WorkflowEngineConfig {
    pub enable_feedback_loop: bool,
    pub max_iterations: u32,
    pub retry_feedback_stages: bool,
    pub retry: RetryPolicy,
    /// Reuse this session id instead of a time-derived one.
    pub session_id: Option<String>,
}

impl Default for WorkflowEngineConfig {
    fn default() -> Self {
        Self {
            enable_feedback_loop: true,
            max_iterations: 2,
            retry_feedback_stages: false,
            retry: RetryPolicy::default(),
            session_id: None,
        }
    }
}

impl From<&Config> for WorkflowEngineConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            enable_feedback_loop: cfg.workflow.enable_feedback_loop,
            max_iterations: cfg.workflow.max_iterations,
            retry_feedback_stages: cfg.workflow.retry_feedback_stages,
            retry: RetryPolicy::from(&cfg.retry),
            session_id: None,
        }
    }
}
