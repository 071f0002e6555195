// src/cli/run.rs — `brandloop run`: assemble the agents and execute a workflow

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

use super::progress::terminal_progress;
use super::RunArgs;
use crate::agents::brand_strategist::BrandStrategist;
use crate::agents::campaign_manager::CampaignManager;
use crate::agents::creative_engine::CreativeEngine;
use crate::agents::prompts::Prompts;
use crate::agents::StageLlm;
use crate::core::orchestrator::WorkflowOrchestrator;
use crate::core::types::{WorkflowEngineConfig, WorkflowInput, WorkflowResult};
use crate::infra::config::Config;
use crate::infra::session::SharedStore;
use crate::provider::resolver;

/// Execute one workflow and print its outcome.
pub async fn run_workflow(args: RunArgs, config: &Config) -> anyhow::Result<()> {
    let input = build_input(&args, config)?;
    let engine_config = engine_config(&args, config);

    let store = SharedStore::open(config.storage.sessions_dir())?;
    let (provider, model_ref) = resolver::build_provider(&config.llm)?;
    let llm = StageLlm::new(provider, model_ref.model.clone(), &config.llm);
    let prompts = Arc::new(Prompts::new()?);

    let strategist = BrandStrategist::new(llm.clone(), prompts.clone(), store.clone())
        .with_refinement(config.workflow.refine_with_feedback);
    let creative = CreativeEngine::new(llm.clone(), prompts.clone(), store.clone())
        .with_variants(args.variants.unwrap_or(config.workflow.num_variants));
    let campaign = CampaignManager::new(llm, prompts, store.clone())
        .with_average_order_value(config.campaign.average_order_value);

    let mut orchestrator = WorkflowOrchestrator::new(
        Arc::new(strategist),
        Arc::new(creative),
        Arc::new(campaign),
        store,
        engine_config,
    );
    if !args.quiet {
        orchestrator = orchestrator.with_progress(terminal_progress());
    }

    tracing::info!(model = %model_ref, platforms = input.target_platforms.len(), "Running workflow");

    match orchestrator.execute(&input).await {
        Ok(result) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
            Ok(())
        }
        Err(failure) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&failure.result)?);
            }
            Err(anyhow::Error::new(failure.source).context(format!(
                "workflow failed while {} (session {})",
                failure.stage, failure.result.session_id
            )))
        }
    }
}

/// Start from `--input` when given, then let flags override its fields.
pub fn build_input(args: &RunArgs, config: &Config) -> anyhow::Result<WorkflowInput> {
    let mut input = match args.input {
        Some(ref path) => read_input_file(path)?,
        None => WorkflowInput {
            budget: config.campaign.default_budget,
            ..Default::default()
        },
    };

    if let Some(ref brief) = args.brief {
        input.campaign_brief = brief.clone();
    }
    if let Some(budget) = args.budget {
        input.budget = budget;
    }
    if !args.platforms.is_empty() {
        input.target_platforms = args.platforms.clone();
    }
    if let Some(ref url) = args.url {
        input.website_url = Some(url.clone());
    }
    for (name, target) in &args.kpis {
        input.target_kpis.insert(name.clone(), *target);
    }
    for path in &args.materials {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading brand material {}", path.display()))?;
        input.brand_materials.push(text);
    }

    Ok(input)
}

fn read_input_file(path: &Path) -> anyhow::Result<WorkflowInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading workflow input {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let input = if is_yaml {
        serde_yml::from_str(&content)
            .with_context(|| format!("parsing YAML input {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("parsing JSON input {}", path.display()))?
    };
    Ok(input)
}

pub fn engine_config(args: &RunArgs, config: &Config) -> WorkflowEngineConfig {
    let mut engine = WorkflowEngineConfig::from(config);
    if args.no_feedback {
        engine.enable_feedback_loop = false;
    }
    if let Some(n) = args.max_iterations {
        engine.max_iterations = n;
    }
    engine.session_id = args.session_id.clone();
    engine
}

fn print_summary(result: &WorkflowResult) {
    println!("Session:   {}", result.session_id);
    println!("Workflow:  {}", result.workflow_id);
    println!("State:     {}", result.state);
    if let Some(ref analysis) = result.brand_analysis {
        println!(
            "Brand:     {} ({})",
            analysis.brand_profile.brand_name, analysis.brand_profile.industry
        );
    }
    if let Some(ref content) = result.content_generation {
        println!(
            "Content:   {} asset(s), {} visual(s)",
            content.content_assets.len(),
            content.visual_assets.len()
        );
    }
    if let Some(ref campaign) = result.campaign_result {
        let m = &campaign.performance_metrics;
        println!(
            "Campaign:  impressions={} clicks={} conversions={} ctr={:.4} roi={:.2}",
            m.impressions, m.clicks, m.conversions, m.ctr, m.roi
        );
        for rec in &campaign.optimization_feedback.recommendations {
            println!("  - {rec}");
        }
    }
    println!("Feedback rounds: {}", result.feedback_iterations);
    println!("KPI targets met: {}", result.kpis_met);
}
