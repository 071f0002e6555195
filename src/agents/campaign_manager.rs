// src/agents/campaign_manager.rs — Campaign planning, budget allocation and simulation
//
// Channel economics come from a fixed benchmark table. Performance is
// simulated: benchmark rates scaled by a uniform jitter (CTR ±20%,
// conversion rate ±30%). Only the optimization feedback is model-generated.

use async_trait::async_trait;
use chrono::Utc;
use minijinja::context;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::prompts::{self, Prompts};
use super::types::{
    BrandAnalysisResult, BudgetAllocation, CampaignPlan, CampaignResult, ChannelStrategy,
    ContentGenerationResult, OptimizationFeedback, PerformanceMetrics, Platform,
};
use super::{CampaignExecutor, StageLlm};
use crate::core::types::{slots, WorkflowInput};
use crate::infra::errors::BrandloopError;
use crate::infra::session::SharedStore;

const CTR_JITTER: (f64, f64) = (0.8, 1.2);
const CONVERSION_JITTER: (f64, f64) = (0.7, 1.3);
const MAX_ENGAGEMENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelBenchmark {
    pub avg_cpm: f64,
    pub avg_cpc: f64,
    pub avg_ctr: f64,
    pub avg_conversion_rate: f64,
    /// Impressions bought per CPM unit.
    pub reach_multiplier: f64,
    /// Relative share of the budget before normalization.
    pub allocation_weight: f64,
}

impl ChannelBenchmark {
    pub fn for_channel(channel: Platform) -> Self {
        match channel {
            Platform::Linkedin => Self {
                avg_cpm: 15.0,
                avg_cpc: 5.0,
                avg_ctr: 0.025,
                avg_conversion_rate: 0.02,
                reach_multiplier: 1000.0,
                allocation_weight: 1.1,
            },
            Platform::GoogleAds => Self {
                avg_cpm: 10.0,
                avg_cpc: 2.5,
                avg_ctr: 0.03,
                avg_conversion_rate: 0.025,
                reach_multiplier: 2000.0,
                allocation_weight: 1.2,
            },
            Platform::Facebook => Self {
                avg_cpm: 8.0,
                avg_cpc: 1.5,
                avg_ctr: 0.035,
                avg_conversion_rate: 0.015,
                reach_multiplier: 1500.0,
                allocation_weight: 0.9,
            },
            Platform::Instagram => Self {
                avg_cpm: 9.0,
                avg_cpc: 1.8,
                avg_ctr: 0.04,
                avg_conversion_rate: 0.018,
                reach_multiplier: 1800.0,
                allocation_weight: 0.9,
            },
            Platform::Email => Self {
                avg_cpm: 5.0,
                avg_cpc: 0.5,
                avg_ctr: 0.05,
                avg_conversion_rate: 0.03,
                reach_multiplier: 500.0,
                allocation_weight: 1.2,
            },
            Platform::Twitter => Self {
                avg_cpm: 6.5,
                avg_cpc: 1.2,
                avg_ctr: 0.02,
                avg_conversion_rate: 0.01,
                reach_multiplier: 1200.0,
                allocation_weight: 0.9,
            },
        }
    }

    fn reach_for(&self, budget: f64) -> u64 {
        if budget <= 0.0 || self.avg_cpm <= 0.0 {
            return 0;
        }
        // float-to-int `as` truncates and saturates
        (budget / self.avg_cpm * self.reach_multiplier) as u64
    }
}

/// Source of the simulator's uniform draws.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Jitter {
    /// OS randomness.
    #[default]
    Random,
    /// Always the same point of the range: 0.0 is the low end, 1.0 the high end.
    Fixed(f64),
}

impl Jitter {
    /// A draw from `[lo, hi]`.
    pub fn sample(&self, lo: f64, hi: f64) -> f64 {
        let t = match self {
            Jitter::Fixed(t) => t.clamp(0.0, 1.0),
            Jitter::Random => random_unit(),
        };
        lo * (1.0 - t) + hi * t
    }
}

fn random_unit() -> f64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        // 53 random bits into [0, 1)
        Ok(()) => (u64::from_le_bytes(buf) >> 11) as f64 / (1u64 << 53) as f64,
        Err(e) => {
            tracing::warn!("OS randomness unavailable ({e}), using midpoint jitter");
            0.5
        }
    }
}

/// Split `total_budget` across `channels` by benchmark weight. The
/// allocations always sum to the total; a zero budget yields zero
/// allocations and zero reach.
pub fn allocate_budget(channels: &[Platform], total_budget: f64) -> Vec<BudgetAllocation> {
    let weight_sum: f64 = channels
        .iter()
        .map(|c| ChannelBenchmark::for_channel(*c).allocation_weight)
        .sum();

    channels
        .iter()
        .map(|&channel| {
            let bench = ChannelBenchmark::for_channel(channel);
            let allocated_budget = if weight_sum > 0.0 && total_budget > 0.0 {
                bench.allocation_weight / weight_sum * total_budget
            } else {
                0.0
            };
            BudgetAllocation {
                channel,
                allocated_budget,
                estimated_reach: bench.reach_for(allocated_budget),
                estimated_cpm: bench.avg_cpm,
                estimated_cpc: bench.avg_cpc,
            }
        })
        .collect()
}

/// Simulated campaign totals. Cost is the whole budget.
pub fn simulate(
    allocations: &[BudgetAllocation],
    total_budget: f64,
    average_order_value: f64,
    jitter: Jitter,
) -> PerformanceMetrics {
    let mut impressions = 0u64;
    let mut clicks = 0u64;
    let mut conversions = 0u64;

    for alloc in allocations {
        let bench = ChannelBenchmark::for_channel(alloc.channel);
        let channel_impressions = alloc.estimated_reach;
        let ctr = bench.avg_ctr * jitter.sample(CTR_JITTER.0, CTR_JITTER.1);
        let channel_clicks = (channel_impressions as f64 * ctr) as u64;
        let cr = bench.avg_conversion_rate * jitter.sample(CONVERSION_JITTER.0, CONVERSION_JITTER.1);
        let channel_conversions = (channel_clicks as f64 * cr) as u64;

        impressions += channel_impressions;
        clicks += channel_clicks;
        conversions += channel_conversions;
    }

    let ratio = |num: u64, den: u64| if den > 0 { num as f64 / den as f64 } else { 0.0 };
    let ctr = ratio(clicks, impressions);
    let conversion_rate = ratio(conversions, clicks);

    let total_cost = total_budget;
    let revenue = conversions as f64 * average_order_value;
    let roi = if total_cost > 0.0 {
        (revenue - total_cost) / total_cost
    } else {
        0.0
    };
    let cost_per_acquisition = if conversions > 0 {
        total_cost / conversions as f64
    } else {
        0.0
    };

    PerformanceMetrics {
        impressions,
        clicks,
        ctr,
        conversions,
        conversion_rate,
        total_cost,
        revenue,
        roi,
        cost_per_acquisition,
        engagement_score: (ctr * 1000.0 + conversion_rate * 500.0).min(MAX_ENGAGEMENT),
    }
}

pub struct CampaignManager {
    llm: StageLlm,
    prompts: Arc<Prompts>,
    store: SharedStore,
    jitter: Jitter,
    average_order_value: f64,
}

impl CampaignManager {
    pub fn new(llm: StageLlm, prompts: Arc<Prompts>, store: SharedStore) -> Self {
        Self {
            llm,
            prompts,
            store,
            jitter: Jitter::default(),
            average_order_value: 100.0,
        }
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_average_order_value(mut self, aov: f64) -> Self {
        self.average_order_value = aov;
        self
    }

    /// One strategy per platform (first asset wins) with budgets already
    /// allocated.
    pub fn plan(
        &self,
        content: &ContentGenerationResult,
        analysis: &BrandAnalysisResult,
        input: &WorkflowInput,
    ) -> CampaignPlan {
        let channels = content.platforms();
        let budget_allocations = allocate_budget(&channels, input.budget);

        let channel_strategies = budget_allocations
            .iter()
            .filter_map(|alloc| {
                let asset = content
                    .content_assets
                    .iter()
                    .find(|a| a.platform == alloc.channel)?;
                Some(ChannelStrategy {
                    channel: alloc.channel,
                    content_id: asset.content_id.clone(),
                    target_audience: analysis.brand_profile.target_audience.clone(),
                    budget_allocation: alloc.clone(),
                    schedule: None,
                })
            })
            .collect();

        CampaignPlan {
            campaign_id: uuid::Uuid::new_v4().to_string(),
            campaign_name: format!("{} Campaign", analysis.brand_profile.brand_name),
            total_budget: input.budget,
            budget_allocations,
            channel_strategies,
            start_date: Some(Utc::now()),
            end_date: None,
            target_kpis: input.target_kpis.clone(),
        }
    }

    async fn feedback(
        &self,
        plan: &CampaignPlan,
        metrics: &PerformanceMetrics,
        kpis: &BTreeMap<String, f64>,
    ) -> Result<OptimizationFeedback, BrandloopError> {
        let channels: Vec<String> = plan
            .budget_allocations
            .iter()
            .map(|a| {
                format!(
                    "{}: ${:.2} (Est. Reach: {})",
                    a.channel, a.allocated_budget, a.estimated_reach
                )
            })
            .collect();

        let user = self.prompts.render(
            prompts::CAMPAIGN_FEEDBACK,
            context! {
                total_budget => format!("{:.2}", plan.total_budget),
                metrics => metrics,
                ctr_pct => format!("{:.2}%", metrics.ctr * 100.0),
                conversion_rate_pct => format!("{:.2}%", metrics.conversion_rate * 100.0),
                roi => format!("{:.2}", metrics.roi),
                cpa => format!("{:.2}", metrics.cost_per_acquisition),
                kpis => kpis,
                channels => channels,
            },
        )?;
        let doc = self
            .llm
            .request_document(
                "campaign_feedback",
                prompts::ANALYST_SYSTEM,
                user,
                self.llm.temperature,
            )
            .await?;
        Ok(OptimizationFeedback::from_document(&doc))
    }
}

#[async_trait]
impl CampaignExecutor for CampaignManager {
    async fn execute(
        &self,
        content: &ContentGenerationResult,
        analysis: &BrandAnalysisResult,
        input: &WorkflowInput,
    ) -> Result<CampaignResult, BrandloopError> {
        tracing::info!(budget = input.budget, "Planning campaign");
        let campaign_plan = self.plan(content, analysis, input);

        let performance_metrics = simulate(
            &campaign_plan.budget_allocations,
            campaign_plan.total_budget,
            self.average_order_value,
            self.jitter,
        );
        tracing::info!(
            roi = performance_metrics.roi,
            conversions = performance_metrics.conversions,
            ctr = performance_metrics.ctr,
            "Campaign simulated"
        );

        let optimization_feedback = self
            .feedback(&campaign_plan, &performance_metrics, &input.target_kpis)
            .await?;

        let result = CampaignResult {
            campaign_plan,
            performance_metrics,
            optimization_feedback,
            executed_at: Utc::now(),
        };
        self.store.save(slots::CAMPAIGN_RESULT, &result)?;
        Ok(result)
    }
}
