// src/agents/types.rs — Stage result models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Innovative,
    Authoritative,
    Playful,
    Empathetic,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Professional,
        Tone::Friendly,
        Tone::Innovative,
        Tone::Authoritative,
        Tone::Playful,
        Tone::Empathetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Friendly => "friendly",
            Tone::Innovative => "innovative",
            Tone::Authoritative => "authoritative",
            Tone::Playful => "playful",
            Tone::Empathetic => "empathetic",
        }
    }

    /// Unknown labels fall back to `Professional`.
    pub fn coerce(label: &str) -> Tone {
        let label = label.trim();
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Linkedin,
    GoogleAds,
    Facebook,
    Instagram,
    Email,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Linkedin,
        Platform::GoogleAds,
        Platform::Facebook,
        Platform::Instagram,
        Platform::Email,
        Platform::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linkedin => "linkedin",
            Platform::GoogleAds => "google_ads",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Email => "email",
            Platform::Twitter => "twitter",
        }
    }

    pub fn parse(label: &str) -> Option<Platform> {
        let label = label.trim();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(label))
    }

    /// Platforms whose posts get an image prompt alongside the copy.
    pub fn has_visual(&self) -> bool {
        matches!(
            self,
            Platform::Instagram | Platform::Facebook | Platform::Linkedin
        )
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            Platform::GoogleAds => ContentType::AdCopy,
            Platform::Email => ContentType::EmailCampaign,
            Platform::Linkedin | Platform::Facebook | Platform::Instagram | Platform::Twitter => {
                ContentType::Post
            }
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::parse(s).ok_or_else(|| {
            let known: Vec<&str> = Platform::ALL.iter().map(|p| p.as_str()).collect();
            format!("unknown platform '{s}' (expected one of: {})", known.join(", "))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Post,
    AdCopy,
    EmailCampaign,
    Article,
    VideoScript,
}

// ─── Brand analysis ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetAudience {
    #[serde(default)]
    pub demographics: Map<String, Value>,
    #[serde(default)]
    pub psychographics: Map<String, Value>,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandProfile {
    pub brand_name: String,
    pub industry: String,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub tone_of_voice: Vec<Tone>,
    #[serde(default)]
    pub value_proposition: String,
    #[serde(default)]
    pub key_messages: Vec<String>,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub brand_keywords: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
}

impl BrandProfile {
    /// First declared tone, or `Professional`.
    pub fn primary_tone(&self) -> Tone {
        self.tone_of_voice.first().copied().unwrap_or_default()
    }

    pub fn tone_labels(&self) -> Vec<&'static str> {
        self.tone_of_voice.iter().map(Tone::as_str).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwotAnalysis {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub threats: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositioningStrategy {
    #[serde(default)]
    pub key_messages: Vec<String>,
    #[serde(default)]
    pub differentiation_points: Vec<String>,
    #[serde(default)]
    pub recommended_channels: Vec<Platform>,
    #[serde(default)]
    pub content_themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandAnalysisResult {
    pub analysis_id: String,
    pub brand_profile: BrandProfile,
    pub swot_analysis: SwotAnalysis,
    pub positioning_strategy: PositioningStrategy,
    pub created_at: DateTime<Utc>,
}

// ─── Content generation ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualAsset {
    pub asset_id: String,
    /// The content asset this image accompanies.
    #[serde(default)]
    pub content_id: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub generated_url: Option<String>,
    #[serde(default)]
    pub local_path: Option<String>,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAsset {
    pub content_id: String,
    pub platform: Platform,
    pub content_type: ContentType,
    pub content: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub subject_line: Option<String>,
    #[serde(default)]
    pub cta: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub visual_prompt: Option<String>,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub variant: u32,
    #[serde(default)]
    pub estimated_engagement_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentGenerationResult {
    pub content_assets: Vec<ContentAsset>,
    pub visual_assets: Vec<VisualAsset>,
    #[serde(default)]
    pub generation_metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl ContentGenerationResult {
    /// Platforms in first-seen order.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut seen = Vec::new();
        for asset in &self.content_assets {
            if !seen.contains(&asset.platform) {
                seen.push(asset.platform);
            }
        }
        seen
    }
}

// ─── Campaign ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub channel: Platform,
    pub allocated_budget: f64,
    pub estimated_reach: u64,
    pub estimated_cpm: f64,
    pub estimated_cpc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStrategy {
    pub channel: Platform,
    pub content_id: String,
    pub target_audience: TargetAudience,
    pub budget_allocation: BudgetAllocation,
    #[serde(default)]
    pub schedule: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPlan {
    pub campaign_id: String,
    pub campaign_name: String,
    pub total_budget: f64,
    pub budget_allocations: Vec<BudgetAllocation>,
    pub channel_strategies: Vec<ChannelStrategy>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub target_kpis: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub conversions: u64,
    pub conversion_rate: f64,
    pub total_cost: f64,
    pub revenue: f64,
    pub roi: f64,
    pub cost_per_acquisition: f64,
    pub engagement_score: f64,
}

impl PerformanceMetrics {
    /// Flat view: KPI name to value.
    pub fn kpi(&self, name: &str) -> Option<f64> {
        let v = match name {
            "impressions" => self.impressions as f64,
            "clicks" => self.clicks as f64,
            "ctr" => self.ctr,
            "conversions" => self.conversions as f64,
            "conversion_rate" => self.conversion_rate,
            "total_cost" => self.total_cost,
            "revenue" => self.revenue,
            "roi" => self.roi,
            "cost_per_acquisition" => self.cost_per_acquisition,
            "engagement_score" => self.engagement_score,
            _ => return None,
        };
        Some(v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationFeedback {
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub suggested_budget_reallocation: Option<BTreeMap<Platform, f64>>,
    #[serde(default)]
    pub suggested_content_adjustments: Vec<String>,
}

impl OptimizationFeedback {
    /// Whether there is anything a refinement pass could act on.
    pub fn is_actionable(&self) -> bool {
        !self.recommendations.is_empty()
            || !self.suggested_content_adjustments.is_empty()
            || !self.insights.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignResult {
    pub campaign_plan: CampaignPlan,
    pub performance_metrics: PerformanceMetrics,
    pub optimization_feedback: OptimizationFeedback,
    pub executed_at: DateTime<Utc>,
}
