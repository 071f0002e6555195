// src/agents/prompts.rs — Prompt templates
//
// Template names carry no file extension so minijinja never auto-escapes.
// JSON shape examples sit inside raw blocks.

use minijinja::Environment;
use serde::Serialize;

use super::types::Platform;
use crate::infra::errors::BrandloopError;

pub const BRAND_PROFILE: &str = "brand_profile";
pub const SWOT: &str = "swot";
pub const POSITIONING: &str = "positioning";
pub const REFINE_POSITIONING: &str = "refine_positioning";
pub const PLATFORM_CONTENT: &str = "platform_content";
pub const VISUAL_PROMPT: &str = "visual_prompt";
pub const CONTENT_VARIANT: &str = "content_variant";
pub const CAMPAIGN_FEEDBACK: &str = "campaign_feedback";

pub const STRATEGIST_SYSTEM: &str = "You are an expert brand strategist.";
pub const VISUAL_SYSTEM: &str = "You are an expert at creating image generation prompts.";
pub const VARIANT_SYSTEM: &str = "You are an expert at creating content variants for A/B testing.";
pub const ANALYST_SYSTEM: &str = "You are an expert marketing campaign analyst.";

const BRAND_PROFILE_TMPL: &str = r#"You are a brand strategist analyzing a company's brand identity.

Based on the following information, extract and analyze the brand profile:

{% if website_url %}Website: {{ website_url }}

{% endif %}{% if materials %}Brand Materials:
{% for m in materials %}{{ m }}
{% endfor %}
{% endif %}{% if brief %}Campaign Brief:
{{ brief }}
{% endif %}
Please provide a comprehensive brand analysis in the following JSON format:
{% raw %}{
    "brand_name": "Company name",
    "industry": "Industry sector",
    "tone_of_voice": ["professional", "friendly", "innovative"],
    "value_proposition": "Core value proposition in one sentence",
    "key_messages": ["Key message 1", "Key message 2", "Key message 3"],
    "target_audience": {
        "demographics": {"age_range": "25-45", "gender": "all", "location": "global"},
        "psychographics": {"interests": ["interest1", "interest2"], "values": ["value1", "value2"]},
        "pain_points": ["pain point 1", "pain point 2"],
        "goals": ["goal 1", "goal 2"]
    },
    "brand_keywords": ["keyword1", "keyword2", "keyword3"],
    "competitors": ["competitor1", "competitor2"]
}{% endraw %}

Tone of voice values must come from: {{ tones | join(", ") }}.

Provide only the JSON response, no additional text."#;

const SWOT_TMPL: &str = r#"You are a brand strategist performing a SWOT analysis.

Brand Profile:
- Name: {{ profile.brand_name }}
- Industry: {{ profile.industry }}
- Value Proposition: {{ profile.value_proposition }}
- Target Audience: {{ profile.target_audience.demographics | tojson }}

Based on this brand profile, provide a comprehensive SWOT analysis in JSON format:
{% raw %}{
    "strengths": ["strength 1", "strength 2", "strength 3", "strength 4"],
    "weaknesses": ["weakness 1", "weakness 2", "weakness 3"],
    "opportunities": ["opportunity 1", "opportunity 2", "opportunity 3", "opportunity 4"],
    "threats": ["threat 1", "threat 2", "threat 3"]
}{% endraw %}

Provide only the JSON response, no additional text."#;

const POSITIONING_TMPL: &str = r#"You are a brand strategist creating a positioning strategy.

Brand Profile:
- Name: {{ profile.brand_name }}
- Industry: {{ profile.industry }}
- Value Proposition: {{ profile.value_proposition }}

SWOT Analysis:
- Strengths: {{ swot.strengths[:3] | join(", ") }}
- Opportunities: {{ swot.opportunities[:3] | join(", ") }}

Based on this analysis, create a positioning strategy in JSON format:
{% raw %}{
    "key_messages": ["message 1", "message 2", "message 3"],
    "differentiation_points": ["point 1", "point 2", "point 3"],
    "recommended_channels": ["linkedin", "google_ads", "email"],
    "content_themes": ["theme 1", "theme 2", "theme 3", "theme 4"]
}{% endraw %}

Recommended channels should be from: {{ platforms | join(", ") }}

Provide only the JSON response, no additional text."#;

const REFINE_POSITIONING_TMPL: &str = r#"You are a brand strategist revising a positioning strategy after a campaign run.

Brand Profile:
- Name: {{ profile.brand_name }}
- Industry: {{ profile.industry }}
- Value Proposition: {{ profile.value_proposition }}

Current Positioning:
- Key Messages: {{ positioning.key_messages | join("; ") }}
- Differentiation Points: {{ positioning.differentiation_points | join("; ") }}
- Recommended Channels: {{ positioning.recommended_channels | join(", ") }}
- Content Themes: {{ positioning.content_themes | join("; ") }}

Campaign Feedback:
{% for i in feedback.insights %}- Insight: {{ i }}
{% endfor %}{% for r in feedback.recommendations %}- Recommendation: {{ r }}
{% endfor %}{% for c in feedback.suggested_content_adjustments %}- Content adjustment: {{ c }}
{% endfor %}
Revise the positioning so the next round of content addresses this feedback.
Keep what is working. Respond in JSON format:
{% raw %}{
    "key_messages": ["message 1", "message 2", "message 3"],
    "differentiation_points": ["point 1", "point 2", "point 3"],
    "recommended_channels": ["linkedin", "email"],
    "content_themes": ["theme 1", "theme 2", "theme 3"]
}{% endraw %}

Recommended channels should be from: {{ platforms | join(", ") }}

Provide only the JSON response, no additional text."#;

const PLATFORM_CONTENT_TMPL: &str = r#"Generate marketing content for {{ platform }} with the following specifications:

BRAND INFORMATION:
- Brand Name: {{ profile.brand_name }}
- Industry: {{ profile.industry }}
- Value Proposition: {{ profile.value_proposition }}
- Tone of Voice: {{ profile.tone_of_voice | join(", ") }}
- Key Messages: {{ key_messages[:3] | join(", ") }}
- Target Audience: {{ profile.target_audience.demographics | tojson }}
{% if themes %}- Content Themes: {{ themes | join(", ") }}
{% endif %}
CAMPAIGN BRIEF:
{{ brief }}

PLATFORM GUIDELINES:
- Platform: {{ platform }}
- Tone: {{ guidelines.tone }}
- Best Practices: {{ guidelines.best_practices | join(", ") }}
{% if guidelines.max_length %}- Maximum length: {{ guidelines.max_length }} characters
{% endif %}
REQUIREMENTS:
- This is variant #{{ variant + 1 }} (make it unique if multiple variants)
- Follow platform best practices
- Align with brand tone and key messages
- Include a clear call-to-action
- Make it engaging and conversion-focused

Provide the response in JSON format:
{% if platform == "linkedin" %}{% raw %}{
    "content": "Full LinkedIn post content with line breaks",
    "hashtags": ["hashtag1", "hashtag2", "hashtag3"],
    "cta": "Call to action"
}{% endraw %}{% elif platform == "google_ads" %}{
    "headline": "Compelling headline (max {{ guidelines.headline_max }} chars)",
    "content": "Ad description (max {{ guidelines.description_max }} chars)",
    "cta": "Call to action",
    "keywords": ["keyword1", "keyword2", "keyword3"]
}{% elif platform == "email" %}{
    "subject_line": "Email subject line (max {{ guidelines.subject_max }} chars)",
    "content": "Email body content",
    "cta": "Call to action button text"
}{% else %}{% raw %}{
    "content": "Post content",
    "hashtags": ["hashtag1", "hashtag2"],
    "cta": "Call to action"
}{% endraw %}{% endif %}"#;

const VISUAL_PROMPT_TMPL: &str = r#"Create a detailed image generation prompt for the following marketing content:

Brand: {{ profile.brand_name }}
Industry: {{ profile.industry }}
Platform: {{ platform }}
Content: {{ excerpt }}

Generate a detailed prompt for an image model that would create an engaging visual for this content.
The image should align with the brand's {{ profile.tone_of_voice | join(", ") }} tone.

Provide the response in JSON format:
{% raw %}{
    "prompt": "Detailed image generation prompt",
    "style": "Style description (e.g., professional, modern, minimalist)"
}{% endraw %}"#;

const CONTENT_VARIANT_TMPL: &str = r#"Create a variant of the following marketing content:

Original Content:
Platform: {{ asset.platform }}
Content: {{ asset.content }}
CTA: {{ asset.cta or "" }}

Variation Instruction: {{ instruction }}

Provide the variant in JSON format:
{% raw %}{
    "content": "Variant content",
    "headline": "Variant headline (if applicable)",
    "cta": "Variant call to action",
    "hashtags": ["hashtag1", "hashtag2"]
}{% endraw %}"#;

const CAMPAIGN_FEEDBACK_TMPL: &str = r#"You are a marketing campaign analyst. Analyze the following campaign performance and provide optimization recommendations.

Campaign Performance:
- Total Budget: ${{ total_budget }}
- Impressions: {{ metrics.impressions }}
- Clicks: {{ metrics.clicks }}
- CTR: {{ ctr_pct }}
- Conversions: {{ metrics.conversions }}
- Conversion Rate: {{ conversion_rate_pct }}
- ROI: {{ roi }}x
- Cost per Acquisition: ${{ cpa }}

Target KPIs:
{% for name, target in kpis | items %}- {{ name }}: {{ target }}
{% else %}- none set
{% endfor %}
Channel Breakdown:
{% for line in channels %}- {{ line }}
{% endfor %}
Provide your analysis in JSON format:
{% raw %}{
    "insights": [
        "Key insight 1 about performance",
        "Key insight 2 about performance",
        "Key insight 3 about performance"
    ],
    "recommendations": [
        "Specific recommendation 1",
        "Specific recommendation 2",
        "Specific recommendation 3"
    ],
    "budget_reallocation": {
        "linkedin": 3500,
        "google_ads": 4500,
        "email": 2000
    },
    "content_adjustments": [
        "Content adjustment suggestion 1",
        "Content adjustment suggestion 2"
    ]
}{% endraw %}

Focus on:
1. Which channels performed best/worst
2. Whether target KPIs were met
3. Specific actions to improve ROI
4. Budget reallocation suggestions"#;

/// Copywriter persona per platform.
pub fn platform_system_prompt(platform: Platform) -> String {
    let focus = match platform {
        Platform::Linkedin => "professional B2B content for LinkedIn.",
        Platform::GoogleAds => "compelling ad copy that drives conversions.",
        Platform::Email => "engaging email marketing campaigns.",
        Platform::Facebook => "social media content that drives engagement.",
        Platform::Instagram => "visual storytelling and Instagram content.",
        Platform::Twitter => "concise, impactful Twitter content.",
    };
    format!("You are an expert marketing copywriter specializing in {focus}")
}

pub struct Prompts {
    env: Environment<'static>,
}

impl Prompts {
    pub fn new() -> Result<Self, BrandloopError> {
        let mut env = Environment::new();
        env.add_template(BRAND_PROFILE, BRAND_PROFILE_TMPL)?;
        env.add_template(SWOT, SWOT_TMPL)?;
        env.add_template(POSITIONING, POSITIONING_TMPL)?;
        env.add_template(REFINE_POSITIONING, REFINE_POSITIONING_TMPL)?;
        env.add_template(PLATFORM_CONTENT, PLATFORM_CONTENT_TMPL)?;
        env.add_template(VISUAL_PROMPT, VISUAL_PROMPT_TMPL)?;
        env.add_template(CONTENT_VARIANT, CONTENT_VARIANT_TMPL)?;
        env.add_template(CAMPAIGN_FEEDBACK, CAMPAIGN_FEEDBACK_TMPL)?;
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, BrandloopError> {
        let tmpl = self.env.get_template(name)?;
        Ok(tmpl.render(ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_all_templates_compile() {
        let prompts = Prompts::new().unwrap();
        for name in [
            BRAND_PROFILE,
            SWOT,
            POSITIONING,
            REFINE_POSITIONING,
            PLATFORM_CONTENT,
            VISUAL_PROMPT,
            CONTENT_VARIANT,
            CAMPAIGN_FEEDBACK,
        ] {
            assert!(prompts.env.get_template(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_unknown_template_is_prompt_error() {
        let prompts = Prompts::new().unwrap();
        let err = prompts.render("nope", context! {}).unwrap_err();
        assert!(matches!(err, BrandloopError::Prompt(_)));
    }

    #[test]
    fn test_brand_profile_prompt_sections() {
        let prompts = Prompts::new().unwrap();
        let out = prompts
            .render(
                BRAND_PROFILE,
                context! {
                    website_url => "https://acme.test",
                    materials => vec!["Founded 1999"],
                    brief => "Launch the spring line",
                    tones => vec!["professional", "friendly"],
                },
            )
            .unwrap();
        assert!(out.contains("Website: https://acme.test"));
        assert!(out.contains("Founded 1999"));
        assert!(out.contains("Campaign Brief:\nLaunch the spring line"));
        assert!(out.contains(r#""brand_name": "Company name""#));
        assert!(out.contains("professional, friendly"));
    }

    #[test]
    fn test_platform_content_shapes() {
        let prompts = Prompts::new().unwrap();
        let profile = context! {
            brand_name => "Acme",
            industry => "Tools",
            value_proposition => "Better hammers",
            tone_of_voice => vec!["friendly"],
            target_audience => context! { demographics => context! {} },
        };
        let ads = prompts
            .render(
                PLATFORM_CONTENT,
                context! {
                    platform => "google_ads",
                    profile => profile.clone(),
                    key_messages => Vec::<String>::new(),
                    themes => Vec::<String>::new(),
                    brief => "b",
                    variant => 0,
                    guidelines => context! {
                        tone => "compelling",
                        best_practices => vec!["Include keywords"],
                        headline_max => 30,
                        description_max => 90,
                    },
                },
            )
            .unwrap();
        assert!(ads.contains("max 30 chars"));
        assert!(ads.contains("max 90 chars"));
        assert!(ads.contains("variant #1"));

        let post = prompts
            .render(
                PLATFORM_CONTENT,
                context! {
                    platform => "twitter",
                    profile => profile,
                    key_messages => vec!["m"],
                    themes => vec!["spring"],
                    brief => "b",
                    variant => 1,
                    guidelines => context! { tone => "engaging", best_practices => Vec::<String>::new() },
                },
            )
            .unwrap();
        assert!(post.contains(r#""content": "Post content""#));
        assert!(post.contains("variant #2"));
        assert!(post.contains("Content Themes: spring"));
    }

    #[test]
    fn test_system_prompts() {
        assert!(platform_system_prompt(Platform::Twitter).ends_with("concise, impactful Twitter content."));
        assert!(platform_system_prompt(Platform::Email).starts_with("You are an expert marketing copywriter"));
    }
}
