// src/agents/document.rs — Model reply documents and their field tables
//
// Every stage reply is a JSON object. `Document` wraps it with lenient typed
// accessors; the `from_document` constructors below are the only place reply
// fields are mapped onto result types, and every field has a named default.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::types::{
    BrandProfile, OptimizationFeedback, Platform, PositioningStrategy, SwotAnalysis,
    TargetAudience, Tone,
};
use crate::infra::errors::BrandloopError;

/// Fallback values used when a reply omits a field.
pub mod defaults {
    use super::Tone;

    pub const BRAND_NAME: &str = "Unknown";
    pub const INDUSTRY: &str = "Unknown";
    pub const VISUAL_STYLE: &str = "professional";
    pub const TONES: [Tone; 1] = [Tone::Professional];
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Parse a reply. Surrounding Markdown code fences are ignored; anything
    /// other than a JSON object is a parse error.
    pub fn parse(stage: &str, raw: &str) -> Result<Self, BrandloopError> {
        let body = strip_code_fence(raw);
        if body.is_empty() {
            return Err(BrandloopError::parse(stage, "empty reply"));
        }
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Document(map)),
            Ok(other) => Err(BrandloopError::parse(
                stage,
                format!("expected a JSON object, got {}", json_kind(&other)),
            )),
            Err(e) => Err(BrandloopError::parse(stage, e.to_string())),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Document(map)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(v) if !v.is_null())
    }

    /// String field; scalars are stringified, anything else yields `default`.
    pub fn text(&self, key: &str, default: &str) -> String {
        self.opt_text(key).unwrap_or_else(|| default.to_string())
    }

    /// Non-empty string field.
    pub fn opt_text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(scalar_text).filter(|s| !s.is_empty())
    }

    /// List of strings. A bare string becomes a one-element list; non-scalar
    /// elements are dropped.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(scalar_text)
                .filter(|s| !s.is_empty())
                .collect(),
            Some(v) => scalar_text(v)
                .filter(|s| !s.is_empty())
                .into_iter()
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn map(&self, key: &str) -> Map<String, Value> {
        match self.0.get(key) {
            Some(Value::Object(m)) => m.clone(),
            _ => Map::new(),
        }
    }

    pub fn sub(&self, key: &str) -> Document {
        Document(self.map(key))
    }

    /// Object of numbers (numeric strings accepted), in key order.
    pub fn number_map(&self, key: &str) -> Vec<(String, f64)> {
        self.map(key)
            .into_iter()
            .filter_map(|(k, v)| number(&v).map(|n| (k, n)))
            .collect()
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (```json)
    let rest = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        // one-line fence: ```json {"a": 1} ```
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    rest.trim_end().trim_end_matches("```").trim()
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(v: &Value) -> Option<f64> {
    let n: Option<f64> = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─── Field tables ───────────────────────────────────────────────

impl TargetAudience {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            demographics: doc.map("demographics"),
            psychographics: doc.map("psychographics"),
            pain_points: doc.list("pain_points"),
            goals: doc.list("goals"),
        }
    }
}

impl BrandProfile {
    /// `tone_of_voice` missing: `[professional]`. Unknown tones: `professional`.
    pub fn from_document(doc: &Document, website_url: Option<&str>) -> Self {
        let tone_of_voice = if doc.contains("tone_of_voice") {
            doc.list("tone_of_voice")
                .iter()
                .map(|t| Tone::coerce(t))
                .collect()
        } else {
            defaults::TONES.to_vec()
        };

        Self {
            brand_name: doc.text("brand_name", defaults::BRAND_NAME),
            industry: doc.text("industry", defaults::INDUSTRY),
            website_url: website_url.map(str::to_string),
            tone_of_voice,
            value_proposition: doc.text("value_proposition", ""),
            key_messages: doc.list("key_messages"),
            target_audience: TargetAudience::from_document(&doc.sub("target_audience")),
            brand_keywords: doc.list("brand_keywords"),
            competitors: doc.list("competitors"),
        }
    }
}

impl SwotAnalysis {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            strengths: doc.list("strengths"),
            weaknesses: doc.list("weaknesses"),
            opportunities: doc.list("opportunities"),
            threats: doc.list("threats"),
        }
    }
}

impl PositioningStrategy {
    /// Unknown channels are dropped.
    pub fn from_document(doc: &Document) -> Self {
        let mut recommended_channels = Vec::new();
        for label in doc.list("recommended_channels") {
            match Platform::parse(&label) {
                Some(p) if !recommended_channels.contains(&p) => recommended_channels.push(p),
                Some(_) => {}
                None => tracing::debug!(channel = %label, "Dropping unknown channel"),
            }
        }

        Self {
            key_messages: doc.list("key_messages"),
            differentiation_points: doc.list("differentiation_points"),
            recommended_channels,
            content_themes: doc.list("content_themes"),
        }
    }

    /// Overlay a revision. Fields the revision leaves empty keep their
    /// current value.
    pub fn revised_by(&self, doc: &Document) -> Self {
        let revision = PositioningStrategy::from_document(doc);
        let keep = |new: Vec<String>, old: &Vec<String>| {
            if new.is_empty() {
                old.clone()
            } else {
                new
            }
        };
        Self {
            key_messages: keep(revision.key_messages, &self.key_messages),
            differentiation_points: keep(
                revision.differentiation_points,
                &self.differentiation_points,
            ),
            recommended_channels: if revision.recommended_channels.is_empty() {
                self.recommended_channels.clone()
            } else {
                revision.recommended_channels
            },
            content_themes: keep(revision.content_themes, &self.content_themes),
        }
    }
}

impl OptimizationFeedback {
    /// Reallocation entries for unknown channels are dropped; an empty
    /// reallocation becomes `None`.
    pub fn from_document(doc: &Document) -> Self {
        let realloc: BTreeMap<Platform, f64> = doc
            .number_map("budget_reallocation")
            .into_iter()
            .filter_map(|(k, v)| Platform::parse(&k).map(|p| (p, v)))
            .collect();

        Self {
            insights: doc.list("insights"),
            recommendations: doc.list("recommendations"),
            suggested_budget_reallocation: (!realloc.is_empty()).then_some(realloc),
            suggested_content_adjustments: doc.list("content_adjustments"),
        }
    }
}
