// src/core/kpi.rs — KPI satisfaction check

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agents::types::PerformanceMetrics;

/// KPI names the check understands. Anything else in the target map is ignored.
pub const RECOGNIZED_KPIS: [&str; 3] = ["roi", "conversions", "ctr"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiMiss {
    pub kpi: String,
    pub target: f64,
    pub actual: f64,
}

impl std::fmt::Display for KpiMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.4} < {:.4}", self.kpi, self.actual, self.target)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KpiVerdict {
    Satisfied,
    NeedsOptimization { misses: Vec<KpiMiss> },
}

impl KpiVerdict {
    pub fn needs_optimization(&self) -> bool {
        matches!(self, KpiVerdict::NeedsOptimization { .. })
    }

    pub fn misses(&self) -> &[KpiMiss] {
        match self {
            KpiVerdict::Satisfied => &[],
            KpiVerdict::NeedsOptimization { misses } => misses,
        }
    }
}

/// Compare the latest metrics against the targets.
///
/// A recognized KPI misses when its actual value is strictly below target.
/// An empty target map is always satisfied.
pub fn evaluate(targets: &BTreeMap<String, f64>, metrics: &PerformanceMetrics) -> KpiVerdict {
    let misses: Vec<KpiMiss> = targets
        .iter()
        .filter(|(name, _)| RECOGNIZED_KPIS.contains(&name.as_str()))
        .filter_map(|(name, &target)| {
            let actual = metrics.kpi(name)?;
            (actual < target).then(|| KpiMiss {
                kpi: name.clone(),
                target,
                actual,
            })
        })
        .collect();

    if misses.is_empty() {
        KpiVerdict::Satisfied
    } else {
        KpiVerdict::NeedsOptimization { misses }
    }
}
