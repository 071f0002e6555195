// src/core/mod.rs — Workflow engine: state machine, retry, KPI check

pub mod kpi;
pub mod orchestrator;
pub mod retry;
pub mod types;
