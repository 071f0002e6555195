// src/lib.rs — Library root for brandloop

pub mod agents;
pub mod cli;
pub mod core;
pub mod infra;
pub mod provider;
pub mod util;
