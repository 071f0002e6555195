// src/cli/mod.rs — CLI definition (clap derive)

pub mod progress;
pub mod run;
pub mod sessions;
pub mod status;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::agents::types::Platform;

#[derive(Parser)]
#[command(
    name = "brandloop",
    about = "Brand analysis, content generation and campaign simulation with a KPI feedback loop",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full workflow in a new session
    Run(RunArgs),
    /// Show the workflow state of a session (latest when omitted)
    Status {
        #[arg(long)]
        session: Option<String>,
    },
    /// Inspect, export or delete stored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Campaign brief
    #[arg(long)]
    pub brief: Option<String>,

    /// Total campaign budget (defaults to campaign.default_budget)
    #[arg(long)]
    pub budget: Option<f64>,

    /// Target platform; repeat or comma-separate
    #[arg(long = "platform", value_delimiter = ',')]
    pub platforms: Vec<Platform>,

    /// KPI target as name=value, e.g. roi=2.0
    #[arg(long = "kpi", value_parser = parse_kpi)]
    pub kpis: Vec<(String, f64)>,

    /// Brand website
    #[arg(long)]
    pub url: Option<String>,

    /// File whose text is passed along as brand material
    #[arg(long = "material")]
    pub materials: Vec<PathBuf>,

    /// Workflow input as JSON or YAML; flags override its fields
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Session id to use instead of a time-derived one
    #[arg(long)]
    pub session_id: Option<String>,

    /// Skip the KPI feedback loop
    #[arg(long)]
    pub no_feedback: bool,

    /// Total rounds including the initial run
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Content variants per platform
    #[arg(long)]
    pub variants: Option<u32>,

    /// Suppress progress output
    #[arg(long)]
    pub quiet: bool,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Clone)]
pub enum SessionAction {
    /// List stored sessions
    List,
    /// Summarize one session
    Show { id: String },
    /// Write a session as JSON or YAML
    Export {
        id: String,
        #[arg(long, default_value = "json")]
        format: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a session file
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn parse_kpi(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing KPI name in '{raw}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("KPI '{name}' needs a numeric target, got '{value}'"))?;
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kpi() {
        assert_eq!(parse_kpi("roi=2.0").unwrap(), ("roi".to_string(), 2.0));
        assert_eq!(parse_kpi(" ctr = 0.03 ").unwrap(), ("ctr".to_string(), 0.03));
        assert!(parse_kpi("roi").is_err());
        assert!(parse_kpi("=2").is_err());
        assert!(parse_kpi("roi=lots").is_err());
    }

    #[test]
    fn test_run_args() {
        let cli = Cli::try_parse_from([
            "brandloop",
            "run",
            "--brief",
            "Spring launch",
            "--platform",
            "linkedin,email",
            "--platform",
            "google_ads",
            "--kpi",
            "roi=2",
            "--no-feedback",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(
            args.platforms,
            vec![Platform::Linkedin, Platform::Email, Platform::GoogleAds]
        );
        assert_eq!(args.kpis, vec![("roi".to_string(), 2.0)]);
        assert!(args.no_feedback);
        assert_eq!(args.budget, None);
    }

    #[test]
    fn test_unknown_platform_rejected() {
        assert!(Cli::try_parse_from(["brandloop", "run", "--platform", "myspace"]).is_err());
    }

    #[test]
    fn test_sessions_subcommands() {
        let cli = Cli::try_parse_from([
            "brandloop",
            "--config",
            "/tmp/c.toml",
            "sessions",
            "export",
            "session_1",
            "--format",
            "yaml",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/c.toml"));
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                action: SessionAction::Export { ref format, .. }
            } if format == "yaml"
        ));
    }
}
