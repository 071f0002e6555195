// src/cli/sessions.rs — `brandloop sessions`: list, show, export, delete
//
// Exports are JSON or YAML, to stdout or a file.

use serde_json::Value;
use std::path::Path;

use super::SessionAction;
use crate::core::types::slots;
use crate::infra::config::Config;
use crate::infra::session::SessionStore;

pub async fn run_sessions(action: SessionAction, config: &Config) -> anyhow::Result<()> {
    let mut store = SessionStore::open(config.storage.sessions_dir())?;

    match action {
        SessionAction::List => {
            let ids = store.list_sessions()?;
            if ids.is_empty() {
                println!("No sessions in {}", store.dir().display());
            }
            for id in ids {
                let data = store.export_session(Some(&id))?;
                println!("{}", list_line(&id, &data));
            }
        }
        SessionAction::Show { id } => {
            let data = store.export_session(Some(&id))?;
            print!("{}", describe(&data));
        }
        SessionAction::Export { id, format, output } => {
            let data = store.export_session(Some(&id))?;
            let rendered = render(&data, &format)?;
            match output {
                Some(path) => {
                    write_output(&path, &rendered)?;
                    println!("Exported {id} to {}", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        SessionAction::Delete { id, yes } => {
            if !yes && !confirm_delete(&id) {
                println!("Kept {id}");
                return Ok(());
            }
            if store.delete_session(&id)? {
                println!("Deleted {id}");
            } else {
                anyhow::bail!("Session '{id}' not found");
            }
        }
    }
    Ok(())
}

fn confirm_delete(id: &str) -> bool {
    inquire::Confirm::new(&format!("Delete session {id}?"))
        .with_default(false)
        .with_help_message("The session file is removed from disk")
        .prompt()
        .unwrap_or(false)
}

pub fn render(data: &Value, format: &str) -> anyhow::Result<String> {
    Ok(match format {
        "json" => serde_json::to_string_pretty(data)?,
        "yaml" | "yml" => serde_yml::to_string(data)?,
        other => anyhow::bail!("Unsupported format '{other}'. Options: json, yaml"),
    })
}

fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn workflow_state(data: &Value) -> &str {
    data["slots"]["workflow_state"].as_str().unwrap_or("pending")
}

fn list_line(id: &str, data: &Value) -> String {
    format!(
        "{id:<32} {:<20} {}",
        workflow_state(data),
        data["created_at"].as_str().unwrap_or("-")
    )
}

fn describe(data: &Value) -> String {
    let slot = |key: &str| !data["slots"][key].is_null();
    let mark = |b: bool| if b { "yes" } else { "no" };
    let messages = data["messages"].as_array().map_or(0, Vec::len);

    let mut out = String::new();
    out.push_str(&format!(
        "Session:         {}\n",
        data["session_id"].as_str().unwrap_or("-")
    ));
    out.push_str(&format!(
        "Created:         {}\n",
        data["created_at"].as_str().unwrap_or("-")
    ));
    out.push_str(&format!("Workflow state:  {}\n", workflow_state(data)));
    out.push_str(&format!(
        "Brand analysis:  {}\n",
        mark(slot(slots::BRAND_ANALYSIS))
    ));
    out.push_str(&format!(
        "Content:         {}\n",
        mark(slot(slots::CONTENT_GENERATION))
    ));
    out.push_str(&format!(
        "Campaign result: {}\n",
        mark(slot(slots::CAMPAIGN_RESULT))
    ));
    if let Some(roi) = data["slots"][slots::CAMPAIGN_RESULT]["performance_metrics"]["roi"].as_f64() {
        out.push_str(&format!("ROI:             {roi:.2}\n"));
    }
    out.push_str(&format!("Messages:        {messages}\n"));
    out
}
