// src/cli/status.rs — `brandloop status`: workflow state of a stored session

use chrono::{DateTime, FixedOffset};

use crate::core::types::WorkflowStatus;
use crate::infra::config::Config;
use crate::infra::errors::BrandloopError;
use crate::infra::session::SessionStore;

/// Print the status of `session`, or of the most recently created session.
pub async fn show_status(session: Option<&str>, config: &Config) -> anyhow::Result<()> {
    let mut store = SessionStore::open(config.storage.sessions_dir())?;
    match load_status(&mut store, session)? {
        Some(status) => print_status(&status),
        None => println!("No sessions in {}", store.dir().display()),
    }
    Ok(())
}

/// Activate the requested (or latest) session and read its status.
/// `Ok(None)` when no session id was given and nothing is stored yet.
pub fn load_status(
    store: &mut SessionStore,
    session: Option<&str>,
) -> Result<Option<WorkflowStatus>, BrandloopError> {
    let id = match session {
        Some(id) => id.to_string(),
        None => match latest_session(store)? {
            Some(id) => id,
            None => return Ok(None),
        },
    };
    if !store.load_session(&id)? {
        return Err(BrandloopError::SessionNotFound { id });
    }
    Ok(Some(WorkflowStatus::read(store)))
}

/// The stored session with the newest `created_at`.
pub fn latest_session(store: &SessionStore) -> Result<Option<String>, BrandloopError> {
    let mut latest: Option<(String, Option<DateTime<FixedOffset>>)> = None;
    for id in store.list_sessions()? {
        let exported = match store.export_session(Some(&id)) {
            Ok(exported) => exported,
            Err(e) => {
                tracing::warn!(session = %id, "Skipping unreadable session: {e}");
                continue;
            }
        };
        let created = exported["created_at"]
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
        if latest.as_ref().map_or(true, |(_, best)| created >= *best) {
            latest = Some((id, created));
        }
    }
    Ok(latest.map(|(id, _)| id))
}

fn print_status(status: &WorkflowStatus) {
    let mark = |b: bool| if b { "yes" } else { "no" };
    println!(
        "Session:         {}",
        status.session_id.as_deref().unwrap_or("-")
    );
    println!("Workflow state:  {}", status.workflow_state);
    println!("Brand analysis:  {}", mark(status.has_brand_analysis));
    println!("Content:         {}", mark(status.has_content));
    println!("Campaign result: {}", mark(status.has_campaign_results));
}
