// src/cli/progress.rs — Terminal progress renderer for workflow events

use crate::core::types::ProgressEvent;
use crate::util::ellipsize;

const ERROR_EXCERPT_CHARS: usize = 160;

/// Build a progress callback that writes one line per event to stderr.
///
/// stdout stays clean for the result summary or `--json` output.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event| eprintln!("{}", format_event(&event))
}

pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::SessionCreated { session_id } => format!("[session] {session_id}"),
        ProgressEvent::StateChanged { state } => format!("[state] {state}"),
        ProgressEvent::StageRetry {
            state,
            attempt,
            max_attempts,
            delay,
            error,
        } => format!(
            "[retry] {state} attempt {attempt}/{max_attempts} failed, retrying in {:.1}s: {}",
            delay.as_secs_f64(),
            ellipsize(error, ERROR_EXCERPT_CHARS)
        ),
        ProgressEvent::StageCompleted { state } => format!("[done]  {state}"),
        ProgressEvent::FeedbackIteration {
            iteration,
            max_iterations,
            misses,
        } => {
            let missed: Vec<String> = misses.iter().map(|m| m.to_string()).collect();
            format!(
                "[feedback {iteration}/{max_iterations}] KPIs below target: {}",
                missed.join(", ")
            )
        }
        ProgressEvent::Complete {
            session_id,
            feedback_iterations,
            kpis_met,
        } => format!(
            "[complete] session={session_id} feedback_rounds={feedback_iterations} kpis_met={kpis_met}"
        ),
        ProgressEvent::Failed { state, error } => format!("[failed] {state}: {error}"),
    }
}
