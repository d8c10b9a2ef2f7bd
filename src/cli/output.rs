//! Output formatting helpers for CLI commands

use crate::decision_log::{DecisionLogEntry, DecisionStats};
use crate::gateway::{ProviderOutcome, ProviderResult};
use crate::logging::truncate;
use crate::registry::{BackendView, ProviderRole};
use crate::safety::SafetyStatus;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// Answer length shown in log listings.
const ANSWER_PREVIEW_LEN: usize = 60;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Colored label for a safety status.
pub fn status_label(status: SafetyStatus) -> String {
    match status {
        SafetyStatus::Approved => "Approved".green().to_string(),
        SafetyStatus::Escalated => "Escalated".yellow().to_string(),
        SafetyStatus::Rejected => "Rejected".red().to_string(),
    }
}

/// Get status icon for a safety status
pub fn status_icon(status: SafetyStatus) -> &'static str {
    match status {
        SafetyStatus::Approved => "✓",
        SafetyStatus::Escalated => "!",
        SafetyStatus::Rejected => "✗",
    }
}

/// Format providers as a table
pub fn format_providers_table(providers: &[BackendView]) -> String {
    let mut table = new_table(vec![
        "ID", "Role", "Kind", "Model", "URL", "Cost", "Timeout", "Attempts",
    ]);

    for p in providers {
        let role = match p.role {
            ProviderRole::Primary => "primary".normal().to_string(),
            ProviderRole::Tiebreaker => "tiebreaker".cyan().to_string(),
        };
        table.add_row(vec![
            Cell::new(&p.id),
            Cell::new(role),
            Cell::new(p.kind),
            Cell::new(&p.model),
            Cell::new(&p.url),
            Cell::new(format!("${:.4}", p.cost_per_call)),
            Cell::new(format!("{}ms", p.timeout_ms)),
            Cell::new(p.max_attempts),
        ]);
    }

    table.to_string()
}

/// Format providers as JSON
pub fn format_providers_json(providers: &[BackendView]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "providers": providers }))
}

fn outcome_cell(result: &ProviderResult) -> String {
    match &result.outcome {
        ProviderOutcome::Ok { latency_ms, .. } => format!("ok ({}ms)", latency_ms).green().to_string(),
        ProviderOutcome::Error { kind, message } => {
            format!("{}: {}", kind, truncate(message, 40)).red().to_string()
        }
    }
}

/// Format one decision: headline, per-provider outcomes, and the answer.
pub fn format_decision(entry: &DecisionLogEntry) -> String {
    let decision = &entry.decision;
    let mut out = format!(
        "{} {} ({})\n",
        status_icon(decision.status),
        status_label(decision.status),
        decision.reason
    );
    if let Some(id) = &decision.escalation_id {
        out.push_str(&format!("  Escalation: {}\n", id.as_str().bold()));
    }
    if !decision.signals.is_empty() {
        out.push_str(&format!("  Signals: {}\n", decision.signals.join(", ")));
    }

    let mut table = new_table(vec!["Provider", "Outcome", "Confidence", "Attempts", "Cost"]);
    let calls = entry
        .primary_results
        .iter()
        .map(|r| (r, ""))
        .chain(entry.tiebreaker_result.iter().map(|r| (r, " (tiebreaker)")));
    for (result, suffix) in calls {
        table.add_row(vec![
            Cell::new(format!("{}{}", result.backend_id, suffix)),
            Cell::new(outcome_cell(result)),
            Cell::new(
                result
                    .confidence()
                    .map(|c| format!("{:.2}", c))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(result.attempts),
            Cell::new(format!("${:.4}", result.cost)),
        ]);
    }
    out.push_str(&table.to_string());
    out.push('\n');

    match &entry.verdict {
        Some(v) => out.push_str(&format!(
            "Resolution: {}  score {:.2} (keyword {:.2}, structural {:.2}, lexical {:.2})  confidence {:.2}\n",
            v.resolution, v.score, v.keyword_score, v.structural_score, v.lexical_score, v.confidence
        )),
        None => out.push_str(&format!("Resolution: {}\n", entry.resolution())),
    }
    out.push_str(&format!(
        "Cost: ${:.4}  Latency: {}ms\n\n",
        entry.total_cost, entry.total_latency_ms
    ));
    out.push_str(&entry.final_answer);
    out
}

/// Format one decision as JSON
pub fn format_decision_json(entry: &DecisionLogEntry) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entry)
}

/// Format decision log entries as a table
pub fn format_entries_table(entries: &[DecisionLogEntry]) -> String {
    let mut table = new_table(vec![
        "Time", "Query", "Status", "Resolution", "Cost", "Latency", "Answer",
    ]);

    for e in entries {
        table.add_row(vec![
            Cell::new(e.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(truncate(&e.query_text, 40)),
            Cell::new(status_label(e.decision.status)),
            Cell::new(e.resolution()),
            Cell::new(format!("${:.4}", e.total_cost)),
            Cell::new(format!("{}ms", e.total_latency_ms)),
            Cell::new(truncate(&e.final_answer, ANSWER_PREVIEW_LEN)),
        ]);
    }

    table.to_string()
}

/// Format aggregate statistics as a table
pub fn format_stats_table(stats: &DecisionStats) -> String {
    let mut table = new_table(vec!["Metric", "Value"]);
    let rows = [
        ("Decisions", stats.total.to_string()),
        ("Approved", stats.approved.to_string()),
        ("Escalated", stats.escalated.to_string()),
        ("Rejected", stats.rejected.to_string()),
        ("Total cost", format!("${:.4}", stats.total_cost)),
        ("Mean cost", format!("${:.4}", stats.mean_cost)),
        ("Mean latency", format!("{:.0}ms", stats.mean_latency_ms)),
        ("Max latency", format!("{}ms", stats.max_latency_ms)),
        (
            "Tiebreaker rate",
            format!("{:.1}%", stats.tiebreaker_rate * 100.0),
        ),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table.to_string()
}

/// Format log entries and statistics as JSON
pub fn format_log_json(
    entries: &[DecisionLogEntry],
    stats: &DecisionStats,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "entries": entries,
        "stats": stats,
    }))
}
