//! Log command implementation

use crate::cli::output::{format_entries_table, format_log_json, format_stats_table};
use crate::cli::LogArgs;
use crate::decision_log::{read_entries, DecisionFilter, DecisionStats};

/// Handle `verdict log` command
pub fn handle_log(args: &LogArgs) -> Result<String, Box<dyn std::error::Error>> {
    let mut filter = DecisionFilter::new();
    if let Some(status) = args.status {
        filter = filter.with_status(status);
    }

    let entries: Vec<_> = read_entries(&args.file)?
        .into_iter()
        .filter(|e| filter.matches(e))
        .collect();
    let stats = DecisionStats::from_entries(&entries);

    if args.json {
        Ok(format_log_json(&entries, &stats)?)
    } else {
        Ok(format!(
            "{}\n{}",
            format_entries_table(&entries),
            format_stats_table(&stats)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision_log::test_support::entry;
    use crate::decision_log::{DecisionStore, JsonlDecisionLog};
    use crate::safety::SafetyStatus;

    #[test]
    fn test_log_filters_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decisions.jsonl");
        let log = JsonlDecisionLog::open(&path).unwrap();
        log.append(&entry(SafetyStatus::Approved, 0.01, 100)).unwrap();
        log.append(&entry(SafetyStatus::Escalated, 0.02, 200)).unwrap();
        log.append(&entry(SafetyStatus::Escalated, 0.03, 400)).unwrap();

        let output = handle_log(&LogArgs {
            file: path,
            status: Some(SafetyStatus::Escalated),
            json: true,
        })
        .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["entries"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["stats"]["total"], 2);
        assert_eq!(parsed["stats"]["max_latency_ms"], 400);
    }

    #[test]
    fn test_log_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = handle_log(&LogArgs {
            file: dir.path().join("absent.jsonl"),
            status: None,
            json: false,
        });
        assert!(result.is_err());
    }
}
