//! CLI module for Verdict
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `ask` - Run one query through the consensus pipeline
//! - `providers` - List configured providers
//! - `log` - Inspect a JSON-lines decision log
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! verdict ask "Engine misfires under load" --code P0301
//! verdict log decisions.jsonl --status escalated
//! verdict completions bash > ~/.bash_completion.d/verdict
//! ```

pub mod ask;
pub mod completions;
pub mod config;
pub mod log;
pub mod output;
pub mod providers;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::safety::SafetyStatus;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Verdict - multi-provider LLM consensus with safety gating
#[derive(Parser, Debug)]
#[command(
    name = "verdict",
    version,
    about = "Ask several LLM providers, score their agreement, and gate the answer"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query through the pipeline
    Ask(AskArgs),
    /// List configured providers
    Providers(ProvidersArgs),
    /// Show entries and statistics from a decision log
    Log(LogArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Free-form question or symptom description
    pub question: String,

    /// Diagnostic trouble code (e.g., P0301)
    #[arg(long)]
    pub code: Option<String>,

    /// Extra context attribute, repeatable (e.g., --attr mileage=120000)
    #[arg(short, long = "attr", value_parser = parse_key_value)]
    pub attrs: Vec<(String, String)>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Append the decision to this JSON-lines log
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, default_value = "verdict.toml")]
    pub config: PathBuf,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VERDICT_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "verdict.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// JSON-lines decision log to read
    pub file: PathBuf,

    /// Filter by status (approved, escalated, rejected)
    #[arg(short, long)]
    pub status: Option<SafetyStatus>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "verdict.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Parse a `key=value` pair.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid attribute '{}': expected key=value", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("invalid attribute '{}': empty key", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_ask_defaults() {
        let cli = Cli::try_parse_from(["verdict", "ask", "Engine misfire"]).unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.question, "Engine misfire");
                assert_eq!(args.config, PathBuf::from("verdict.toml"));
                assert!(args.code.is_none());
                assert!(args.attrs.is_empty());
                assert!(!args.json);
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_cli_parse_ask_with_context() {
        let cli = Cli::try_parse_from([
            "verdict",
            "ask",
            "Rough idle",
            "--code",
            "P0301",
            "--attr",
            "mileage=120000",
            "-a",
            "engine = 2.0L",
            "--log-file",
            "decisions.jsonl",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.code.as_deref(), Some("P0301"));
                assert_eq!(
                    args.attrs,
                    vec![
                        ("mileage".to_string(), "120000".to_string()),
                        ("engine".to_string(), "2.0L".to_string()),
                    ]
                );
                assert_eq!(args.log_file, Some(PathBuf::from("decisions.jsonl")));
                assert!(args.json);
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_cli_rejects_malformed_attr() {
        let result = Cli::try_parse_from(["verdict", "ask", "q", "--attr", "novalue"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["verdict", "ask", "q", "--attr", "=x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_providers_json() {
        let cli = Cli::try_parse_from(["verdict", "providers", "--json", "-c", "x.toml"]).unwrap();
        match cli.command {
            Commands::Providers(args) => {
                assert!(args.json);
                assert_eq!(args.config, PathBuf::from("x.toml"));
            }
            _ => panic!("Expected Providers command"),
        }
    }

    #[test]
    fn test_cli_parse_log_status() {
        let cli =
            Cli::try_parse_from(["verdict", "log", "d.jsonl", "--status", "escalated"]).unwrap();
        match cli.command {
            Commands::Log(args) => {
                assert_eq!(args.file, PathBuf::from("d.jsonl"));
                assert_eq!(args.status, Some(SafetyStatus::Escalated));
            }
            _ => panic!("Expected Log command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_status() {
        let result = Cli::try_parse_from(["verdict", "log", "d.jsonl", "--status", "maybe"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_config_init() {
        let cli = Cli::try_parse_from(["verdict", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init(args)) => {
                assert!(args.force);
                assert_eq!(args.output, PathBuf::from("verdict.toml"));
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
