//! Ask command implementation

use crate::cli::output::{format_decision, format_decision_json};
use crate::cli::AskArgs;
use crate::config::VerdictConfig;
use crate::coordinator::Coordinator;
use crate::decision_log::{DecisionStore, InMemoryDecisionLog, JsonlDecisionLog};
use crate::gateway::HttpGateway;
use crate::logging::init_tracing;
use crate::provider::EnvCredentialResolver;
use crate::query::{QueryContext, QueryRequest};
use crate::registry::ProviderRegistry;
use std::sync::Arc;

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &AskArgs,
) -> Result<VerdictConfig, Box<dyn std::error::Error>> {
    let mut config = if args.config.exists() {
        VerdictConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        VerdictConfig::default()
    };

    config = config.with_env_overrides();

    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }

    Ok(config)
}

/// Build the query from the question and its context flags.
pub fn build_request(args: &AskArgs) -> Result<QueryRequest, Box<dyn std::error::Error>> {
    if args.question.trim().is_empty() {
        return Err("Question must not be empty".into());
    }

    let mut context = match &args.code {
        Some(code) => QueryContext::with_code(code),
        None => QueryContext::default(),
    };
    for (key, value) in &args.attrs {
        context = context.attribute(key, value);
    }

    Ok(QueryRequest::new(args.question.trim()).with_context(context))
}

/// Handle `verdict ask` command
pub async fn run_ask(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args)?;
    config.validate_for_run()?;
    init_tracing(&config.logging)?;

    let registry = Arc::new(ProviderRegistry::from_config(&config)?);
    let gateway = Arc::new(
        HttpGateway::new(Arc::new(EnvCredentialResolver), &config.gateway)
            .with_content_logging(config.logging.enable_content_logging),
    );
    let store: Arc<dyn DecisionStore> = match &args.log_file {
        Some(path) => Arc::new(JsonlDecisionLog::open(path)?),
        None => Arc::new(InMemoryDecisionLog::new()),
    };

    let request = build_request(&args)?;
    let coordinator = Coordinator::new(&config, registry, gateway, store);
    let entry = coordinator.run(&request).await?;

    if args.json {
        println!("{}", format_decision_json(&entry)?);
    } else {
        println!("{}", format_decision(&entry));
    }

    Ok(())
}
