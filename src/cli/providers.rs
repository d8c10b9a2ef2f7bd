//! Providers command implementation

use crate::cli::output::{format_providers_json, format_providers_table};
use crate::cli::ProvidersArgs;
use crate::config::VerdictConfig;
use crate::registry::{BackendView, ProviderRegistry};

/// Handle `verdict providers` command
pub fn handle_providers(args: &ProvidersArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = VerdictConfig::load(Some(&args.config))?.with_env_overrides();
    config.validate()?;
    let registry = ProviderRegistry::from_config(&config)?;

    let views: Vec<BackendView> = registry.all().iter().map(|d| BackendView::from(d.as_ref())).collect();

    if args.json {
        Ok(format_providers_json(&views)?)
    } else {
        Ok(format_providers_table(&views))
    }
}
