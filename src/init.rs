//! Initialization helpers for the application startup.

use crate::config::Config;
use crate::engine::{HttpSource, RuleProvider};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.logging.level.clone();

        // Keep the HTTP stack quiet unless explicitly enabled
        for noisy in ["hyper", "reqwest", "rustls"] {
            if !filter.contains(noisy) {
                filter.push_str(&format!(",{}=warn", noisy));
            }
        }

        tracing_subscriber::EnvFilter::new(filter)
    });

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Builds the HTTP-backed provider described by the config. The refresh
/// loop is not started.
pub fn init_provider(config: &Config) -> Result<Arc<RuleProvider>> {
    let source = HttpSource::new(&config.source).context("Failed to build HTTP client")?;
    let provider = RuleProvider::new(Arc::new(source), config.update_interval());
    info!(
        "Rule source {} refreshed every {:?}",
        config.source.url,
        provider.interval()
    );
    Ok(provider)
}
