use std::str::FromStr;

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn,alloy_transport_http=warn,alloy_rpc_client=warn,alloy_provider=warn";

/// A bare level such as `debug` also quiets the HTTP and RPC stack.
/// Full directive strings are used as given.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{},{}", normalized, QUIET_DEPENDENCIES)
    }
}

/// Installs the global subscriber. Logs go to stderr so REPL output stays clean.
pub fn setup_logging(log_level: &str, json_format: bool) -> Result<()> {
    let spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_current_span(false);
        subscriber.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact();
        subscriber.with(fmt_layer).try_init()
    };
    installed.map_err(|e| anyhow!("failed to install logger: {}", e))?;

    tracing::debug!(
        filter = %spec,
        format = if json_format { "json" } else { "compact" },
        "logging initialized"
    );
    Ok(())
}
