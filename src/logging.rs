//! Diagnostic logging to stderr.
//!
//! Command output goes to stdout; everything emitted through `tracing` goes to
//! stderr so it never mixes with JSON output.

use tracing_subscriber::EnvFilter;

/// Overrides the default filter, e.g. `ADO_LOG=ado=trace,reqwest=debug`.
pub const LOG_ENV: &str = "ADO_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "ado=debug" } else { "ado=warn" }
}

/// Pick the filter directive: `--verbose` wins, then `ADO_LOG`, then warnings only.
fn select_directive(verbose: bool, env_directive: Option<&str>) -> String {
    match env_directive.map(str::trim).filter(|d| !verbose && !d.is_empty()) {
        Some(directive) => directive.to_string(),
        None => default_directive(verbose).to_string(),
    }
}

pub fn init_logging(verbose: bool) {
    let env_directive = std::env::var(LOG_ENV).ok();
    let directive = select_directive(verbose, env_directive.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // A second initialisation only happens in tests; ignore it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}
