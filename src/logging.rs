//! `tracing` subscriber setup for the CLI.
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.
//! Precedence: `RUST_LOG` > `--verbose` > `[logging] filter` from config.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Directive used when the configured one does not parse.
pub const DEFAULT_FILTER: &str = "exif_scout=info";

/// Directive applied when `--verbose` is given.
pub const VERBOSE_FILTER: &str = "exif_scout=debug";

/// Pick the filter directive from `RUST_LOG`, the verbose flag and the
/// configured default, in that order.
pub fn resolve_filter(env: Option<&str>, configured: &str, verbose: bool) -> String {
    match env {
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ if verbose => VERBOSE_FILTER.to_string(),
        _ => configured.to_string(),
    }
}

/// Install the global subscriber. Calling it twice is a no-op.
pub fn init_logging(configured: &str, verbose: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = resolve_filter(env.as_deref(), configured, verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .ok();
}
