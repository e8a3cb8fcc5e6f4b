//! Tracing subscriber setup
//!
//! Logs go to stderr so that `--json` output on stdout stays parseable.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default `info` filter; `verbose` forces debug
/// for the agent crates.
pub fn init(json: bool, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("qa_agent=debug,qa_orchestrator=debug,qa_scan=debug,qa_synth=debug,qa_exec=debug,qa_triage=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
