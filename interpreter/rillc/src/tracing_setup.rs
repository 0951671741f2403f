//! Logging for the CLI.
//!
//! The filter comes from `RILL_LOG` (or `RUST_LOG` as a fallback) and
//! defaults to `warn`, so script output is never interleaved with
//! diagnostics unless asked for. Setting `RILL_LOG_TREE` switches the
//! flat line format to an indented span tree, which is the readable way
//! to follow nested evaluator calls.

use std::io;
use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceLock<()> = OnceLock::new();

fn env_filter() -> EnvFilter {
    ["RILL_LOG", "RUST_LOG"]
        .iter()
        .find_map(|var| EnvFilter::try_from_env(var).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

/// Install the global subscriber; no-op after the first call.
pub fn init() {
    INSTALLED.get_or_init(|| {
        let base = tracing_subscriber::registry().with(env_filter());
        if std::env::var_os("RILL_LOG_TREE").is_some() {
            base.with(
                tracing_tree::HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_writer(io::stderr),
            )
            .init();
        } else {
            base.with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(io::stderr),
            )
            .init();
        }
    });
}
