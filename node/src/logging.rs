//! # Structured Logging
//!
//! Installs the `tracing` subscriber for the node: pretty lines for a
//! terminal, JSON lines for log shippers, filtered through `RUST_LOG`.
//!
//! Everything goes to stderr. `tip3-node status` prints its JSON on stdout
//! and must stay pipeable.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored output.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "tip3_node=debug,tip3_contracts=debug,tip3_protocol=debug,tower_http=debug"
    } else {
        "tip3_node=info,tip3_contracts=info,tip3_protocol=warn"
    }
}

/// Initialize the global tracing subscriber.
///
/// Call exactly once, early in `main()`. A second call panics.
///
/// `RUST_LOG` overrides `default_level` when set:
///
/// ```text
/// RUST_LOG=tip3_node=debug,tip3_contracts=trace
/// ```
pub fn init_logging(default_level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }

    tracing::debug!(?format, "logging initialized");
}
