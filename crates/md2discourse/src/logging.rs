//! Tracing setup for the CLI.
//!
//! `--debug` turns on request/response logging for both crates. Without it,
//! `RUST_LOG` is honoured and the default is warnings only. Logs go to stderr so
//! stdout stays reserved for command output.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const DEBUG_FILTER: &str = "md2discourse=debug,md2discourse_core=debug";
const DEFAULT_FILTER: &str = "warn";

pub fn init_logging(debug: bool) {
    let filter_layer = if debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
