//! Logging configuration
//!
//! Every pktforge binary logs through `tracing`. This module turns a
//! [`LoggerConfig`] into a global subscriber writing to stderr.

use crate::{ForgeError, ForgeResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logger options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Disable ANSI colours in text output
    pub no_color: bool,
    /// 0 = info, 1 = debug, 2+ = trace
    pub verbose: u8,
    /// Raise the level to warn (wins over `verbose`)
    pub quiet: bool,
    /// Include source file and line of each event
    pub add_caller: bool,
}

impl LoggerConfig {
    /// Default filter directive derived from the verbosity flags
    pub fn level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Whether events carry their source location
    pub fn with_caller(&self) -> bool {
        self.add_caller || (!self.quiet && self.verbose > 0)
    }

    /// Merge command-line flags over file settings
    pub fn merge_flags(&mut self, json: bool, no_color: bool, verbose: u8, quiet: bool) {
        self.json |= json;
        self.no_color |= no_color;
        self.verbose = self.verbose.max(verbose);
        self.quiet |= quiet;
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the level derived from `config`.
pub fn init_logging(config: &LoggerConfig) -> ForgeResult<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| ForgeError::Logging(format!("invalid RUST_LOG: {e}")))?,
        _ => EnvFilter::new(config.level()),
    };
    let caller = config.with_caller();

    let json_layer = config.json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(caller)
            .with_line_number(caller)
    });
    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(!config.no_color)
            .with_file(caller)
            .with_line_number(caller)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| ForgeError::Logging(e.to_string()))
}
