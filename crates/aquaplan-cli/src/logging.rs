// SPDX-License-Identifier: Apache-2.0

use crate::settings::{env_bool, ENV_LOG_JSON};
use aquaplan_core::ENV_AQUAPLAN_LOG_LEVEL;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogFlags {
    pub quiet: bool,
    pub verbose: u8,
}

impl LogFlags {
    fn default_directive(self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Logs go to stderr so command output on stdout stays machine-readable.
/// `RUST_LOG` wins over `AQUAPLAN_LOG_LEVEL`, which wins over the flags.
pub fn init_tracing(flags: LogFlags) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(ENV_AQUAPLAN_LOG_LEVEL))
        .unwrap_or_else(|_| EnvFilter::new(flags.default_directive()));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if env_bool(ENV_LOG_JSON, false) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    // A subscriber may already be installed when embedded in tests.
    let _ = result;
}
