//! Log subscriber setup

use crate::config::CliConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the level derived from `-v`/`-q`. Logs
/// go to stderr so stdout only carries results. Installing twice is a no-op.
pub fn init(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.filter_directive()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
