//! Suite runner

use crate::commands::RunArgs;
use crate::error::{CliError, CliResult};
use chatfocus::mock::FocusPolicy;
use chatfocus::{focus_suite, run_simulated, HarnessConfig, SuiteResults};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Load `path`, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> CliResult<HarnessConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading harness configuration");
            Ok(HarnessConfig::from_file(path)?)
        }
        None => Ok(HarnessConfig::default()),
    }
}

/// Effective configuration for a run: file or defaults, then flag overrides
pub fn build_harness_config(args: &RunArgs) -> CliResult<HarnessConfig> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ms) = args.poll_interval_ms {
        config.wait.poll_interval_ms = ms;
    }
    if let Some(ms) = args.timeout_ms {
        config.wait.timeout_ms = ms;
    }
    if let Some(ms) = args.handshake_timeout_ms {
        config.handshake_timeout_ms = ms;
    }
    if let Some(readiness) = args.readiness {
        config.simulation.readiness = readiness.into();
    }
    if args.steal_focus {
        config.simulation.policy = FocusPolicy::StealOnBackground;
    }

    config.validate()?;
    Ok(config)
}

/// Run the focus suite on a single-threaded runtime
pub fn run_suite(config: &HarnessConfig, args: &RunArgs) -> CliResult<SuiteResults> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let suite = focus_suite().with_fail_fast(args.fail_fast);
    let limit = Duration::from_millis(args.suite_timeout_ms);
    runtime.block_on(async {
        tokio::time::timeout(limit, run_simulated(config, suite))
            .await
            .map_err(|_| CliError::SuiteTimeout {
                ms: args.suite_timeout_ms,
            })
    })
}
