//! CLI command implementations.
//!
//! - **generate**: full report for one execution file
//! - **batch**: one report per file, in parallel
//! - **gate**: evaluate a quality gate from raw numbers
//! - **gates**: list and check the configured profiles
//! - **init**: write a starter configuration

pub mod batch;
pub mod gate;
pub mod gates;
pub mod generate;
pub mod init;

pub use batch::{handle_batch, BatchConfig, BatchOutcome};
pub use gate::{handle_gate, GateCommandConfig};
pub use gates::{handle_gates, GatesConfig};
pub use generate::{handle_generate, GenerateConfig};
pub use init::init_config;

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::config::{load_config, ProcessEnv, ReportConfig};
use crate::narrative::{CommandNarrator, NarrativeGenerator, StubNarrator};

/// Load the configuration from `path` or by discovery, with the process
/// environment applied.
pub fn load_report_config(path: Option<&Path>) -> Result<ReportConfig> {
    load_config(path, &ProcessEnv).context("Failed to load configuration")
}

/// Pick the narrative generator for a run.
pub fn select_narrator(
    command: Option<&str>,
    skip: bool,
    timeout: Duration,
) -> Box<dyn NarrativeGenerator> {
    if skip {
        return Box::new(StubNarrator);
    }
    match command.map(str::trim).filter(|c| !c.is_empty()) {
        Some(line) => match CommandNarrator::from_command_line(line) {
            Some(narrator) => Box::new(narrator.with_timeout(timeout)),
            None => {
                warn!("Narrator command '{}' is empty; using built-in narrative", line);
                Box::new(StubNarrator)
            }
        },
        None => Box::new(StubNarrator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_narrator() {
        let timeout = Duration::from_secs(1);
        assert_eq!(select_narrator(None, false, timeout).name(), "builtin");
        assert_eq!(select_narrator(Some("  "), false, timeout).name(), "builtin");
        assert_eq!(select_narrator(Some("agent --json"), true, timeout).name(), "builtin");
        assert_eq!(select_narrator(Some("agent --json"), false, timeout).name(), "agent");
    }
}
