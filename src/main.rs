use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tsrgen::cli::{Cli, Commands};
use tsrgen::commands::{self, BatchConfig, GateCommandConfig, GatesConfig, GenerateConfig};
use tsrgen::observability;
use tsrgen::quality_gate::Recommendation;
use tsrgen::report::ReportMetadata;

/// Exit status when a quality gate rejects the release.
const EXIT_REJECTED: i32 = 2;

fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::install_panic_hook();
    observability::init_logging(cli.verbosity);

    match cli.command {
        Commands::Generate {
            file,
            project,
            release,
            environment,
            scope,
            objectives,
            linked_plan,
            outdir,
            format,
            gate,
            narrative,
        } => {
            commands::handle_generate(GenerateConfig {
                file,
                metadata: ReportMetadata {
                    project,
                    release,
                    environment,
                    scope,
                    objectives,
                    linked_plan,
                    source_file: String::new(),
                },
                outdir,
                format: format.into(),
                quality_gate: gate.quality_gate,
                config: gate.config,
                narrator: narrative.narrator,
                narrator_timeout: Duration::from_secs(narrative.narrator_timeout),
                skip_narrative: narrative.skip_narrative,
            })?;
        }
        Commands::Batch {
            files,
            outdir,
            project,
            release,
            gate,
            narrative,
        } => {
            let failures = commands::handle_batch(BatchConfig {
                files,
                outdir,
                project,
                release,
                quality_gate: gate.quality_gate,
                config: gate.config,
                narrator: narrative.narrator,
                narrator_timeout: Duration::from_secs(narrative.narrator_timeout),
                skip_narrative: narrative.skip_narrative,
            })?;
            if failures > 0 {
                anyhow::bail!("{failures} input(s) failed");
            }
        }
        Commands::Gate {
            pass_rate,
            critical,
            major,
            format,
            gate,
        } => {
            let recommendation = commands::handle_gate(GateCommandConfig {
                pass_rate,
                critical,
                major,
                quality_gate: gate.quality_gate,
                config: gate.config,
                format: format.into(),
            })?;
            if recommendation == Recommendation::Rejected {
                std::process::exit(EXIT_REJECTED);
            }
        }
        Commands::Gates { check, config } => {
            let problems = commands::handle_gates(GatesConfig { check, config })?;
            if problems > 0 {
                anyhow::bail!("{problems} configuration problem(s) found");
            }
        }
        Commands::Init { force } => {
            let dir = std::env::current_dir()?;
            let path = commands::init_config(&dir, force)?;
            println!("Created {} configuration file", path.display());
        }
    }
    Ok(())
}
