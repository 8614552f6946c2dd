use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tsrgen")]
#[command(about = "Test summary report generator with release quality gates", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a full test summary report from one execution file
    Generate {
        /// Test execution file (.csv or .json)
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        project: String,

        #[arg(long)]
        release: String,

        #[arg(long, default_value = "")]
        environment: String,

        #[arg(long, default_value = "")]
        scope: String,

        #[arg(long, default_value = "")]
        objectives: String,

        #[arg(long = "linked-plan", default_value = "")]
        linked_plan: String,

        /// Directory receiving the report artifacts
        #[arg(long, default_value = "reports")]
        outdir: PathBuf,

        /// Format printed to stdout
        #[arg(long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        #[command(flatten)]
        gate: GateArgs,

        #[command(flatten)]
        narrative: NarrativeArgs,
    },

    /// Generate reports for several execution files in parallel
    Batch {
        /// Test execution files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, default_value = "reports")]
        outdir: PathBuf,

        /// Project name; defaults to each file's stem
        #[arg(long)]
        project: Option<String>,

        #[arg(long, default_value = "batch")]
        release: String,

        #[command(flatten)]
        gate: GateArgs,

        #[command(flatten)]
        narrative: NarrativeArgs,
    },

    /// Evaluate a quality gate from raw numbers
    Gate {
        /// Pass rate percentage, 0 to 100
        #[arg(long = "pass-rate", value_parser = parse_pass_rate)]
        pass_rate: f64,

        #[arg(long, default_value = "0")]
        critical: usize,

        #[arg(long, default_value = "0")]
        major: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        #[command(flatten)]
        gate: GateArgs,
    },

    /// List the configured quality gate profiles
    Gates {
        /// Validate the configuration and fail on problems
        #[arg(long)]
        check: bool,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Create a starter tsrgen.yaml
    Init {
        #[arg(short, long)]
        force: bool,
    },
}

fn parse_pass_rate(value: &str) -> Result<f64, String> {
    let rate: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !(0.0..=100.0).contains(&rate) {
        return Err(format!("pass rate must be between 0 and 100, got {value}"));
    }
    Ok(rate)
}

#[derive(clap::Args, Debug, Clone)]
pub struct GateArgs {
    /// Quality gate profile id [default: configured override, else "default"]
    #[arg(long = "quality-gate")]
    pub quality_gate: Option<String>,

    /// Configuration file (otherwise discovered from the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct NarrativeArgs {
    /// External command producing narrative JSON from a prompt on stdin
    #[arg(long, env = "TSR_NARRATOR")]
    pub narrator: Option<String>,

    /// Seconds an external narrator may run per section before it is killed
    #[arg(long = "narrator-timeout", env = "TSR_NARRATOR_TIMEOUT", default_value = "120")]
    pub narrator_timeout: u64,

    /// Use the built-in narrative without calling any agent
    #[arg(long = "skip-narrative")]
    pub skip_narrative: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

impl From<OutputFormat> for crate::io::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Json => crate::io::OutputFormat::Json,
            OutputFormat::Markdown => crate::io::OutputFormat::Markdown,
            OutputFormat::Terminal => crate::io::OutputFormat::Terminal,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_conversion() {
        assert_eq!(
            crate::io::OutputFormat::from(OutputFormat::Json),
            crate::io::OutputFormat::Json
        );
        assert_eq!(
            crate::io::OutputFormat::from(OutputFormat::Markdown),
            crate::io::OutputFormat::Markdown
        );
        assert_eq!(
            crate::io::OutputFormat::from(OutputFormat::Terminal),
            crate::io::OutputFormat::Terminal
        );
    }

    #[test]
    fn test_cli_parsing_generate_command() {
        let cli = Cli::parse_from([
            "tsrgen",
            "generate",
            "--file",
            "runs.csv",
            "--project",
            "Shop",
            "--release",
            "R1",
            "--quality-gate",
            "strict",
            "--skip-narrative",
            "-vv",
        ]);

        assert_eq!(cli.verbosity, 2);
        match cli.command {
            Commands::Generate {
                file,
                project,
                outdir,
                format,
                gate,
                narrative,
                ..
            } => {
                assert_eq!(file, PathBuf::from("runs.csv"));
                assert_eq!(project, "Shop");
                assert_eq!(outdir, PathBuf::from("reports"));
                assert_eq!(format, OutputFormat::Terminal);
                assert_eq!(gate.quality_gate.as_deref(), Some("strict"));
                assert!(narrative.skip_narrative);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parsing_gate_command() {
        let cli = Cli::parse_from([
            "tsrgen",
            "gate",
            "--pass-rate",
            "92.5",
            "--major",
            "3",
        ]);
        match cli.command {
            Commands::Gate {
                pass_rate,
                critical,
                major,
                gate,
                ..
            } => {
                assert_eq!(pass_rate, 92.5);
                assert_eq!(critical, 0);
                assert_eq!(major, 3);
                assert_eq!(gate.quality_gate, None);
                assert_eq!(gate.config, None);
            }
            _ => panic!("Expected Gate command"),
        }
    }

    #[test]
    fn test_cli_parsing_batch_requires_files() {
        assert!(Cli::try_parse_from(["tsrgen", "batch"]).is_err());
        let cli = Cli::try_parse_from(["tsrgen", "batch", "a.csv", "b.json"]).unwrap();
        match cli.command {
            Commands::Batch { files, release, .. } => {
                assert_eq!(files.len(), 2);
                assert_eq!(release, "batch");
            }
            _ => panic!("Expected Batch command"),
        }
    }

    #[test]
    fn test_cli_parsing_init_and_gates() {
        let cli = Cli::parse_from(["tsrgen", "init", "--force"]);
        assert!(matches!(cli.command, Commands::Init { force: true }));

        let cli = Cli::parse_from(["tsrgen", "gates", "--check"]);
        assert!(matches!(cli.command, Commands::Gates { check: true, .. }));
    }

    #[test]
    fn test_pass_rate_must_be_a_percentage() {
        for bad in ["NaN", "inf", "-1", "100.5", "abc"] {
            let parsed = Cli::try_parse_from(["tsrgen", "gate", "--pass-rate", bad]);
            assert!(parsed.is_err(), "{bad} should be rejected");
        }
        assert_eq!(parse_pass_rate("0"), Ok(0.0));
        assert_eq!(parse_pass_rate(" 100 "), Ok(100.0));
    }
}
