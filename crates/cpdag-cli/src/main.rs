#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cpdag: orient causal skeletons into CPDAGs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format (defaults to pretty on a terminal, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Orient a skeleton with its separation sets",
        after_help = "EXAMPLES:\n    # Orient and print the edge-mark matrix\n    cpdag orient --input graph.json --format text"
    )]
    Orient(cmd::orient::OrientArgs),

    #[command(
        about = "Validate a discovery config",
        after_help = "EXAMPLES:\n    # Resolve parameters for a 12-variable dataset\n    cpdag check --config cpdag.toml --vars 12"
    )]
    Check(cmd::check::CheckArgs),

    #[command(about = "List independence tests and their acceleration policy")]
    Tests(cmd::tests_cmd::TestsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CPDAG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "cpdag_core=debug,cpdag=debug,info"
        } else {
            "cpdag_core=warn,warn"
        })
    });

    let format = env::var("CPDAG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();

    match cli.command {
        Commands::Orient(ref args) => cmd::orient::run_orient(args, output),
        Commands::Check(ref args) => cmd::check::run_check(args, output),
        Commands::Tests(ref args) => cmd::tests_cmd::run_tests(args, output),
    }
}
