use anyhow::Result;
use clap::{Parser, Subcommand};
use cp_verify::commands::verify::VerifyArgs;
use cp_verify::commands::{check, download, merge_input, merge_result, verify};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cp-verify")]
#[command(about = "Incremental verification orchestrator for competitive-programming libraries", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pending verifications and write a result file
    Verify {
        /// Path to the verification input JSON
        input: PathBuf,

        /// Wall-clock budget in seconds for the whole batch; work that
        /// would start past it is recorded as skipped
        #[arg(long)]
        timeout: Option<f64>,

        /// Default per-testcase time limit in seconds
        #[arg(long, default_value_t = 60.0)]
        tle: f64,

        /// Default memory limit in megabytes
        #[arg(long)]
        mle: Option<f64>,

        /// Result file of a previous run; files it proved fresh are skipped
        #[arg(long)]
        prev_result: Option<PathBuf>,

        /// Total number of parallel jobs
        #[arg(long)]
        split: Option<usize>,

        /// Zero-based index of this job (requires --split)
        #[arg(long)]
        split_index: Option<usize>,

        /// Where to write the result JSON
        #[arg(short, long, default_value = ".cp-verify/result.json")]
        output: PathBuf,

        /// Do not fetch missing problem test cases
        #[arg(long)]
        no_download: bool,
    },

    /// Print a status histogram over result files and set the exit code
    Check {
        /// Result JSON files to inspect (merged before tallying)
        #[arg(required = true)]
        results: Vec<PathBuf>,
    },

    /// Merge verification input files produced by separate scans
    MergeInput {
        /// Input JSON files; later files win per path
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Write the merged input here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge result files from parallel shards or successive runs
    MergeResult {
        /// Result JSON files, oldest first
        #[arg(required = true)]
        results: Vec<PathBuf>,

        /// Write the merged result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Pre-populate problem test-case caches
    Download {
        /// Verification input JSON whose problem URLs should be fetched
        #[arg(long)]
        verify_json: Option<PathBuf>,

        /// Additional problem URLs
        urls: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        // 0: everything passed; 1: verifications failed.
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        // 2: usage or internal error, before/outside verification proper.
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Verify {
            input,
            timeout,
            tle,
            mle,
            prev_result,
            split,
            split_index,
            output,
            no_download,
        } => verify::execute(VerifyArgs {
            input,
            timeout,
            tle,
            mle,
            prev_result,
            split,
            split_index,
            output,
            download: !no_download,
        }),
        Commands::Check { results } => check::execute(&results),
        Commands::MergeInput { inputs, output } => {
            merge_input::execute(&inputs, output.as_deref())
        }
        Commands::MergeResult { results, output } => {
            merge_result::execute(&results, output.as_deref())
        }
        Commands::Download { verify_json, urls } => {
            download::execute(verify_json.as_deref(), &urls)
        }
    }
}
