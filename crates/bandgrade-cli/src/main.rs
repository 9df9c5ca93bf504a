//! bandgrade CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "bandgrade",
    version,
    about = "IELTS-style test authoring and auto-grading"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a test file and list its questions
    Parse {
        /// Path to a .toml test file
        #[arg(long)]
        test: PathBuf,

        /// Write the student-facing view (answers stripped) as JSON
        #[arg(long)]
        student_view: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Grade a submission against a test
    Grade {
        /// Path to a .toml test file
        #[arg(long)]
        test: PathBuf,

        /// Path to a submission JSON file
        #[arg(long)]
        submission: PathBuf,

        /// Directory to write the JSON report into
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate test TOML files
    Validate {
        /// Path to a test file or directory
        #[arg(long)]
        test: PathBuf,
    },

    /// Create a starter test and example submission
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bandgrade=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            test,
            student_view,
            format,
        } => commands::parse::execute(test, student_view, format),
        Commands::Grade {
            test,
            submission,
            output,
            format,
        } => commands::grade::execute(test, submission, output, format),
        Commands::Validate { test } => commands::validate::execute(test),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
