//! Answer grader CLI
//!
//! Scores candidate answers against reference answers with a panel of LLM
//! providers, falling back to a lexical heuristic when none respond.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use answer_grader_cli::commands::{evaluate, grade, CommandContext};
use answer_grader_common::{init_from_config, GraderConfig};

#[derive(Parser, Debug)]
#[command(name = "answer-grader")]
#[command(author, version, about = "Grade free-text answers with an LLM panel")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to config/default plus config/$GRADER_ENV)
    #[arg(short, long, global = true, env = "GRADER_CONFIG")]
    config: Option<PathBuf>,

    /// Skip providers and score with the heuristic only
    #[arg(long, global = true)]
    heuristic_only: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Grade a single answer
    #[command(alias = "e")]
    Evaluate {
        /// Question identifier echoed on the result
        #[arg(long, default_value = "q1")]
        question_id: String,

        /// Question text
        #[arg(short, long)]
        question: String,

        /// Reference answer
        #[arg(short, long)]
        expected: String,

        /// Answer to grade
        #[arg(short = 'a', long)]
        candidate: String,
    },

    /// Grade every answer in a JSON submission file
    #[command(alias = "g")]
    Grade {
        /// Path to a JSON array of evaluation requests
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GraderConfig::load_from(&path.to_string_lossy())
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => GraderConfig::load().context("Failed to load configuration")?,
    };
    init_from_config(&config.telemetry)?;

    let ctx = CommandContext::new(&config, cli.heuristic_only, cli.pretty)?;

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding evaluations");
            cancel.cancel();
        }
    });

    let output = match cli.command {
        Commands::Evaluate {
            question_id,
            question,
            expected,
            candidate,
        } => {
            let args = evaluate::EvaluateArgs {
                question_id,
                question,
                expected,
                candidate,
            };
            let result = evaluate::run(&ctx, args).await?;
            ctx.render(&result)?
        }
        Commands::Grade { file } => {
            let report = grade::run(&ctx, &file).await?;
            ctx.render(&report)?
        }
    };

    println!("{}", output);
    Ok(())
}
