//! Headless skirmish runner
//!
//! Plays scripted scenarios against the rules engine and prints a JSON
//! report per scenario. Scenarios are independent and run in parallel.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;

use hexhaven_combat::battle::scenario::{Scenario, ScenarioReport};
use hexhaven_combat::core::{Result, RulesConfig};

/// Run scripted Hexhaven skirmishes and report the outcome as JSON
#[derive(Parser, Debug)]
#[command(name = "skirmish")]
#[command(about = "Run scripted combat scenarios and output JSON reports")]
struct Args {
    /// Scenario JSON files
    #[arg(required = true)]
    scenarios: Vec<PathBuf>,

    /// Rules config TOML (defaults apply when omitted)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Drop the event log from the output
    #[arg(long)]
    no_events: bool,
}

/// One entry per scenario file
#[derive(Serialize)]
struct RunOutput {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ScenarioReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn run_file(path: &PathBuf, config: &RulesConfig) -> Result<ScenarioReport> {
    let scenario = Scenario::load(path)?;
    scenario.run(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hexhaven_combat=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.rules {
        Some(path) => match RulesConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to load rules");
                return ExitCode::FAILURE;
            }
        },
        None => RulesConfig::default(),
    };

    let outputs: Vec<RunOutput> = args
        .scenarios
        .par_iter()
        .map(|path| {
            let file = path.display().to_string();
            match run_file(path, &config) {
                Ok(mut report) => {
                    if args.no_events {
                        report.events.clear();
                    }
                    RunOutput {
                        file,
                        report: Some(report),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(file = %file, error = %e, "scenario failed");
                    RunOutput {
                        file,
                        report: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect();

    let failed = outputs.iter().any(|o| o.error.is_some());
    let json = if args.pretty {
        serde_json::to_string_pretty(&outputs)
    } else {
        serde_json::to_string(&outputs)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize reports");
            return ExitCode::FAILURE;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
