use std::env;
use std::path::PathBuf;

use dialect_quiz::{DialectConfig, DialectPipeline, SurveyResponse};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn").add_directive("dialect_quiz=info".parse()?),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (config_file, response_file) = match parse_args(&args) {
        Ok(Command::Run { config_file, response_file }) => (config_file, response_file),
        Ok(Command::Help) => {
            print_help();
            return Ok(());
        }
        Err(message) => {
            eprintln!("{message}");
            print_help();
            std::process::exit(2);
        }
    };

    let config = DialectConfig::load(config_file.as_deref())?;
    let pipeline = DialectPipeline::load(&config)?;

    let Some(path) = response_file else {
        eprintln!("Artifacts OK: {} questions, {} feature slots", pipeline.lexicon().len(), pipeline.schema().len());
        return Ok(());
    };

    let raw = std::fs::read_to_string(&path)?;
    let response: SurveyResponse = serde_json::from_str(&raw)?;
    let result = pipeline.classify(&response)?;

    let output = serde_json::json!({
        "answers": result.answers,
        "prediction": result.prediction,
        "sentence": result.sentence(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Command {
    Run {
        config_file: Option<PathBuf>,
        response_file: Option<PathBuf>,
    },
    Help,
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut config_file = None;
    let mut response_file = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| format!("Missing value for {}", args[i]))?;
                config_file = Some(PathBuf::from(value));
                i += 1;
            }
            "--help" | "-h" => return Ok(Command::Help),
            other => response_file = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    Ok(Command::Run {
        config_file,
        response_file,
    })
}

fn print_help() {
    println!("dialect-preflight: load dialect artifacts and optionally classify a response");
    println!();
    println!("Usage: dialect-preflight [--config <settings.toml>] [response.json]");
    println!();
    println!("Settings come from the optional file and DIALECT_* environment variables:");
    println!("  DIALECT_SCHEMA_PATH, DIALECT_MODEL_PATH, DIALECT_LEXICON_PATH,");
    println!("  DIALECT_FUZZY_THRESHOLD, DIALECT_TOP_K");
}
