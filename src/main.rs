use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use signsh::cli::{Cli, Commands, ConfigAction};
use signsh::config::Config;
use signsh::error::SignError;
use signsh::model::{AssetModelSource, LoadOptions, ModelLoader};
use signsh::pose::FrameReader;
use signsh::recognition::{RecognitionEngine, RecognitionResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { ref input, json } => {
            let config = load_config(&cli)?;
            run_recognition(&config, input.as_deref(), json, cli.quiet).await?;
        }
        Commands::Check => {
            let config = load_config(&cli)?;
            check_assets(&config).await?;
        }
        Commands::Config { ref action } => {
            handle_config_command(action, &cli)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "signsh", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order (highest first):
/// 1. --model / --labels flags
/// 2. SIGNSH_* environment variables
/// 3. Custom config path from CLI (--config), else ~/.config/signsh/config.toml
/// 4. Built-in defaults
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match cli.config.as_deref() {
        Some(path) => {
            Config::load(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => Config::load_or_default(&Config::default_path())?,
    };

    let mut config = config.with_env_overrides();
    if let Some(model) = &cli.model {
        config.model.model_path.clone_from(model);
    }
    if let Some(labels) = &cli.labels {
        config.model.labels_path.clone_from(labels);
    }

    config.validate()?;
    Ok(config)
}

/// Stream JSON-Lines pose frames through the engine.
async fn run_recognition(
    config: &Config,
    input: Option<&Path>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let loader = ModelLoader::new(Arc::new(AssetModelSource::from_config(&config.model)));
    let engine = RecognitionEngine::spawn(loader, &config.recognition)?;

    if !quiet {
        eprintln!("Loading model from {}...", config.model.model_path);
    }
    let model = engine.load(LoadOptions::default()).await?;
    if !quiet {
        eprintln!(
            "{} {} ({} labels, window {})",
            "Ready:".green(),
            model.name(),
            model.labels().len(),
            config.recognition.window_size
        );
    }

    let processed = match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            stream_frames(&engine, BufReader::new(file), json, quiet).await?
        }
        None => stream_frames(&engine, BufReader::new(tokio::io::stdin()), json, quiet).await?,
    };

    if !quiet {
        eprintln!("Processed {} frames.", processed);
    }
    Ok(())
}

async fn stream_frames<R: AsyncBufRead + Unpin>(
    engine: &RecognitionEngine,
    reader: R,
    json: bool,
    quiet: bool,
) -> Result<u64> {
    let mut frames = FrameReader::new(reader);
    let mut printed = String::new();
    let mut processed = 0;

    loop {
        let frame = match frames.next_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e @ SignError::InvalidFrame { .. }) => {
                // One malformed line should not end the stream
                if !quiet {
                    eprintln!("{} {}", "Skipping:".yellow(), e);
                }
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read frames after line {}", frames.line_number())
                });
            }
        };

        let result = match engine.update(frame).await {
            Ok(result) => result,
            Err(e) if e.is_inference_failure() => {
                if !quiet {
                    eprintln!("{} {}", "Warning:".yellow(), e);
                }
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        processed += 1;

        if json {
            println!("{}", serde_json::to_string(&result)?);
        } else if result.gloss != printed {
            print_result(&result);
            printed.clone_from(&result.gloss);
        }
    }

    Ok(processed)
}

fn print_result(result: &RecognitionResult) {
    if !result.has_gloss() {
        println!("{:>6}  {}", result.sequence, "…".dimmed());
        return;
    }

    let alternatives: Vec<String> = result
        .top
        .iter()
        .skip(1)
        .map(|c| format!("{} {:.0}%", c.label, c.probability * 100.0))
        .collect();

    print!(
        "{:>6}  {} {}",
        result.sequence,
        result.gloss.bold().green(),
        format!("({:.0}%)", result.confidence * 100.0).dimmed()
    );
    if !alternatives.is_empty() {
        print!("  {}", alternatives.join(", ").dimmed());
    }
    println!();
}

/// Load both assets once and report what was found.
async fn check_assets(config: &Config) -> Result<()> {
    let loader = ModelLoader::new(Arc::new(AssetModelSource::from_config(&config.model)));

    println!("  {}   {}", "Model:".dimmed(), config.model.model_path);
    println!("  {}  {}", "Labels:".dimmed(), config.model.labels_path);

    match loader.load(LoadOptions::default()).await {
        Ok(model) => {
            let labels = model.labels();
            let preview: Vec<&str> = labels.iter().take(5).map(String::as_str).collect();
            let more = if labels.len() > preview.len() { ", …" } else { "" };

            println!("  {}    {}", "Name:".dimmed(), model.name());
            println!(
                "  {}   {} ({}{})",
                "Count:".dimmed(),
                labels.len(),
                preview.join(", "),
                more
            );
            println!("{}", "Model loaded successfully.".green());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            anyhow::bail!("model check failed")
        }
    }
}

fn handle_config_command(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(cli)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path: PathBuf = cli.config.clone().unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
