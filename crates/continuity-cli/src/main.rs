//! Continuity CLI - check character backstories against narratives.
//!
//! ```text
//! continuity check --narrative novel.txt --backstory backstory.txt
//! continuity batch --input train.jsonl --output results.csv
//! continuity chunks --narrative novel.txt --chunk-size 2000
//! ```
//!
//! Without `GOOGLE_API_KEY` (or `provider.api_key` in the config file) the
//! pipeline runs heuristic-only and judges every example consistent.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use continuity_core::{chunk_narrative, StoryInput, StoryJudgment};
use continuity_runtime::{Pipeline, ProviderRegistry, RuntimeConfig, GOOGLE_API_KEY_ENV};

mod dataset;
mod output;

use output::{write_results, BatchSummary, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "continuity")]
#[command(about = "Check whether a character backstory is consistent with a narrative", long_about = None)]
#[command(version)]
struct Cli {
    /// Runtime configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `continuity_runtime=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Never call the reasoning service, even if a credential is present
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Judge a single narrative/backstory pair
    Check {
        /// Narrative text file
        #[arg(long)]
        narrative: PathBuf,

        /// Backstory text file
        #[arg(long)]
        backstory: PathBuf,

        /// Identifier echoed in the result
        #[arg(long, default_value = "0")]
        story_id: String,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Judge every example of a JSON Lines dataset
    Batch {
        /// Dataset: one {"story_id", "narrative", "backstory"} object per line
        #[arg(short, long)]
        input: PathBuf,

        /// Results file
        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// Show how a narrative is chunked
    Chunks {
        #[arg(long)]
        narrative: PathBuf,

        /// Override the configured chunk size
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Check {
            narrative,
            backstory,
            story_id,
            json,
        } => {
            let pipeline = build_pipeline(config, cli.offline)?;
            let input = StoryInput::new(story_id, read_text(&narrative)?, read_text(&backstory)?);
            let report = pipeline.run(&input).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("story_id:   {}", report.story.story_id);
                println!(
                    "prediction: {} ({})",
                    report.story.prediction.label(),
                    report.story.prediction
                );
                println!("rationale:  {}", report.story.rationale);
                println!(
                    "chunks:     {} evaluated of {}",
                    report.evaluated_chunks.len(),
                    report.chunk_count
                );
                println!("claims:     {} ({:?})", report.claims.len(), report.claims.origin());
            }
        }

        Command::Batch {
            input,
            output,
            format,
        } => {
            let pipeline = build_pipeline(config, cli.offline)?;
            let inputs = dataset::load_dataset(&input)?;
            tracing::info!(examples = inputs.len(), path = %input.display(), "Dataset loaded");

            let records: Vec<StoryJudgment> = pipeline
                .run_batch(&inputs)
                .await
                .into_iter()
                .map(|report| report.story)
                .collect();

            let file = File::create(&output)
                .with_context(|| format!("failed to create {}", output.display()))?;
            write_results(BufWriter::new(file), &records, format)
                .with_context(|| format!("failed to write {}", output.display()))?;

            println!("{}", BatchSummary::from_records(&records));
            println!("Results written to {}", output.display());
        }

        Command::Chunks {
            narrative,
            chunk_size,
        } => {
            let chunk_size = chunk_size.unwrap_or(config.chunk_size);
            anyhow::ensure!(chunk_size > 0, "chunk size must be greater than 0");

            let chunks = chunk_narrative(&read_text(&narrative)?, chunk_size);
            for chunk in &chunks {
                println!("{:>4}  {:>6} chars  {}", chunk.index, chunk.char_len(), preview(&chunk.text));
            }
            println!("{} chunks (threshold {} chars)", chunks.len(), chunk_size);
        }
    }

    Ok(())
}

/// `--log-level` wins over `RUST_LOG`; the default is `info`.
fn init_logging(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RuntimeConfig::default()),
    }
}

fn build_pipeline(config: RuntimeConfig, offline: bool) -> Result<Pipeline> {
    let builder = Pipeline::builder().config(config);
    let builder = if offline {
        builder
    } else {
        builder.registry(ProviderRegistry::with_defaults())
    };
    let pipeline = builder.build()?;

    if pipeline.is_heuristic_only() {
        if offline {
            tracing::info!("Offline mode: running heuristic-only");
        } else {
            tracing::warn!(
                "No {} found: running heuristic-only, every example will be judged consistent",
                GOOGLE_API_KEY_ENV
            );
        }
    } else {
        tracing::info!(
            provider = pipeline.config().provider_type(),
            model = %pipeline.config().completion.model,
            "Reasoning service configured"
        );
    }

    Ok(pipeline)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// First line of a chunk, cut to 60 characters.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    let mut preview: String = line.chars().take(60).collect();
    if line.chars().count() > 60 {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch_defaults_to_csv() {
        let cli = Cli::parse_from([
            "continuity",
            "batch",
            "--input",
            "train.jsonl",
            "--output",
            "results.csv",
        ]);
        match cli.command {
            Command::Batch { format, .. } => assert_eq!(format, OutputFormat::Csv),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(!cli.offline);
    }

    #[test]
    fn test_parse_check_with_global_flags() {
        let cli = Cli::parse_from([
            "continuity",
            "check",
            "--narrative",
            "n.txt",
            "--backstory",
            "b.txt",
            "--story-id",
            "42",
            "--offline",
            "--log-level",
            "debug",
        ]);
        assert!(cli.offline);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Check { story_id, json, .. } => {
                assert_eq!(story_id, "42");
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_jsonl_format() {
        let cli = Cli::parse_from([
            "continuity",
            "batch",
            "-i",
            "in.jsonl",
            "-o",
            "out.jsonl",
            "--format",
            "jsonl",
        ]);
        assert!(matches!(
            cli.command,
            Command::Batch {
                format: OutputFormat::Jsonl,
                ..
            }
        ));
    }

    #[test]
    fn test_offline_pipeline_is_heuristic_only() {
        let pipeline = build_pipeline(RuntimeConfig::default(), true).unwrap();
        assert!(pipeline.is_heuristic_only());
    }

    #[test]
    fn test_default_config_without_file() {
        assert_eq!(load_config(None).unwrap(), RuntimeConfig::default());
        assert!(load_config(Some(Path::new("/nonexistent/c.yaml"))).is_err());
    }

    #[test]
    fn test_preview_truncates_first_line() {
        assert_eq!(preview("short\nsecond line"), "short");
        let long = "x".repeat(80);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(60)));
    }
}
