//! CLI for generating, validating and converting step-block sequences.
//!
//! Usage:
//!   stepgen generate --input manual.txt --topic safety --steps 8 [--output steps.json]
//!   stepgen validate --input reply.txt
//!   stepgen pack --input steps.json --output steps.automerge
//!   stepgen unpack --input steps.automerge

mod replay;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use stepblocks::sequence::snapshot;
use stepblocks::{
    BlockSequence, ChatCompletionsClient, GenerationClient, GenerationOrchestrator,
    GenerationRequest, GeneratorConfig,
};

#[derive(Parser)]
#[command(
    name = "stepgen",
    about = "Generate, validate and convert training step-block sequences",
    version
)]
struct Args {
    /// Enable debug output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the generation service for a block sequence built from a document
    Generate(GenerateArgs),

    /// Validate a raw generation reply saved to a file
    Validate {
        /// Reply text file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Convert a JSON block array to a binary snapshot
    Pack {
        /// JSON file containing an array of blocks
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (defaults to input path with .automerge extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a binary snapshot as JSON
    Unpack {
        /// Snapshot file
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Extracted document text
    #[arg(short, long)]
    input: PathBuf,

    /// Topics to focus on (repeatable)
    #[arg(short, long = "topic")]
    topics: Vec<String>,

    /// Desired number of steps
    #[arg(short, long, default_value_t = stepblocks::generation::request::DEFAULT_STEP_COUNT)]
    steps: u32,

    /// File holding a prior analysis of the document
    #[arg(long)]
    analysis: Option<PathBuf>,

    /// Write the sequence as JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a binary snapshot
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Use a saved reply instead of calling the service
    #[arg(long)]
    reply_file: Option<PathBuf>,

    /// API key (or set STEPGEN_API_KEY env var)
    #[arg(long, env = "STEPGEN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat-completions base URL
    #[arg(long, env = "STEPGEN_BASE_URL", default_value = stepblocks::generation::config::DEFAULT_BASE_URL)]
    base_url: String,

    /// Model name
    #[arg(long, env = "STEPGEN_MODEL", default_value = stepblocks::generation::config::DEFAULT_MODEL)]
    model: String,

    /// Request timeout in seconds
    #[arg(long, env = "STEPGEN_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Generate(generate_args) => generate(generate_args).await,
        Command::Validate { input } => validate(&input),
        Command::Pack { input, output } => pack(&input, output),
        Command::Unpack { input } => unpack(&input),
    }
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut request = GenerationRequest::new(source, file_name)
        .with_topics(args.topics)
        .with_step_count(args.steps);
    if let Some(path) = &args.analysis {
        let analysis = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        request = request.with_analysis(analysis);
    }

    let client: Box<dyn GenerationClient> = match &args.reply_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            info!("Replaying saved reply from {}", path.display());
            Box::new(replay::ReplayClient::new(text))
        }
        None => {
            let api_key = args
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .context("API key is required. Use --api-key or set STEPGEN_API_KEY.")?;
            let config = GeneratorConfig::new(api_key)
                .with_base_url(args.base_url.clone())
                .with_model(args.model.clone())
                .with_timeout(Duration::from_secs(args.timeout_secs));
            Box::new(ChatCompletionsClient::new(config)?)
        }
    };

    let mut orchestrator = GenerationOrchestrator::new(client);
    let sequence = match orchestrator.generate(request).await {
        Ok(sequence) => sequence,
        Err(err) => {
            eprintln!("{}", err.user_message());
            anyhow::bail!("Generation failed: {}", err);
        }
    };

    print_summary(&sequence);

    let json = serde_json::to_string_pretty(&sequence)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} blocks to {}", sequence.len(), path.display());
        }
        None => println!("{}", json),
    }

    if let Some(path) = &args.snapshot {
        write_snapshot(&sequence, path)?;
    }

    Ok(())
}

fn validate(input: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    match stepblocks::validate_text(&text) {
        Ok(sequence) => {
            print_summary(&sequence);
            println!("✓ Reply is valid");
            Ok(())
        }
        Err(err) => {
            eprintln!("✗ {}", err);
            std::process::exit(1);
        }
    }
}

fn pack(input: &Path, output: Option<PathBuf>) -> Result<()> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let sequence: BlockSequence =
        serde_json::from_str(&json).context("Failed to parse JSON block array")?;
    sequence.ensure_unique_ids()?;

    let output = output.unwrap_or_else(|| {
        let mut path = input.to_path_buf();
        path.set_extension("automerge");
        path
    });
    let bytes = write_snapshot(&sequence, &output)?;

    println!(
        "Packed {} blocks: {} bytes JSON → {} bytes snapshot ({})",
        sequence.len(),
        json.len(),
        bytes,
        output.display()
    );
    Ok(())
}

fn unpack(input: &Path) -> Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let sequence = snapshot::load(&bytes).context("Failed to load snapshot")?;
    println!("{}", serde_json::to_string_pretty(&sequence)?);
    Ok(())
}

fn write_snapshot(sequence: &BlockSequence, path: &Path) -> Result<usize> {
    let bytes = snapshot::save(sequence).context("Failed to encode snapshot")?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote snapshot to {}", path.display());
    Ok(bytes.len())
}

fn print_summary(sequence: &BlockSequence) {
    eprintln!(
        "{} blocks, {} questions, {} points",
        sequence.len(),
        sequence.question_count(),
        sequence.total_points()
    );
    for block in sequence {
        eprintln!("  {:>3}  {:<11} {}", block.order, block.kind(), block.id);
    }
}
