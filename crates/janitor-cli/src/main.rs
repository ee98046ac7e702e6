//! Janitor CLI
//!
//! Builds a semantic index over a question dataset and answers
//! "which existing questions look like this one?" queries against it.

mod output;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use janitor_core::{
    provider_for, ArtifactPaths, BuildOptions, BuiltArtifacts, Dataset, DatasetOptions,
    EmbeddingConfig, Error, IdentityMap, PreparedCorpus, Provenance, QueryEngine, SearchOptions,
    VectorIndex, DEFAULT_BUILD_TIMEOUT_SECS, DEFAULT_TOP_K,
};

/// Janitor - duplicate question finder
#[derive(Parser)]
#[command(name = "janitor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Semantic similarity search over Stack Overflow style questions")]
#[command(long_about = "Janitor embeds every question of a dataset into a vector index, then finds the questions closest to a free-text query.\n\nLogging goes to stderr and is controlled with RUST_LOG.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a dataset and write the vector index and identity map
    Build(BuildArgs),

    /// Find the questions most similar to a query
    Search(SearchArgs),

    /// Show provenance and statistics of a built artifact pair
    Inspect {
        /// Vector index file
        #[arg(long)]
        index: PathBuf,
        /// Identity map file
        #[arg(long)]
        map: PathBuf,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Dataset to index (.jsonl, .json, .parquet or .db)
    #[arg(long)]
    input: PathBuf,
    /// Where to write the vector index
    #[arg(long, alias = "out_index")]
    out_index: PathBuf,
    /// Where to write the identity map
    #[arg(long, alias = "out_map")]
    out_map: PathBuf,
    /// Embedding model (overrides JANITOR_MODEL)
    #[arg(long)]
    model: Option<String>,
    /// Texts per embedding call (overrides JANITOR_BATCH_SIZE)
    #[arg(long)]
    batch: Option<usize>,
    /// Fields joined into the embedded text, comma-separated
    #[arg(long, alias = "text_cols", value_delimiter = ',')]
    text_fields: Vec<String>,
    /// Give up on embedding after this many seconds
    #[arg(long, default_value_t = DEFAULT_BUILD_TIMEOUT_SECS)]
    timeout_secs: u64,
}

#[derive(Args)]
struct SearchArgs {
    /// Vector index file
    #[arg(long)]
    index: PathBuf,
    /// Identity map file
    #[arg(long)]
    map: PathBuf,
    /// Dataset the results are looked up in
    #[arg(long)]
    data: PathBuf,
    /// Free-text query
    #[arg(long)]
    query: String,
    /// Number of results
    #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
    k: usize,
    /// Embedding model (defaults to the model the index was built with)
    #[arg(long)]
    model: Option<String>,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Results go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    match cli.command {
        Commands::Build(args) => run_build(args),
        Commands::Search(args) => run_search(args),
        Commands::Inspect { index, map } => run_inspect(&index, &map),
    }
}

// ============================================================================
// BUILD
// ============================================================================

/// Run build command
fn run_build(args: BuildArgs) -> anyhow::Result<()> {
    let dataset = Dataset::load_with(&args.input, &DatasetOptions::from_env())
        .with_context(|| format!("Failed to load dataset {}", args.input.display()))?;

    let mut options = BuildOptions::from_env();
    if let Some(batch) = args.batch {
        options.batch_size = batch;
    }
    if !args.text_fields.is_empty() {
        options.text_fields = args.text_fields;
    }

    let mut config = EmbeddingConfig::from_env();
    if let Some(model) = args.model {
        config = config.with_model(model);
    }

    let corpus = PreparedCorpus::from_dataset(&dataset, &options.text_fields)?;
    info!(
        records = corpus.len(),
        model = %config.model_id,
        batch_size = options.batch_size,
        "Embedding dataset"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;
    let embedded = runtime.block_on(embed_with_timeout(
        corpus,
        config,
        options.batch_size,
        Duration::from_secs(args.timeout_secs),
    ));
    // A timed-out embedding task must not hold the process open
    runtime.shutdown_background();

    let (corpus, embeddings, provenance) = embedded?;
    let model = provenance.model.clone();
    let built = BuiltArtifacts::assemble(corpus.keys, &embeddings, provenance)?;
    built
        .commit(&args.out_index, &args.out_map)
        .context("Failed to write artifacts")?;

    println!("{}", "=== Build Complete ===".green().bold());
    println!("{}: {}", "Records Indexed".white().bold(), built.len());
    println!("{}: {}", "Model".white().bold(), model);
    println!("{}: {}", "Vector Index".white().bold(), args.out_index.display());
    println!("{}: {}", "Identity Map".white().bold(), args.out_map.display());

    Ok(())
}

/// Create the provider and embed the corpus on a blocking thread, bounded by `limit`.
///
/// Nothing is written here, so a timeout or failure leaves no artifacts behind.
async fn embed_with_timeout(
    corpus: PreparedCorpus,
    config: EmbeddingConfig,
    batch_size: usize,
    limit: Duration,
) -> Result<(PreparedCorpus, Vec<Vec<f32>>, Provenance), Error> {
    let task = tokio::task::spawn_blocking(move || {
        let provider = provider_for(&config)?;
        let embeddings = corpus.embed(provider.as_ref(), batch_size)?;
        let provenance = Provenance::now(provider.model_id(), provider.dimensions());
        Ok::<_, Error>((corpus, embeddings, provenance))
    });

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(Error::CapabilityFailure(format!(
            "embedding task failed: {}",
            join_error
        ))),
        Err(_) => Err(Error::CapabilityFailure(format!(
            "embedding did not finish within {}s",
            limit.as_secs()
        ))),
    }
}

// ============================================================================
// SEARCH
// ============================================================================

/// Run search command
fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let paths = ArtifactPaths {
        index: &args.index,
        map: &args.map,
        dataset: &args.data,
    };

    // Flag first, then the model the index was built with, then JANITOR_MODEL
    let model = args.model.clone();
    let engine = QueryEngine::open_with_provider(
        paths,
        |provenance| {
            let mut config = EmbeddingConfig::from_env();
            if let Some(model) = model.or_else(|| provenance.map(|p| p.model.clone())) {
                config = config.with_model(model);
            }
            provider_for(&config).map_err(Error::from)
        },
        &DatasetOptions::from_env(),
        &SearchOptions::from_env(),
    )
    .with_context(|| format!("Failed to open artifacts {}", args.index.display()))?;

    let results = engine.query(&args.query, args.k)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        output::print_results(&args.query, &results);
    }

    Ok(())
}

// ============================================================================
// INSPECT
// ============================================================================

/// Run inspect command
fn run_inspect(index_path: &Path, map_path: &Path) -> anyhow::Result<()> {
    for path in [index_path, map_path] {
        if !path.exists() {
            return Err(Error::InputMissing(path.to_path_buf()).into());
        }
    }

    let map = IdentityMap::load(map_path)
        .with_context(|| format!("Failed to load identity map {}", map_path.display()))?;
    let dimensions = map.provenance().map(|p| p.dimensions).ok_or_else(|| {
        Error::ArtifactMismatch(format!(
            "{} records no dimensions; cannot open the index",
            map_path.display()
        ))
    })?;
    let index = VectorIndex::load(index_path, dimensions)
        .map_err(Error::from)
        .with_context(|| format!("Failed to load vector index {}", index_path.display()))?;

    output::print_inspection(&map, &index.stats());
    Ok(())
}
