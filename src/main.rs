use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use museum_blues::catalog;
use museum_blues::color::ImageDiagnostics;
use museum_blues::pipeline::preprocessing;
use museum_blues::{
    AppError, BatchOrchestrator, Configuration, HttpImageFetcher, ImageFetcher, RowProcessor,
};

#[derive(Parser, Debug)]
#[command(version, about = "Finds the dominant blue shades in museum artifact images")]
struct CliArgs {
    /// Path to a TOML configuration file. Environment variables prefixed with
    /// MUSEUM_BLUES_ override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate every catalog row with the blue shades of its image.
    Extract {
        /// Input CSV with at least `id`, `type` and `URL` columns.
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV, written with an extra `rgb_color` column.
        #[arg(short, long)]
        output: PathBuf,

        /// Only process the first N rows. Set to 0 to process everything.
        #[arg(long)]
        limit: Option<usize>,

        /// Rows processed concurrently, overrides the configuration.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print color diagnostics for a single image as JSON.
    Inspect {
        url: String,

        /// Longest image side kept before analysis, overrides the configuration.
        #[arg(long)]
        max_dimension: Option<u32>,
    },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli_args = CliArgs::parse();
    init_logging();

    let mut configuration = Configuration::load(cli_args.config.as_deref())?;

    match cli_args.command {
        Command::Extract {
            input,
            output,
            limit,
            workers,
        } => {
            if let Some(workers) = workers {
                configuration.batch.workers = workers;
            }
            configuration.validate()?;
            extract(&configuration, &input, &output, limit).await
        }
        Command::Inspect { url, max_dimension } => {
            if let Some(max_dimension) = max_dimension {
                configuration.batch.max_dimension = max_dimension;
            }
            configuration.validate()?;
            inspect(&configuration, &url).await
        }
    }
}

async fn extract(
    configuration: &Configuration,
    input: &Path,
    output: &Path,
    limit: Option<usize>,
) -> Result<(), AppError> {
    let mut rows = catalog::read_csv(input)?;
    if let Some(limit) = limit.filter(|limit| *limit > 0) {
        info!("Test mode: processing only the first {} rows", limit);
        rows.truncate(limit);
    }

    let fetcher = Arc::new(HttpImageFetcher::new(&configuration.fetch)?);
    let processor = RowProcessor::new(
        fetcher,
        configuration.extractor(),
        configuration.batch.max_dimension,
    );
    let orchestrator = BatchOrchestrator::new(processor, configuration.batch.workers);

    let output_rows = orchestrator.run(rows).await;
    catalog::write_csv(output, &output_rows)?;

    info!("Results written to {}", output.display());
    Ok(())
}

async fn inspect(configuration: &Configuration, url: &str) -> Result<(), AppError> {
    let fetcher = HttpImageFetcher::new(&configuration.fetch)?;
    let image = fetcher.fetch(url).await?;

    let extractor = configuration.extractor();
    let max_dimension = configuration.batch.max_dimension;
    let diagnostics = tokio::task::spawn_blocking(move || {
        let image = preprocessing::prepare(image, max_dimension);
        ImageDiagnostics::analyze(&extractor, &image)
    })
    .await
    .map_err(|e| AppError::Pipeline(e.to_string()))?;

    let json = serde_json::to_string_pretty(&diagnostics)
        .map_err(|e| AppError::Pipeline(e.to_string()))?;
    println!("{json}");
    Ok(())
}
