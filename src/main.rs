use clap::{Parser, Subcommand};
use movierec::client::MovieRecClient;
use movierec::config::MovieRecConfig;
use movierec::data::{DateRange, FileSink, StagedJsonDirectory};
use movierec::pipeline::{rank_staged, Pipeline};
use movierec::server::DataService;
use movierec::transform::AggregateOptions;
use std::path::PathBuf;
use tracing::{debug, error, trace};

/// MovieLens data service and rating pipeline
#[derive(Parser)]
#[command(name = "movierec")]
#[command(about = "Serve, drain and rank the MovieLens dataset", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the paginated data service
    Serve {
        /// Directory holding the dataset CSV files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Drain the configured datasets into the output directory
    Fetch {
        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Rank movies from previously fetched ratings and movies
    Rank {
        /// Directory holding fetched datasets (defaults to the output directory)
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Directory to write the ranking into
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Minimum number of distinct raters per movie
        #[arg(long)]
        min_ratings: Option<usize>,
    },
    /// Fetch and rank in one go
    Run {
        #[command(flatten)]
        fetch: FetchArgs,

        /// Minimum number of distinct raters per movie
        #[arg(long)]
        min_ratings: Option<usize>,
    },
}

#[derive(clap::Args)]
struct FetchArgs {
    /// Directory to write fetched datasets into
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Rows requested per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Only fetch ratings on or after this date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<String>,

    /// Only fetch ratings before this date (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,tower=debug", // -vvv shows everything including dependencies
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .with_line_number(cli.verbose >= 3)
        .init();

    debug!("movierec started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = MovieRecConfig::load(cli.config.as_deref())?;
    debug!("Loaded configuration: {:?}", config);

    match cli.command {
        Commands::Serve { data_dir, port } => {
            if let Some(dir) = data_dir {
                config.service.data_dir = dir;
            }
            if let Some(port) = port {
                config.service.port = port;
            }
            DataService::load(config.service).await?.serve().await?;
        }
        Commands::Fetch { fetch } => {
            let pipeline = build_pipeline(&mut config, fetch)?;
            pipeline.fetch().await?;
        }
        Commands::Rank {
            input_dir,
            output_dir,
            min_ratings,
        } => {
            if let Some(dir) = output_dir {
                config.pipeline.output_dir = dir;
            }
            let input_dir = input_dir.unwrap_or_else(|| config.pipeline.output_dir.clone());
            let options = AggregateOptions {
                min_ratings: min_ratings.unwrap_or(config.pipeline.min_ratings),
            };
            rank_staged(
                &StagedJsonDirectory::new(input_dir),
                &FileSink::new(&config.pipeline.output_dir),
                &options,
            )
            .await?;
        }
        Commands::Run { fetch, min_ratings } => {
            if let Some(min_ratings) = min_ratings {
                config.pipeline.min_ratings = min_ratings;
            }
            let pipeline = build_pipeline(&mut config, fetch)?;
            pipeline.run().await?;
        }
    }

    Ok(())
}

fn build_pipeline(
    config: &mut MovieRecConfig,
    args: FetchArgs,
) -> anyhow::Result<Pipeline<MovieRecClient, FileSink>> {
    if let Some(dir) = args.output_dir {
        config.pipeline.output_dir = dir;
    }
    if let Some(page_size) = args.page_size {
        config.client.page_size = page_size;
    }
    config.validate()?;

    let range = DateRange::parse(args.start_date.as_deref(), args.end_date.as_deref())?;
    let client = MovieRecClient::from_settings(&config.client)?;
    let sink = FileSink::new(&config.pipeline.output_dir);

    Ok(Pipeline::new(client, sink, &config.pipeline, config.client.page_size).with_range(range))
}
