use anyhow::{bail, Context, Result};
use catalog::{CatalogIndex, CatalogItem};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dataset::{prepare_dataset, ColumnSpec};
use oracle::{OracleHandle, OracleSource};
use recommend::recommenders::PopularityRanker;
use recommend::{RecommendConfig, RecommendationService, Recommendations, ReconcileStrategy, Tier};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// Storefront recommendations with model, popularity and random fallbacks
#[derive(Parser)]
#[command(name = "storefront-recs")]
#[command(about = "Serve product recommendations and build training datasets", long_about = None)]
struct Cli {
    /// Directory holding products.dat and order_items.dat
    #[arg(short, long, env = "STOREFRONT_DATA_DIR", default_value = "data/shop")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the commands that serve recommendations
#[derive(Args, Clone)]
struct ServeArgs {
    /// Ranking export (JSON map of user id to ranked item ids)
    #[arg(long, env = "STOREFRONT_ORACLE_FILE", conflicts_with = "oracle_addr")]
    oracle_file: Option<PathBuf>,

    /// Address of a remote ranking service, e.g. http://localhost:50051
    #[arg(long, env = "STOREFRONT_ORACLE_ADDR")]
    oracle_addr: Option<String>,

    /// Timeout for one oracle or popularity call, in milliseconds
    #[arg(long, default_value = "2000")]
    timeout_ms: u64,

    /// Tiers to use, comma separated (model, popularity, random)
    #[arg(long, value_delimiter = ',', default_value = "model,popularity,random")]
    tiers: Vec<Tier>,

    /// Resolve each oracle key in its own id space instead of per batch
    #[arg(long)]
    per_key: bool,

    /// Seed for the random tier
    #[arg(long)]
    seed: Option<u64>,
}

impl ServeArgs {
    fn oracle_source(&self) -> OracleSource {
        match (&self.oracle_file, &self.oracle_addr) {
            (Some(path), _) => OracleSource::Precomputed(path.clone()),
            (None, Some(addr)) => OracleSource::Grpc(addr.clone()),
            (None, None) => OracleSource::Disabled,
        }
    }

    fn config(&self, k: usize) -> RecommendConfig {
        let timeout = Duration::from_millis(self.timeout_ms);
        let strategy = if self.per_key {
            ReconcileStrategy::PerKey
        } else {
            ReconcileStrategy::Batch
        };
        let config = RecommendConfig::default()
            .with_k(k)
            .with_oracle_timeout(timeout)
            .with_popularity_timeout(timeout)
            .with_reconcile_strategy(strategy)
            .with_tiers(self.tiers.iter().copied());
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get product recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        k: usize,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        serve: ServeArgs,
    },

    /// Show the best-selling products
    Popular {
        #[arg(long, default_value = "10")]
        k: usize,
    },

    /// List catalog products page by page
    Products {
        #[arg(long, default_value = "0")]
        skip: usize,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Split an interaction log into train/valid/test files
    Partition {
        /// Interaction CSV with a header line
        #[arg(long, default_value = "data/interactions.csv")]
        input: PathBuf,

        /// Output directory
        #[arg(long, default_value = "dataset/shop")]
        out: PathBuf,

        #[arg(long, default_value = "user_id")]
        user_col: String,

        #[arg(long, default_value = "item_id")]
        item_col: String,

        #[arg(long, default_value = "timestamp")]
        time_col: String,
    },

    /// Run benchmark to test serving performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// Highest user id to draw from
        #[arg(long, default_value = "1000")]
        max_user: u32,

        #[command(flatten)]
        serve: ServeArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recommend {
            user_id,
            k,
            json,
            serve,
        } => handle_recommend(&cli.data_dir, &user_id, k, json, &serve).await?,
        Commands::Popular { k } => handle_popular(&cli.data_dir, k)?,
        Commands::Products { skip, limit } => handle_products(&cli.data_dir, skip, limit)?,
        Commands::Partition {
            input,
            out,
            user_col,
            item_col,
            time_col,
        } => {
            let columns = ColumnSpec {
                user: user_col,
                item: item_col,
                timestamp: time_col,
            };
            handle_partition(&input, &out, &columns)?
        }
        Commands::Benchmark {
            requests,
            concurrent,
            max_user,
            serve,
        } => handle_benchmark(&cli.data_dir, requests, concurrent, max_user, &serve).await?,
    }

    Ok(())
}

fn load_catalog(data_dir: &Path) -> Result<Arc<CatalogIndex>> {
    println!("Loading catalog from {}...", data_dir.display());
    let start = Instant::now();
    let index = CatalogIndex::load_from_dir(data_dir).context("Failed to load catalog")?;
    let (items, lines) = index.counts();
    println!(
        "{} Loaded {} products and {} order lines in {:?}",
        "✓".green(),
        items,
        lines,
        start.elapsed()
    );
    Ok(Arc::new(index))
}

async fn build_service(data_dir: &Path, serve: &ServeArgs, k: usize) -> Result<RecommendationService> {
    let index = load_catalog(data_dir)?;
    let handle = Arc::new(OracleHandle::new(serve.oracle_source()));
    let service = RecommendationService::from_index(index, handle, serve.config(k));

    // Load the model up front so the first request doesn't pay for it
    let state = service.preload().await;
    if state.is_loaded() {
        println!("{} Ranking oracle ready", "✓".green());
    } else {
        println!("{} Serving without a ranking oracle: {:?}", "!".yellow(), state);
    }
    Ok(service)
}

/// Handle the 'recommend' command
async fn handle_recommend(
    data_dir: &Path,
    user_id: &str,
    k: usize,
    json: bool,
    serve: &ServeArgs,
) -> Result<()> {
    let service = build_service(data_dir, serve, k).await?;
    let result = service.recommend(user_id).await;

    if json {
        let body = serde_json::json!({
            "user_id": user_id,
            "source": result.source.map(|t| t.as_str()),
            "items": result.items,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_recommendations(user_id, &result);
    }
    Ok(())
}

/// Handle the 'popular' command
fn handle_popular(data_dir: &Path, k: usize) -> Result<()> {
    let index = load_catalog(data_dir)?;
    let ranker = PopularityRanker::new(index.clone(), index.clone());
    let items = ranker
        .top_k_by_popularity(k)
        .context("Popularity ranking unavailable")?;

    println!("{}", "Best sellers:".bold().blue());
    for (rank, item) in items.iter().enumerate() {
        println!(
            "{}. {} ({} orders)",
            (rank + 1).to_string().green(),
            describe(item),
            index.order_count(item.id)
        );
    }
    Ok(())
}

/// Handle the 'products' command
fn handle_products(data_dir: &Path, skip: usize, limit: usize) -> Result<()> {
    let index = load_catalog(data_dir)?;
    let page = index.page(skip, limit);
    if page.is_empty() {
        println!("No products at offset {}", skip);
        return Ok(());
    }

    println!(
        "{}",
        format!("Products {}-{}:", skip + 1, skip + page.len()).bold().blue()
    );
    for item in page {
        println!("{}: {}", item.id.to_string().cyan(), describe(item));
        if let Some(description) = &item.description {
            println!("   {}", description.dimmed());
        }
    }
    Ok(())
}

/// Handle the 'partition' command
fn handle_partition(input: &Path, out: &Path, columns: &ColumnSpec) -> Result<()> {
    let start = Instant::now();
    let report = prepare_dataset(input, out, columns)
        .with_context(|| format!("Failed to build dataset from {}", input.display()))?;

    println!(
        "{} Saved train/valid/test to {} in {:?}",
        "✓".green(),
        out.display(),
        start.elapsed()
    );
    println!("{}Users: {}", "• ".cyan(), report.users);
    println!("{}Train rows: {}", "• ".cyan(), report.train);
    println!("{}Valid rows: {}", "• ".cyan(), report.valid);
    println!("{}Test rows: {}", "• ".cyan(), report.test);
    if report.dropped > 0 {
        println!("{}Dropped rows: {}", "• ".yellow(), report.dropped);
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    data_dir: &Path,
    requests: usize,
    concurrent: usize,
    max_user: u32,
    serve: &ServeArgs,
) -> Result<()> {
    if requests == 0 || concurrent == 0 || max_user == 0 {
        bail!("requests, concurrent and max-user must all be positive");
    }

    // No preload: the first wave of requests races on oracle initialization
    let index = load_catalog(data_dir)?;
    let oracle = Arc::new(OracleHandle::new(serve.oracle_source()));
    let service = RecommendationService::from_index(index, oracle.clone(), serve.config(5));

    let user_ids: Vec<String> = (0..requests)
        .map(|_| (rand::random::<u32>() % max_user + 1).to_string())
        .collect();

    let permits = Arc::new(Semaphore::new(concurrent));
    let wall = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for user in user_ids {
        let service = service.clone();
        let permits = permits.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            let result = service.recommend(&user).await;
            Ok::<_, anyhow::Error>((start.elapsed(), result.source))
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    let mut by_tier = [0usize; 3];
    let mut unanswered = 0;
    for handle in handles {
        let (elapsed, source) = handle.await??;
        timings.push(elapsed);
        match source {
            Some(tier) => by_tier[tier as usize] += 1,
            None => unanswered += 1,
        }
    }
    let wall_time = wall.elapsed();
    info!("Oracle loader ran {} time(s)", oracle.load_attempts());

    timings.sort();
    let total: Duration = timings.iter().sum();
    let avg_latency = total / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p) as usize];
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);
    for tier in Tier::ALL {
        println!("Served by {}: {}", tier, by_tier[tier as usize]);
    }
    if unanswered > 0 {
        println!("Unanswered: {}", unanswered);
    }
    println!("Oracle loads: {}", oracle.load_attempts());

    Ok(())
}

fn describe(item: &CatalogItem) -> String {
    match item.price {
        Some(price) => format!("{} [{}] ${:.2}", item.name, item.category, price),
        None => format!("{} [{}]", item.name, item.category),
    }
}

/// Note printed in place of an empty list
fn empty_note(result: &Recommendations) -> Option<&'static str> {
    match result.source {
        None => Some("(no tier could answer)"),
        Some(_) if result.is_empty() => Some("(catalog is empty)"),
        Some(_) => None,
    }
}

/// Format and print one result
fn print_recommendations(user_id: &str, result: &Recommendations) {
    println!(
        "{}",
        format!("Recommendations for user {}:", user_id).bold().blue()
    );
    if let Some(note) = empty_note(result) {
        println!("  {}", note);
    }
    for (rank, item) in result.items.iter().enumerate() {
        println!("{}. {}", (rank + 1).to_string().green(), describe(item));
    }

    let source = result.source.map(|t| t.as_str()).unwrap_or("none");
    println!("{}Source: {}", "• ".cyan(), source);
    for failure in &result.failures {
        println!("{}Skipped {}: {}", "• ".yellow(), failure.tier, failure.error);
    }
}
