use anyhow::{bail, Context, Result};
use catalog::BookCatalog;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::seq::IndexedRandom;
use server::{Config, RecommendationService, DEFAULT_LISTS_LIMIT};
use sources::Candidate;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Folio Recs - Book discovery engine
#[derive(Parser)]
#[command(name = "folio-recs")]
#[command(about = "Personalized book recommendations from reading history", long_about = None)]
struct Cli {
    /// JSON library snapshot (overrides DATABASE_URL)
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get book recommendations (anonymous when no user is given)
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: Option<String>,

        /// Number of recommendations to return
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<String>,

        /// Show the reason behind each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Show the reading profile the engine derives for a user
    Profile {
        /// User ID to display
        #[arg(long)]
        user_id: String,
    },

    /// Search the external book catalog
    Search {
        /// Free-text query (supports subject: and inauthor: qualifiers)
        #[arg(long)]
        query: String,

        /// Maximum number of results
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Show popular public reading lists
    Lists {
        /// Number of lists to show
        #[arg(long, allow_hyphen_values = true)]
        limit: Option<String>,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// Users to request for (anonymous requests when empty)
        #[arg(long)]
        user_id: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    server::init_tracing();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(data_file) = cli.data_file {
        config.database_url = None;
        config.data_file = Some(data_file);
    }

    let start = Instant::now();
    let store = config.open_store().await?;
    println!("{} Opened reading store in {:?}", "✓".green(), start.elapsed());

    let catalog = Arc::new(config.catalog());
    let service = Arc::new(
        RecommendationService::new(store, catalog.clone())
            .with_timeout(config.recommendation_timeout()),
    );

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            explain,
        } => handle_recommend(&service, user_id, limit, explain).await?,
        Commands::Profile { user_id } => handle_profile(&service, &user_id).await?,
        Commands::Search { query, limit } => handle_search(catalog.as_ref(), &query, limit).await?,
        Commands::Lists { limit } => handle_lists(&service, limit).await?,
        Commands::Benchmark {
            requests,
            concurrent,
            user_id,
        } => handle_benchmark(service, requests, concurrent, user_id).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    service: &RecommendationService,
    user_id: Option<String>,
    limit: Option<String>,
    explain: bool,
) -> Result<()> {
    let result = service
        .get_recommendations(user_id.as_deref(), server::limit_param(limit.as_deref()))
        .await?;

    match &user_id {
        Some(user_id) => println!("{}", format!("Recommendations for {}:", user_id).bold().blue()),
        None => println!("{}", "Trending recommendations:".bold().blue()),
    }
    print_recommendations(&result.recommendations, explain);
    println!("{} recommendations", result.count);
    Ok(())
}

/// Handle the 'profile' command
async fn handle_profile(service: &RecommendationService, user_id: &str) -> Result<()> {
    let context = service.profile(user_id).await;
    let profile = &context.profile;

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    println!("{}Logged books: {}", "• ".green(), context.logged_books.len());
    if profile.is_empty() {
        println!("{}", "No ratings or reviews yet".yellow());
        return Ok(());
    }

    println!("{}Favorite categories: {}", "• ".green(), profile.favorite_categories.join(", "));
    println!("{}Favorite authors: {}", "• ".green(), profile.favorite_authors.join(", "));
    println!("{}Favorite books: {}", "• ".green(), profile.favorite_books.join(", "));
    println!("{}Review keywords: {}", "• ".cyan(), profile.review_keywords.join(", "));
    Ok(())
}

/// Handle the 'search' command
async fn handle_search(catalog: &dyn BookCatalog, query: &str, limit: usize) -> Result<()> {
    let books = catalog
        .search(query, limit)
        .await
        .context("Catalog search failed")?;

    println!("{}", format!("Search results for '{}':", query).bold().blue());
    for book in &books {
        println!(
            "{}: {} by {} [{}]",
            book.id.dimmed(),
            book.title,
            book.authors.join(", "),
            book.categories.join(", ")
        );
    }
    if books.is_empty() {
        println!("{}", "No matches".yellow());
    }
    Ok(())
}

/// Handle the 'lists' command
async fn handle_lists(service: &RecommendationService, limit: Option<String>) -> Result<()> {
    let limit = server::parse_limit(limit.as_deref(), DEFAULT_LISTS_LIMIT);
    let lists = service.trending_lists(limit).await;

    println!("{}", "Trending reading lists:".bold().blue());
    for (rank, list) in lists.iter().enumerate() {
        println!(
            "{}. {} by {} ({} books)",
            (rank + 1).to_string().green(),
            list.name,
            list.owner_username,
            list.items_count
        );
        if let Some(description) = &list.description {
            println!("   {}", description.dimmed());
        }
    }
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    service: Arc<RecommendationService>,
    requests: usize,
    concurrent: usize,
    user_ids: Vec<String>,
) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        bail!("requests and concurrent must both be positive");
    }

    let permits = Arc::new(Semaphore::new(concurrent));
    let mut rng = rand::rng();
    let started = Instant::now();

    // Use tokio::spawn to make concurrent requests
    let mut handles = Vec::with_capacity(requests);
    for _ in 0..requests {
        let user = user_ids.choose(&mut rng).cloned();
        let service = Arc::clone(&service);
        let permits = Arc::clone(&permits);
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            service.get_recommendations(user.as_deref(), None).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = started.elapsed();

    timings.sort();
    let percentile = |p: usize| timings[(timings.len() * p / 100).min(timings.len() - 1)];
    let total: Duration = timings.iter().sum();
    let avg_latency = total / u32::try_from(timings.len()).unwrap_or(u32::MAX);
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(50));
    println!("P95 latency: {:?}", percentile(95));
    println!("P99 latency: {:?}", percentile(99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[Candidate], explain: bool) {
    for (rank, candidate) in recommendations.iter().enumerate() {
        let book = &candidate.book;
        let year = book.published_date.get(..4).unwrap_or("????");
        println!(
            "{}. {} ({}) by {} - Score: {:.2}",
            (rank + 1).to_string().green(),
            book.title,
            year,
            if book.authors.is_empty() {
                "unknown author".to_string()
            } else {
                book.authors.join(", ")
            },
            candidate.score
        );
        if explain {
            println!(
                "   {} [{} {}%]",
                candidate.reason.description(),
                candidate.reason.kind(),
                candidate.reason.confidence()
            );
        }
    }
}
