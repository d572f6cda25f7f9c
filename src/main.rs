mod db;
mod scraper;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use proposal_scraper::{pipeline, MarkdownExtractor, ProposalRecord, Settings, SourceDocument};
use tracing::warn;

#[derive(Parser)]
#[command(
    name = "proposal_scraper",
    about = "Research funding call scraper via spider.cloud"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add configured source URLs to the queue
    Init,
    /// Fetch source pages via spider.cloud
    Scrape {
        /// Max sources to fetch
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Refetch sources that were already visited
        #[arg(long)]
        all: bool,
    },
    /// Extract, dedupe and sort proposals from the latest fetched pages
    Process,
    /// Init + scrape + process
    Run {
        /// Max sources to fetch
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract proposals from local markdown files and print them as JSON
    Extract {
        /// Pairs of SOURCE_URL=PATH
        #[arg(required = true, value_name = "URL=PATH")]
        inputs: Vec<String>,
    },
    /// List stored proposals in deadline order
    Proposals {
        /// Filter by agency (case-insensitive substring)
        #[arg(short, long)]
        agency: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show scraping statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let inserted = db::insert_sources(&conn, &settings.sources)?;
            println!(
                "Inserted {} new source URLs ({} configured)",
                inserted,
                settings.sources.len()
            );
            Ok(())
        }
        Commands::Scrape { limit, all } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let sources = db::fetch_sources(&conn, all, limit)?;
            if sources.is_empty() {
                println!("No sources to fetch. Run 'init' first or pass --all.");
                return Ok(());
            }
            println!("Fetching {} sources (streaming to DB)...", sources.len());
            let stats = scraper::scrape_sources(&conn, sources, &fetch_options(&settings)).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Process => {
            let mut conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            process(&mut conn, &settings)
        }
        Commands::Run { limit } => {
            let mut conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            db::insert_sources(&conn, &settings.sources)?;

            // Phase 1: fetch
            let t_scrape = Instant::now();
            let sources = db::fetch_sources(&conn, true, limit)?;
            println!("Pipeline: fetching {} sources...", sources.len());
            let stats = scraper::scrape_sources(&conn, sources, &fetch_options(&settings)).await?;
            println!(
                "Fetched {} sources ({} ok, {} errors) in {:.1}s",
                stats.total,
                stats.ok,
                stats.errors,
                t_scrape.elapsed().as_secs_f64()
            );

            // Phase 2: extract
            process(&mut conn, &settings)
        }
        Commands::Extract { inputs } => {
            let documents = read_documents(&inputs)?;
            let extractor = MarkdownExtractor::new(settings.extractor_config());
            let run = pipeline::run(&extractor, &documents);
            println!("{}", serde_json::to_string_pretty(&run.proposals)?);
            Ok(())
        }
        Commands::Proposals {
            agency,
            limit,
            json,
        } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_proposals(&conn, agency.as_deref(), Some(limit))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            if rows.is_empty() {
                println!("No proposals found.");
                return Ok(());
            }
            print_table(&rows);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Sources:   {}", s.sources);
            println!("Visited:   {}", s.visited);
            println!("Unvisited: {}", s.unvisited);
            println!("Scraped:   {}", s.scraped);
            println!("Errors:    {}", s.errors);
            println!("Proposals: {}", s.proposals);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn fetch_options(settings: &Settings) -> scraper::FetchOptions {
    scraper::FetchOptions {
        concurrency: settings.concurrency,
        delay: Duration::from_millis(settings.fetch_delay_ms),
    }
}

/// Run the pipeline over the latest page of every source and store the result.
fn process(conn: &mut rusqlite::Connection, settings: &Settings) -> anyhow::Result<()> {
    let documents = db::fetch_latest_documents(conn)?;
    if documents.is_empty() {
        println!("Nothing to process. Run 'scrape' first.");
        return Ok(());
    }

    let t_process = Instant::now();
    println!("Processing {} pages...", documents.len());
    let extractor = MarkdownExtractor::new(settings.extractor_config());
    let run = pipeline::run(&extractor, &documents);
    let saved = db::replace_proposals(conn, &run.proposals)?;

    println!(
        "Saved {} proposals ({} candidates) in {:.1}s",
        saved,
        run.candidates,
        t_process.elapsed().as_secs_f64()
    );
    if !run.empty_sources.is_empty() {
        println!("No proposals found on:");
        for url in &run.empty_sources {
            println!("  {}", url);
        }
    }
    Ok(())
}

/// Parse `URL=PATH` pairs and read each file. Unreadable files are skipped.
fn read_documents(inputs: &[String]) -> anyhow::Result<Vec<SourceDocument>> {
    let mut documents = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (url, path) = parse_input(input)?;
        match std::fs::read_to_string(&path) {
            Ok(markdown) => documents.push(SourceDocument::new(url, markdown)),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable file"),
        }
    }
    Ok(documents)
}

fn parse_input(input: &str) -> anyhow::Result<(&str, PathBuf)> {
    // Split on the last '=' since query strings may contain one
    let (url, path) = input
        .rsplit_once('=')
        .filter(|(url, path)| !url.is_empty() && !path.is_empty())
        .with_context(|| format!("Expected URL=PATH, got {:?}", input))?;
    Ok((url, PathBuf::from(path)))
}

fn print_table(rows: &[ProposalRecord]) {
    println!(
        "{:>3} | {:<48} | {:<28} | {:<16} | {:<16}",
        "#", "Title", "Agency", "Start", "Deadline"
    );
    println!("{}", "-".repeat(124));

    for (i, r) in rows.iter().enumerate() {
        println!(
            "{:>3} | {:<48} | {:<28} | {:<16} | {:<16}",
            i + 1,
            truncate(&r.title, 45),
            truncate(&r.agency, 25),
            truncate(&r.start_date.to_string(), 16),
            truncate(&r.end_date.to_string(), 16),
        );
    }

    println!("\n--- Links ---");
    for (i, r) in rows.iter().enumerate() {
        println!("{:>3}  {}", i + 1, r.link);
    }

    println!("\n{} proposals", rows.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
