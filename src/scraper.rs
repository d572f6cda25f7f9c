use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use rusqlite::Connection;
use spider_client::shapes::request::{ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::db::ScrapeRow;

static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[?!\[[^\]]*\]\([^)]*\)(?:\]\([^)]*\))?").unwrap());
static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Fetch politeness, taken from [`proposal_scraper::Settings`].
pub struct FetchOptions {
    pub concurrency: usize,
    pub delay: Duration,
}

pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

fn spider_client() -> Result<Spider> {
    let api_key = std::env::var("SPIDER_API_KEY")
        .context("SPIDER_API_KEY environment variable must be set")?;
    Spider::new(Some(api_key)).map_err(|e| anyhow::anyhow!("Failed to create Spider client: {}", e))
}

/// Fetch sources concurrently and save every result, failures included, as it arrives.
pub async fn scrape_sources(
    conn: &Connection,
    sources: Vec<(i64, String)>,
    options: &FetchOptions,
) -> Result<ScrapeStats> {
    let spider = Arc::new(spider_client()?);
    let semaphore = Arc::new(Semaphore::new(options.concurrency));
    let total = sources.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<ScrapeRow>(options.concurrency * 2);

    for (source_id, url) in sources {
        let spider = Arc::clone(&spider);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();
        let delay = options.delay;

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let row = scrape_one(&spider, source_id, &url).await;
            let _ = tx.send(row).await;
            // Hold the permit so each worker pauses between requests
            tokio::time::sleep(delay).await;
        });
    }

    // rx closes once every task has dropped its sender
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    let mut insert_stmt = conn.prepare(
        "INSERT INTO page_data (source_id, url, markdown, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut update_stmt = conn.prepare(
        "UPDATE sources SET visited = 1, visited_at = datetime('now') WHERE id = ?1",
    )?;

    while let Some(row) = rx.recv().await {
        match &row.error {
            Some(e) => {
                warn!(url = %row.url, error = %e, "Fetch failed");
                errors += 1;
            }
            None => ok += 1,
        }
        save_one(&mut insert_stmt, &mut update_stmt, &row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Scraped {} sources ({} ok, {} errors)", total, ok, errors);

    Ok(ScrapeStats { total, ok, errors })
}

fn save_one(
    insert: &mut rusqlite::Statement,
    update: &mut rusqlite::Statement,
    row: &ScrapeRow,
) -> Result<()> {
    insert.execute(rusqlite::params![
        row.source_id,
        row.url,
        row.markdown,
        row.status,
        row.error,
        row.latency_ms,
    ])?;
    update.execute(rusqlite::params![row.source_id])?;
    Ok(())
}

async fn scrape_one(spider: &Spider, source_id: i64, url: &str) -> ScrapeRow {
    let params = RequestParams {
        return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Markdown)),
        ..Default::default()
    };

    let start = Instant::now();
    let response = spider
        .scrape_url(url, Some(params), "application/json")
        .await;
    let latency_ms = Some(start.elapsed().as_millis() as i64);

    let mut row = ScrapeRow {
        source_id,
        url: url.to_string(),
        markdown: None,
        status: None,
        error: None,
        latency_ms,
    };

    let value = match response {
        Ok(value) => value,
        Err(e) => {
            row.error = Some(e.to_string());
            return row;
        }
    };

    let (content, status) = parse_response(value);
    debug!(url, ?status, chars = content.as_ref().map_or(0, String::len), "Fetched");
    row.status = status;
    match content.filter(|md| !md.trim().is_empty()) {
        Some(md) => row.markdown = Some(md),
        None => row.error = Some(format!("No content (status {:?})", status)),
    }
    row
}

/// Markdown and HTTP status of the first page in a spider.cloud response.
fn parse_response(value: serde_json::Value) -> (Option<String>, Option<i32>) {
    let parsed: serde_json::Value = match value.as_str() {
        Some(s) => serde_json::from_str(s).unwrap_or(value.clone()),
        None => value,
    };

    let first = parsed.as_array().and_then(|arr| arr.first());

    let content = first
        .and_then(|obj| obj.get("content"))
        .and_then(|c| c.as_str())
        .map(strip_images);

    let status = first
        .and_then(|obj| obj.get("status"))
        .and_then(|s| s.as_i64())
        .map(|s| s as i32);

    (content, status)
}

/// Remove markdown images, linked images included, and squeeze the blank
/// lines they leave behind.
fn strip_images(md: &str) -> String {
    let cleaned = IMAGE_RE.replace_all(md, "");
    BLANK_LINES_RE.replace_all(&cleaned, "\n\n").into_owned()
}
