use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use proposal_scraper::{DateResult, ProposalRecord, SourceDocument};
use rusqlite::{params, Connection};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sources (
            id         INTEGER PRIMARY KEY,
            url        TEXT UNIQUE NOT NULL,
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_sources_visited ON sources(visited);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            source_id  INTEGER NOT NULL REFERENCES sources(id),
            url        TEXT NOT NULL,
            markdown   TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            scraped_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_source ON page_data(source_id);

        -- Latest pipeline output, in deadline order
        CREATE TABLE IF NOT EXISTS proposals (
            id           INTEGER PRIMARY KEY,
            position     INTEGER NOT NULL,
            title        TEXT NOT NULL,
            agency       TEXT NOT NULL,
            start_date   TEXT NOT NULL,
            end_date     TEXT NOT NULL,
            link         TEXT NOT NULL,
            source_url   TEXT NOT NULL,
            extracted_at TEXT NOT NULL,
            UNIQUE(title, agency, link)
        );
        CREATE INDEX IF NOT EXISTS idx_proposals_agency ON proposals(agency);
        ",
    )?;
    Ok(())
}

pub fn insert_sources(conn: &Connection, urls: &[String]) -> Result<usize> {
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO sources (url) VALUES (?1)")?;
    let mut inserted = 0;
    for url in urls {
        inserted += stmt.execute(params![url])?;
    }
    Ok(inserted)
}

/// (id, url) of sources to scrape; `all` includes already visited ones.
pub fn fetch_sources(conn: &Connection, all: bool, limit: Option<usize>) -> Result<Vec<(i64, String)>> {
    let limit = limit.map_or(-1, |n| n as i64);
    let mut stmt = conn.prepare(
        "SELECT id, url FROM sources WHERE (?1 OR visited = 0) ORDER BY id LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![all, limit], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Result of one fetch, saved whether or not it succeeded.
pub struct ScrapeRow {
    pub source_id: i64,
    pub url: String,
    pub markdown: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

/// Latest successful markdown per source, in source order.
pub fn fetch_latest_documents(conn: &Connection) -> Result<Vec<SourceDocument>> {
    let mut stmt = conn.prepare(
        "SELECT s.url, d.markdown
         FROM page_data d
         JOIN (
             SELECT source_id, MAX(id) AS id FROM page_data
             WHERE error IS NULL AND markdown IS NOT NULL
             GROUP BY source_id
         ) latest ON latest.id = d.id
         JOIN sources s ON s.id = d.source_id
         ORDER BY s.id",
    )?;
    let docs = stmt
        .query_map([], |row| {
            Ok(SourceDocument {
                url: row.get(0)?,
                markdown: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(docs)
}

/// Replace the stored snapshot with `records`, keeping their order.
pub fn replace_proposals(conn: &mut Connection, records: &[ProposalRecord]) -> Result<usize> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM proposals", [])?;
    let mut saved = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO proposals
                (position, title, agency, start_date, end_date, link, source_url, extracted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (i, r) in records.iter().enumerate() {
            saved += stmt.execute(params![
                i as i64,
                r.title,
                r.agency,
                r.start_date.to_string(),
                r.end_date.to_string(),
                r.link,
                r.source_url,
                r.extracted_at,
            ])?;
        }
    }
    tx.commit()?;
    Ok(saved)
}

/// Stored proposals in deadline order, optionally filtered by a
/// case-insensitive agency substring.
pub fn fetch_proposals(
    conn: &Connection,
    agency: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<ProposalRecord>> {
    let limit = limit.map_or(-1, |n| n as i64);
    let mut stmt = conn.prepare(
        "SELECT title, agency, start_date, end_date, link, source_url, extracted_at
         FROM proposals
         WHERE ?1 IS NULL OR agency LIKE '%' || ?1 || '%'
         ORDER BY position
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![agency, limit], |row| {
            let start: String = row.get(2)?;
            let end: String = row.get(3)?;
            let extracted_at: DateTime<Utc> = row.get(6)?;
            Ok(ProposalRecord {
                title: row.get(0)?,
                agency: row.get(1)?,
                start_date: DateResult::from_rendered(&start),
                end_date: DateResult::from_rendered(&end),
                link: row.get(4)?,
                source_url: row.get(5)?,
                extracted_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct Stats {
    pub sources: i64,
    pub visited: i64,
    pub unvisited: i64,
    pub scraped: i64,
    pub errors: i64,
    pub proposals: i64,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<i64> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };
    Ok(Stats {
        sources: count("SELECT COUNT(*) FROM sources")?,
        visited: count("SELECT COUNT(*) FROM sources WHERE visited = 1")?,
        unvisited: count("SELECT COUNT(*) FROM sources WHERE visited = 0")?,
        scraped: count(
            "SELECT COUNT(DISTINCT source_id) FROM page_data WHERE error IS NULL AND markdown IS NOT NULL",
        )?,
        errors: count("SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL")?,
        proposals: count("SELECT COUNT(*) FROM proposals")?,
    })
}

// ── Tests ──
