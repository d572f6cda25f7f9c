use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::agency::{AgencyResolver, AgencyRule};
use crate::error::SettingsError;

pub const CONFIG_FILE: &str = "proposals.toml";
pub const DEFAULT_DB_PATH: &str = "data/proposals.sqlite";

/// Research funding pages scraped by default.
pub const DEFAULT_SOURCES: &[&str] = &[
    "https://dst.gov.in/call-for-proposals",
    "https://www.dbtindia.gov.in/latest-announcement",
    "https://birac.nic.in/cfp.php",
    "https://www.icmr.gov.in/whatnew.html",
    "https://serb.gov.in/page/show/63",
    "https://www.icssr.org/funding",
    "https://www.cefipra.org/ResearchProjects",
    "https://www.igstc.org/",
    "https://tdb.gov.in/",
    "https://www.ugc.ac.in/",
    "https://sparc.iitkgp.ac.in/",
    "https://www.nasi.org.in/awards.htm",
    "https://insaindia.res.in/",
    "https://vit.ac.in/research/call-for-proposals",
];

const LINK_SKIP_WORDS: &[&str] = &["home", "menu", "login", "about", "contact", "privacy", "terms"];

const LINK_KEYWORDS: &[&str] = &[
    "call",
    "proposal",
    "funding",
    "fellowship",
    "grant",
    "award",
    "scheme",
    "program",
    "research",
    "phd",
    "postdoc",
    "scientist",
    "innovation",
    "startup",
];

/// Word pairs that must appear in this order somewhere in a line.
const TEXT_PHRASES: &[(&str, &str)] = &[
    ("call", "proposal"),
    ("funding", "available"),
    ("fellowship", "application"),
    ("grant", "deadline"),
    ("research", "opportunity"),
    ("phd", "position"),
    ("postdoc", "opening"),
];

/// Immutable tables and thresholds driving the extraction strategies.
///
/// Word lists are matched case-insensitively as substrings and are expected
/// in lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub agencies: AgencyResolver,
    pub link_skip_words: Vec<String>,
    pub link_keywords: Vec<String>,
    pub text_phrases: Vec<(String, String)>,
    pub min_link_text_chars: usize,
    pub min_text_line_chars: usize,
    pub max_title_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            agencies: AgencyResolver::default(),
            link_skip_words: to_owned(LINK_SKIP_WORDS),
            link_keywords: to_owned(LINK_KEYWORDS),
            text_phrases: TEXT_PHRASES
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            min_link_text_chars: 10,
            min_text_line_chars: 20,
            max_title_chars: 200,
        }
    }
}

impl ExtractorConfig {
    pub fn with_agencies(mut self, agencies: AgencyResolver) -> Self {
        self.agencies = agencies;
        self
    }
}

fn to_owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Application settings: defaults, then `proposals.toml`, then `PROPOSALS_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    pub concurrency: usize,
    pub fetch_delay_ms: u64,
    pub sources: Vec<String>,
    /// Replaces the built-in agency table when non-empty.
    #[serde(default)]
    pub agencies: Vec<AgencyRule>,
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .set_default("db_path", DEFAULT_DB_PATH)?
            .set_default("concurrency", 4)?
            .set_default("fetch_delay_ms", 1000)?
            .set_default("sources", DEFAULT_SOURCES.to_vec())?
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("PROPOSALS")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("sources"),
            )
            .build()?
            .try_deserialize()?;

        if settings.concurrency == 0 {
            return Err(SettingsError::Invalid {
                key: "concurrency",
                reason: "must be at least 1".into(),
            });
        }
        Ok(settings)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        let config = ExtractorConfig::default();
        if self.agencies.is_empty() {
            config
        } else {
            config.with_agencies(AgencyResolver::new(self.agencies.clone()))
        }
    }
}
