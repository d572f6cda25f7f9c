use thiserror::Error;

/// Why a single candidate record was dropped. Never aborts a strategy or a
/// document, only the candidate it describes.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid source url {url}: {source}")]
    InvalidSourceUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot resolve link {href} against {base}: {source}")]
    UnresolvableLink {
        base: String,
        href: String,
        #[source]
        source: url::ParseError,
    },

    /// `mailto:`, `javascript:` and friends.
    #[error("link {href} has no host")]
    NotWebLink { href: String },

    #[error("candidate from {source_url} has an empty title")]
    EmptyTitle { source_url: String },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
