use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use crate::error::ExtractError;

/// `[text](url)`, lazily matched so several links on one line stay separate.
pub static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.+?)\]\((.+?)\)").unwrap());

/// A table rule line: pipes, dashes, alignment colons and spaces only.
pub static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|[\s:\-|]+\|$").unwrap());

pub static BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[*\-+]\s").unwrap());

/// Pipe-delimited cells, trimmed, empty cells dropped.
pub fn split_cells(line: &str) -> Vec<&str> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .collect()
}

/// All `[text](url)` links in `text`, skipping image syntax `![alt](src)`
/// and linked images `[![alt](src)](href)`.
pub fn links(text: &str) -> impl Iterator<Item = Captures<'_>> {
    MD_LINK_RE.captures_iter(text).filter(move |caps| {
        let start = caps.get(0).map_or(0, |m| m.start());
        let label = caps.get(1).map_or("", |m| m.as_str());
        !text[..start].ends_with('!') && !label.starts_with("![")
    })
}

/// First link in `text`, as (visible text, href).
pub fn first_link(text: &str) -> Option<(&str, &str)> {
    links(text)
        .next()
        .and_then(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
}

/// Make `href` absolute. Absolute web URLs are kept as written; anything
/// relative is joined onto the origin (scheme + host) of `source_url`.
pub fn resolve_link(source_url: &str, href: &str) -> Result<String, ExtractError> {
    let href = strip_link_title(href.trim());

    if let Ok(absolute) = Url::parse(href) {
        return if absolute.has_host() {
            Ok(href.to_string())
        } else {
            Err(ExtractError::NotWebLink {
                href: href.to_string(),
            })
        };
    }

    let base = Url::parse(source_url).map_err(|source| ExtractError::InvalidSourceUrl {
        url: source_url.to_string(),
        source,
    })?;
    let unresolvable = |source: url::ParseError| ExtractError::UnresolvableLink {
        base: source_url.to_string(),
        href: href.to_string(),
        source,
    };
    let origin = base.join("/").map_err(unresolvable)?;
    let joined = origin.join(href).map_err(unresolvable)?;
    if !joined.has_host() {
        return Err(ExtractError::NotWebLink {
            href: href.to_string(),
        });
    }
    Ok(joined.into())
}

/// `url "Title"` → `url`, and `<url>` → `url`.
fn strip_link_title(href: &str) -> &str {
    let href = href.split_once(char::is_whitespace).map_or(href, |(url, _)| url);
    href.strip_prefix('<')
        .and_then(|h| h.strip_suffix('>'))
        .unwrap_or(href)
}
