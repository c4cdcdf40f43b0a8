use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::blocking::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error {0}")]
    HttpStatus(u16),
    #[error("parse error: {0}")]
    Parse(#[from] parser::ParseFeedError),
}

/// Newest entry of a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

/// Something that can report the newest article link.
pub trait FeedSource {
    fn latest_entry(&self) -> Result<Option<FeedEntry>, FetchError>;
}

/// RSS/Atom feed over HTTP
pub struct HttpFeed {
    client: Client,
    url: String,
}

impl HttpFeed {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedSource for HttpFeed {
    fn latest_entry(&self) -> Result<Option<FeedEntry>, FetchError> {
        let resp = self.client.get(&self.url).send()?;
        if !resp.status().is_success() {
            return Err(FetchError::HttpStatus(resp.status().as_u16()));
        }
        let bytes = resp.bytes()?;
        parse_latest(&bytes[..])
    }
}

/// Parse a feed document and keep only its first entry.
pub fn parse_latest(bytes: &[u8]) -> Result<Option<FeedEntry>, FetchError> {
    let parsed = parser::parse(bytes)?;

    let Some(entry) = parsed.entries.into_iter().next() else {
        return Ok(None);
    };

    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .unwrap_or_else(|| "(no title)".to_string());

    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let published = entry.published.or(entry.updated);

    Ok(Some(FeedEntry {
        title,
        link,
        published,
    }))
}
