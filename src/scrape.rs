use anyhow::{Result, anyhow};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Number of leading paragraphs kept as the summary.
pub const SUMMARY_PARAGRAPHS: usize = 5;

/// Text pulled out of an article page. All fields are empty when scraping fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedArticle {
    pub title: String,
    pub full_content: String,
    pub summary: String,
}

pub trait ArticleSource {
    /// Never fails; problems are logged and produce an empty article.
    fn scrape(&self, url: &str) -> ScrapedArticle;
}

/// CSS selectors describing where a site keeps its article text.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub content: String,
    pub title: String,
}

pub struct HtmlScraper {
    client: Client,
    selectors: Selectors,
}

impl HtmlScraper {
    pub fn new(client: Client, selectors: Selectors) -> Self {
        Self { client, selectors }
    }

    fn try_scrape(&self, url: &str) -> Result<ScrapedArticle> {
        let resp = self.client.get(url).send()?;
        if !resp.status().is_success() {
            return Err(anyhow!("HTTP error {}", resp.status()));
        }
        let html = resp.text()?;
        extract(&html, &self.selectors)
    }
}

impl ArticleSource for HtmlScraper {
    fn scrape(&self, url: &str) -> ScrapedArticle {
        match self.try_scrape(url) {
            Ok(article) => {
                debug!(%url, chars = article.full_content.chars().count(), "Scraped article");
                article
            }
            Err(err) => {
                warn!(%url, error = %err, "Error scraping article");
                ScrapedArticle::default()
            }
        }
    }
}

/// Pull title and paragraphs out of an HTML document.
pub fn extract(html: &str, selectors: &Selectors) -> Result<ScrapedArticle> {
    let content_sel = Selector::parse(&selectors.content)
        .map_err(|e| anyhow!("invalid content selector '{}': {}", selectors.content, e))?;
    let title_sel = Selector::parse(&selectors.title)
        .map_err(|e| anyhow!("invalid title selector '{}': {}", selectors.title, e))?;

    let document = Html::parse_document(html);

    let paragraphs: Vec<String> = document
        .select(&content_sel)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .collect();

    let title = document
        .select(&title_sel)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let summary_len = paragraphs.len().min(SUMMARY_PARAGRAPHS);

    Ok(ScrapedArticle {
        title,
        summary: paragraphs[..summary_len].join("\n"),
        full_content: paragraphs.join("\n"),
    })
}
