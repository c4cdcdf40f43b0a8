use anyhow::Result;
use clap::Parser;
use tracing::info;

use feedpost::commands::{Services, run_forever, single_check};
use feedpost::config::{self, Credentials};
use feedpost::fetch::HttpFeed;
use feedpost::scrape::{HtmlScraper, Selectors};
use feedpost::state::HistoryStore;

/// Command-line arguments for feedpost
#[derive(Parser, Debug)]
#[command(name = "feedpost", version)]
#[command(about = "Post the newest RSS article to X as an LLM-written summary")]
pub struct Cli {
    /// Check once for a new article and exit (for cron-style scheduling)
    #[arg(long)]
    pub single_check: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    feedpost::init_logging();

    let cfg = config::load_config()?;
    let creds = Credentials::from_env()?;
    let http = config::http_client(&cfg)?;

    let (model, publisher) = feedpost::build_clients(&cfg, creds, &http);
    let feed = HttpFeed::new(http.clone(), &cfg.feed_url);
    let scraper = HtmlScraper::new(
        http,
        Selectors {
            content: cfg.content_selector.clone(),
            title: cfg.title_selector.clone(),
        },
    );
    let services = Services {
        feed: &feed,
        scraper: &scraper,
        model: &model,
        publisher: &publisher,
    };
    let history = HistoryStore::new(&cfg.history_path);

    info!(feed = %feed.url(), history = %history.path().display(), "Starting news post bot");

    if cli.single_check {
        info!("Running in single check mode");
        let outcome = single_check(&services, &history)?;
        info!(?outcome, "Check finished");
        Ok(())
    } else {
        info!(
            interval_secs = cfg.poll_interval.as_secs(),
            "Running in continuous mode, press Ctrl+C to stop"
        );
        run_forever(&services, &history, cfg.poll_interval)
    }
}
