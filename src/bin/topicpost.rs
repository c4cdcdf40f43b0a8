use anyhow::Result;
use clap::Parser;
use tracing::info;

use feedpost::commands::post_next_topic;
use feedpost::config::{self, Credentials};
use feedpost::state::TopicStore;

/// Command-line arguments for topicpost
#[derive(Parser, Debug)]
#[command(name = "topicpost", version)]
#[command(about = "Post one LLM-written post for the next topic in the queue file")]
struct Cli {}

fn main() -> Result<()> {
    Cli::parse();

    dotenvy::dotenv().ok();
    feedpost::init_logging();

    let cfg = config::load_config()?;
    let creds = Credentials::from_env()?;
    let http = config::http_client(&cfg)?;
    let (model, publisher) = feedpost::build_clients(&cfg, creds, &http);

    let store = TopicStore::new(&cfg.topics_path);
    let outcome = post_next_topic(&model, &publisher, &store)?;
    info!(?outcome, "Topic run finished");
    Ok(())
}
