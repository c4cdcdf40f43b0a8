pub mod commands;
pub mod compose;
pub mod config;
pub mod fetch;
pub mod llm;
pub mod oauth;
pub mod publish;
pub mod scrape;
pub mod state;

use crate::config::{Config, Credentials};
use crate::llm::ChatClient;
use crate::oauth::OAuthKeys;
use crate::publish::XClient;

/// Install the `tracing` subscriber (`RUST_LOG`, default `info`).
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Real model and platform clients, built from config and credentials.
pub fn build_clients(
    cfg: &Config,
    creds: Credentials,
    http: &reqwest::blocking::Client,
) -> (ChatClient, XClient) {
    let Credentials {
        api_key,
        api_key_secret,
        access_token,
        access_token_secret,
        groq_api_key,
    } = creds;

    let model = ChatClient::new(http.clone(), &cfg.llm_api_base, groq_api_key, &cfg.model);
    let publisher = XClient::new(
        http.clone(),
        &cfg.x_api_base,
        OAuthKeys {
            consumer_key: api_key,
            consumer_secret: api_key_secret,
            token: access_token,
            token_secret: access_token_secret,
        },
    );
    (model, publisher)
}
