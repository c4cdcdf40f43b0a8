use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::oauth::{self, OAuthKeys};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("platform rejected post ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("could not decode response: {0}")]
    Decode(reqwest::Error),
}

pub trait Publisher {
    /// Returns the id of the created post.
    fn publish(&self, text: &str) -> Result<String, PublishError>;
}

/// Result of a publish attempt after errors have been logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub success: bool,
    pub id: Option<String>,
}

/// Publish and swallow the error; the caller only needs to know whether it worked.
pub fn publish_post(publisher: &dyn Publisher, text: &str) -> PublishOutcome {
    match publisher.publish(text) {
        Ok(id) => {
            info!(%id, text, "Posted");
            PublishOutcome {
                success: true,
                id: Some(id),
            }
        }
        Err(err) => {
            error!(error = %err, "Error posting");
            PublishOutcome {
                success: false,
                id: None,
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePost<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: CreatedPost,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiProblem {
    title: Option<String>,
    detail: Option<String>,
}

/// X API v2 client, user context (OAuth 1.0a).
pub struct XClient {
    client: Client,
    api_base: String,
    keys: OAuthKeys,
}

impl XClient {
    pub fn new(client: Client, api_base: impl Into<String>, keys: OAuthKeys) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            keys,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/2/tweets", self.api_base.trim_end_matches('/'))
    }
}

impl Publisher for XClient {
    fn publish(&self, text: &str) -> Result<String, PublishError> {
        let url = self.endpoint();
        let auth = oauth::authorization_header(
            &self.keys,
            "POST",
            &url,
            &[],
            &oauth::nonce(),
            oauth::timestamp(),
        );

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&CreatePost { text })
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let detail = serde_json::from_str::<ApiProblem>(&body)
                .ok()
                .and_then(|p| p.detail.or(p.title))
                .unwrap_or(body);
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let created: CreatePostResponse = resp.json().map_err(PublishError::Decode)?;
        Ok(created.data.id)
    }
}
