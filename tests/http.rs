//! HTTP-level tests against a local mock server.
//!
//! The crate uses the blocking reqwest client, so every call is made from
//! `spawn_blocking` while wiremock runs on the test runtime.

use feedpost::fetch::{FeedSource, FetchError, HttpFeed};
use feedpost::llm::{ChatClient, LanguageModel, LlmError, Prompt};
use feedpost::oauth::OAuthKeys;
use feedpost::publish::{PublishError, Publisher, XClient};
use feedpost::scrape::{ArticleSource, HtmlScraper, ScrapedArticle, Selectors};
use pretty_assertions::assert_eq;
use reqwest::blocking::Client;
use secrecy::SecretString;
use serde_json::json;
use std::io;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn keys() -> OAuthKeys {
    OAuthKeys {
        consumer_key: SecretString::from("ck"),
        consumer_secret: SecretString::from("cs"),
        token: SecretString::from("tk"),
        token_secret: SecretString::from("ts"),
    }
}

fn prompt() -> Prompt {
    Prompt {
        system: "sys".into(),
        user: "usr".into(),
        max_tokens: 150,
        temperature: 0.7,
    }
}

fn selectors() -> Selectors {
    Selectors {
        content: "div.post-content p".into(),
        title: "h1.post__title".into(),
    }
}

// ============================================================================
// Feed
// ============================================================================

#[tokio::test]
async fn feed_returns_newest_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title><link>https://e.com</link><description>d</description>
<item><title>First</title><link>https://e.com/1</link></item>
<item><title>Second</title><link>https://e.com/2</link></item>
</channel></rss>"#,
        ))
        .mount(&server)
        .await;

    let url = format!("{}/rss", server.uri());
    let entry = tokio::task::spawn_blocking(move || HttpFeed::new(Client::new(), url).latest_entry())
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(entry.title, "First");
    assert_eq!(entry.link, "https://e.com/1");
}

#[tokio::test]
async fn feed_http_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/rss", server.uri());
    let result = tokio::task::spawn_blocking(move || HttpFeed::new(Client::new(), url).latest_entry())
        .await
        .unwrap();

    assert!(matches!(result, Err(FetchError::HttpStatus(500))));
}

// ============================================================================
// Scraper
// ============================================================================

#[tokio::test]
async fn scraper_extracts_article() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/news/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<h1 class="post__title">Headline</h1><div class="post-content"><p>a</p><p>b</p></div>"#,
        ))
        .mount(&server)
        .await;

    let url = format!("{}/news/1", server.uri());
    let article =
        tokio::task::spawn_blocking(move || HtmlScraper::new(Client::new(), selectors()).scrape(&url))
            .await
            .unwrap();

    assert_eq!(
        article,
        ScrapedArticle {
            title: "Headline".into(),
            full_content: "a\nb".into(),
            summary: "a\nb".into(),
        }
    );
}

#[tokio::test]
async fn scraper_swallows_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/gone", server.uri());
    let article =
        tokio::task::spawn_blocking(move || HtmlScraper::new(Client::new(), selectors()).scrape(&url))
            .await
            .unwrap();

    assert_eq!(article, ScrapedArticle::default());
}

// ============================================================================
// Language model
// ============================================================================

#[tokio::test]
async fn chat_client_sends_prompt_and_reads_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer gk"))
        .and(body_json(json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "usr"}
            ],
            "max_tokens": 150,
            "temperature": 0.7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "  Drafted post  "}}]
        })))
        .mount(&server)
        .await;

    let base = format!("{}/openai/v1", server.uri());
    let text = tokio::task::spawn_blocking(move || {
        ChatClient::new(Client::new(), base, SecretString::from("gk"), "test-model")
            .complete(&prompt())
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(text, "Drafted post");
}

#[tokio::test]
async fn chat_client_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let base = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        ChatClient::new(Client::new(), base, SecretString::from("gk"), "m").complete(&prompt())
    })
    .await
    .unwrap();

    match result {
        Err(LlmError::Api { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_client_rejects_empty_choices() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let base = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        ChatClient::new(Client::new(), base, SecretString::from("gk"), "m").complete(&prompt())
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(LlmError::EmptyResponse)));
}

#[tokio::test]
async fn chat_client_reports_undecodable_body_as_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let base = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        ChatClient::new(Client::new(), base, SecretString::from("gk"), "m").complete(&prompt())
    })
    .await
    .unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, LlmError::Decode(_)));
    assert!(err.to_string().starts_with("could not decode response"));
}

// ============================================================================
// Publisher
// ============================================================================

#[tokio::test]
async fn x_client_posts_signed_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(|req: &Request| {
            req.headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| {
                    v.starts_with("OAuth ")
                        && v.contains(r#"oauth_consumer_key="ck""#)
                        && v.contains(r#"oauth_token="tk""#)
                        && v.contains(r#"oauth_signature_method="HMAC-SHA1""#)
                        && v.contains(r#"oauth_signature=""#)
                })
        })
        .and(body_json(json!({"text": "hello world"})))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"data": {"id": "1789", "text": "hello world"}})),
        )
        .mount(&server)
        .await;

    let base = server.uri();
    let id = tokio::task::spawn_blocking(move || {
        XClient::new(Client::new(), base, keys()).publish("hello world")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(id, "1789");
}

#[tokio::test]
async fn x_client_reports_platform_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "title": "Forbidden",
            "detail": "You are not allowed to create a Tweet with duplicate content.",
            "type": "about:blank",
            "status": 403
        })))
        .mount(&server)
        .await;

    let base = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        XClient::new(Client::new(), base, keys()).publish("hello world")
    })
    .await
    .unwrap();

    match result {
        Err(PublishError::Rejected { status, detail }) => {
            assert_eq!(status, 403);
            assert!(detail.contains("duplicate content"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn x_client_reports_undecodable_body_as_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .mount(&server)
        .await;

    let base = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        XClient::new(Client::new(), base, keys()).publish("hello world")
    })
    .await
    .unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, PublishError::Decode(_)));
    assert!(!err.to_string().starts_with("request failed"));
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn scraper_logs_character_count_not_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<div class="post-content"><p>ééé</p></div>"#),
        )
        .mount(&server)
        .await;

    let url = format!("{}/news/2", server.uri());
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let article = tokio::task::spawn_blocking(move || {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            HtmlScraper::new(Client::new(), selectors()).scrape(&url)
        })
    })
    .await
    .unwrap();

    assert_eq!(article.full_content, "ééé");
    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("chars=3"), "{output}");
}
