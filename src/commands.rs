use anyhow::Result;
use chrono::Utc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::compose::{Article, Composer};
use crate::fetch::FeedSource;
use crate::llm::LanguageModel;
use crate::publish::{Publisher, publish_post};
use crate::scrape::ArticleSource;
use crate::state::{HistoryStore, TopicStore};

/// External services one check talks to.
pub struct Services<'a> {
    pub feed: &'a dyn FeedSource,
    pub scraper: &'a dyn ArticleSource,
    pub model: &'a dyn LanguageModel,
    pub publisher: &'a dyn Publisher,
}

/// What a single feed check ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    NoArticle,
    AlreadyPosted,
    Posted { link: String, id: Option<String> },
    PublishFailed { link: String },
}

/// What a topic run ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    Empty,
    Posted { topic: String, id: Option<String> },
    Restored { topic: String },
}

/// Check the feed once and post its newest article if we haven't already.
///
/// History is only written after the platform confirms the post, so a
/// failed publish leaves the same article to be retried next time.
pub fn single_check(services: &Services<'_>, history_store: &HistoryStore) -> Result<CheckOutcome> {
    let mut history = history_store.load()?;

    let entry = match services.feed.latest_entry() {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            info!("No articles found in feed");
            return Ok(CheckOutcome::NoArticle);
        }
        Err(err) => {
            warn!(error = %err, "Could not read feed, no article found");
            return Ok(CheckOutcome::NoArticle);
        }
    };

    if entry.link == history.last_article_link {
        info!(last_check = %history.last_check, "No new articles");
        return Ok(CheckOutcome::AlreadyPosted);
    }

    info!(title = %entry.title, link = %entry.link, "New article found");

    let scraped = services.scraper.scrape(&entry.link);
    let article = Article {
        title: if scraped.title.is_empty() {
            entry.title.clone()
        } else {
            scraped.title
        },
        link: entry.link.clone(),
        published: entry.published,
        full_content: scraped.full_content,
        summary: scraped.summary,
    };

    let post = Composer::new(services.model).compose_from_article(&article);
    if post.is_fallback() {
        info!("Using fallback post text");
    }

    let outcome = publish_post(services.publisher, post.text());
    if !outcome.success {
        return Ok(CheckOutcome::PublishFailed { link: entry.link });
    }

    history.last_article_link = entry.link.clone();
    history.last_check = Utc::now().to_rfc3339();
    history_store.save(&history)?;

    Ok(CheckOutcome::Posted {
        link: entry.link,
        id: outcome.id,
    })
}

/// One iteration of the continuous loop: errors are logged, never returned.
pub fn check_logged(services: &Services<'_>, history_store: &HistoryStore) -> Option<CheckOutcome> {
    match single_check(services, history_store) {
        Ok(outcome) => Some(outcome),
        Err(err) => {
            error!(error = %err, "Error in main loop");
            None
        }
    }
}

/// Run `check_logged` forever, sleeping `interval` after every attempt.
pub fn run_forever(services: &Services<'_>, history_store: &HistoryStore, interval: Duration) -> ! {
    loop {
        check_logged(services, history_store);
        thread::sleep(interval);
    }
}

/// Post the topic at the head of the queue.
///
/// The entry is removed before posting and put back at the head if the
/// platform rejects the post, so the queue on disk only shrinks on success.
pub fn post_next_topic(
    model: &dyn LanguageModel,
    publisher: &dyn Publisher,
    store: &TopicStore,
) -> Result<TopicOutcome> {
    let mut queue = store.load()?;

    let Some(entry) = queue.pop_front() else {
        info!(path = %store.path().display(), "No topics left, add more to the queue file");
        return Ok(TopicOutcome::Empty);
    };

    let post = Composer::new(model).compose_from_topic(&entry.topic);
    let outcome = publish_post(publisher, post.text());

    if outcome.success {
        store.save(&queue)?;
        info!(remaining = queue.len(), "Topic dequeued");
        if queue.is_empty() {
            warn!(path = %store.path().display(), "Topic queue is now empty");
        }
        Ok(TopicOutcome::Posted {
            topic: entry.topic,
            id: outcome.id,
        })
    } else {
        let topic = entry.topic.clone();
        queue.push_front(entry);
        store.save(&queue)?;
        warn!(%topic, "Post failed, topic restored to the head of the queue");
        Ok(TopicOutcome::Restored { topic })
    }
}
