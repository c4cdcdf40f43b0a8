use tracing::warn;

use crate::llm::{LanguageModel, Prompt};

/// Hard cap on a topic post, truncation marker included.
pub const MAX_POST_CHARS: usize = 280;
pub const ELLIPSIS: &str = "…";

const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;

const ARTICLE_SYSTEM_PROMPT: &str = "You are a blockchain expert creating tweets about the latest news. \
Your tweets should be short, insightful, and professional. DO NOT use quotation marks or emojis. \
Include the article link at the end of the tweet. Focus on the key points and why they matter.";

const TOPIC_SYSTEM_PROMPT: &str = "You are a blockchain expert creating tweets. \
Your tweets should be short, insightful, and professional. DO NOT use any emojis or quotation marks. \
Focus on clear and concise information.";

/// Everything the composer needs to know about an article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub published: Option<chrono::DateTime<chrono::Utc>>,
    pub full_content: String,
    pub summary: String,
}

/// A post ready to publish, tagged with where its text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composed {
    Generated(String),
    Fallback(String),
}

impl Composed {
    pub fn text(&self) -> &str {
        match self {
            Composed::Generated(s) | Composed::Fallback(s) => s,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Composed::Fallback(_))
    }
}

pub struct Composer<'a> {
    model: &'a dyn LanguageModel,
}

impl<'a> Composer<'a> {
    pub fn new(model: &'a dyn LanguageModel) -> Self {
        Self { model }
    }

    pub fn compose_from_article(&self, article: &Article) -> Composed {
        match self.model.complete(&article_prompt(article)) {
            Ok(text) => match clean(&text) {
                Some(post) => Composed::Generated(post),
                None => {
                    warn!(link = %article.link, "Model returned an empty post, using fallback");
                    Composed::Fallback(article_fallback(article))
                }
            },
            Err(err) => {
                warn!(link = %article.link, error = %err, "Error generating post, using fallback");
                Composed::Fallback(article_fallback(article))
            }
        }
    }

    pub fn compose_from_topic(&self, topic: &str) -> Composed {
        let fallback = || shorten(&topic_fallback(topic), MAX_POST_CHARS, ELLIPSIS);

        match self.model.complete(&topic_prompt(topic)) {
            Ok(text) => match clean(&text) {
                Some(post) => Composed::Generated(shorten(&post, MAX_POST_CHARS, ELLIPSIS)),
                None => {
                    warn!(%topic, "Model returned an empty post, using fallback");
                    Composed::Fallback(fallback())
                }
            },
            Err(err) => {
                warn!(%topic, error = %err, "Error generating post, using fallback");
                Composed::Fallback(fallback())
            }
        }
    }
}

pub fn article_prompt(article: &Article) -> Prompt {
    let details = format!(
        "Title: {}\n\nContent Summary:\n{}\n\nArticle Link: {}",
        article.title, article.summary, article.link
    );
    Prompt {
        system: ARTICLE_SYSTEM_PROMPT.to_string(),
        user: format!(
            "Create a short, engaging tweet (max 240 characters not including the link) about this \
blockchain news article. Focus on the most important aspect. Do not use quotation marks or emojis. \
Include relevant hashtags. Make it sound natural and insightful. The tweet should end with the \
article link.\n\n{details}"
        ),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

pub fn topic_prompt(topic: &str) -> Prompt {
    Prompt {
        system: TOPIC_SYSTEM_PROMPT.to_string(),
        user: format!(
            "Write a short, engaging tweet (under 240 characters) about: {topic}. Include relevant \
hashtags. Make it sound natural and insightful. Do not use any emojis or quotation marks. Keep it \
professional and well-structured."
        ),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
    }
}

pub fn article_fallback(article: &Article) -> String {
    format!(
        "Latest blockchain news: {} {} #Blockchain #Crypto",
        article.title, article.link
    )
}

pub fn topic_fallback(topic: &str) -> String {
    format!("Latest on {topic}. #Blockchain #Crypto")
}

/// Trim whitespace and any run of leading/trailing quote characters.
/// `None` if nothing is left.
pub fn clean(text: &str) -> Option<String> {
    let stripped = text
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// Collapse whitespace, then cut at a word boundary so the result plus
/// `marker` fits in `width` characters.
pub fn shorten(text: &str, width: usize, marker: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(marker.chars().count());
    let mut out = String::new();
    let mut len = 0;
    for word in &words {
        let sep = usize::from(!out.is_empty());
        let word_len = word.chars().count();
        if len + sep + word_len > budget {
            break;
        }
        if sep == 1 {
            out.push(' ');
        }
        out.push_str(word);
        len += sep + word_len;
    }

    if out.is_empty() {
        // a single word longer than the budget
        out = collapsed.chars().take(budget).collect();
    }
    out.push_str(marker);
    out
}
