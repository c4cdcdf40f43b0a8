use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::fs;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

/// Marker for the most recently published article.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct History {
    #[serde(default)]
    pub last_article_link: String,
    #[serde(default)]
    pub last_check: String, // RFC 3339, empty until the first post
}

/// One queued topic. Anything besides `topic` is carried through untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TopicEntry {
    pub topic: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TopicEntry {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            extra: Map::new(),
        }
    }
}

/// FIFO queue of topics, serialized as a plain JSON array.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(transparent)]
pub struct TopicQueue {
    entries: VecDeque<TopicEntry>,
}

impl TopicQueue {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pop_front(&mut self) -> Option<TopicEntry> {
        self.entries.pop_front()
    }

    /// Put an entry back at the head (rollback after a failed post).
    pub fn push_front(&mut self, entry: TopicEntry) {
        self.entries.push_front(entry);
    }
}

impl FromIterator<TopicEntry> for TopicQueue {
    fn from_iter<I: IntoIterator<Item = TopicEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// History file on disk
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load history from JSON (or an empty record)
    pub fn load(&self) -> Result<History> {
        if !self.path.exists() {
            return Ok(History::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history '{}'", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(History::default());
        }
        parse(&contents, &self.path)
    }

    pub fn save(&self, history: &History) -> Result<()> {
        write_json(&self.path, history)
    }
}

/// Topic queue file on disk. Unlike history, it must already exist.
#[derive(Debug, Clone)]
pub struct TopicStore {
    path: PathBuf,
}

impl TopicStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<TopicQueue> {
        let contents = fs::read_to_string(&self.path).with_context(|| {
            format!(
                "Failed to read topics '{}' (create it with a JSON array of {{\"topic\": ...}} objects)",
                self.path.display()
            )
        })?;
        parse(&contents, &self.path)
    }

    pub fn save(&self, queue: &TopicQueue) -> Result<()> {
        write_json(&self.path, queue)
    }
}

fn parse<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T> {
    serde_json::from_str(contents).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Write pretty JSON next to `path` and rename it into place.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).with_context(|| format!("Failed to write '{}'", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace '{}'", path.display()))?;
    Ok(())
}
