use crate::error::CacheError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;

/// Conventional priority levels. Any `i32` is accepted; lower values are evicted first.
pub mod priority {
    pub const LOW: i32 = 1;
    pub const NORMAL: i32 = 5;
    pub const HIGH: i32 = 8;
    /// Reserved for entries that must outlive everything else in their namespace.
    pub const CRITICAL: i32 = 10;
}

/// A stored value and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
    pub tags: BTreeSet<String>,
    pub priority: i32,
    /// Monotonic insertion counter; older entries have smaller values.
    pub(crate) sequence: u64,
}

impl CacheEntry {
    /// When the entry stops being served by `get`. `None` means never.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = chrono::Duration::from_std(self.ttl).ok()?;
        self.created_at.checked_add_signed(ttl)
    }

    /// Expired once `now > created_at + ttl`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|deadline| now > deadline)
    }

    /// Age at `now`; zero if the clock went backwards.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or_default()
    }

    /// Approximate footprint: key bytes plus serialized value bytes.
    pub fn memory_usage(&self) -> usize {
        self.key.len() + self.value.to_string().len()
    }
}

/// Per-write metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Falls back to the store's configured TTL when unset.
    pub ttl: Option<Duration>,
    pub tags: BTreeSet<String>,
    pub priority: i32,
}

impl EntryOptions {
    pub fn new() -> Self {
        Self {
            priority: priority::NORMAL,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Criteria for `CacheStore::invalidate`. An entry is removed if it matches ANY
/// supplied criterion; with no criteria at all the whole namespace is cleared.
#[derive(Debug, Clone, Default)]
pub struct Invalidation {
    tags: BTreeSet<String>,
    key_pattern: Option<Regex>,
    max_age: Option<Duration>,
}

impl Invalidation {
    /// Matches every entry.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().with_tags(tags)
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Adds a regular expression matched against entry keys.
    pub fn with_key_pattern(mut self, pattern: &str) -> Result<Self, CacheError> {
        self.key_pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Matches entries strictly older than `max_age`.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.key_pattern.is_none() && self.max_age.is_none()
    }

    pub(crate) fn matches(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        if self.is_empty() {
            return true;
        }
        let tag_hit = entry.tags.iter().any(|tag| self.tags.contains(tag));
        let key_hit = self
            .key_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(&entry.key));
        let age_hit = self.max_age.is_some_and(|max| entry.age(now) > max);
        tag_hit || key_hit || age_hit
    }
}
