//! Search history records and the in-session display window.
//!
//! Entries are append-only in the remote store. The session only ever shows
//! the ten most recent entries it has observed, oldest first; the cap limits
//! what is displayed and never truncates the store.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Budget, CityName, SearchCriteria};

/// Maximum number of entries surfaced per session.
pub const HISTORY_DISPLAY_CAP: usize = 10;

/// Whether a pipeline run should append a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    /// Fresh search submitted from the form.
    Record,
    /// Replay of an existing entry; recording it again would duplicate it.
    Skip,
}

/// Store-assigned key for one entry. Keys sort chronologically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntryId(String);

impl HistoryEntryId {
    /// Wrap a store key.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl AsRef<str> for HistoryEntryId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for HistoryEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Search parameters to be appended under an identity's namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub city: CityName,
    pub postal_code: Option<String>,
    pub budget_per_person: Budget,
    pub owner_email: String,
    pub recorded_at: DateTime<Utc>,
}

impl NewHistoryEntry {
    /// Capture the criteria of a search for the given owner.
    pub fn from_criteria(
        criteria: &SearchCriteria,
        owner_email: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            city: criteria.city.clone(),
            postal_code: criteria.postal_code.clone(),
            budget_per_person: criteria.budget_per_person,
            owner_email: owner_email.into(),
            recorded_at,
        }
    }

    /// Attach the key the store assigned on append.
    pub fn into_entry(self, id: HistoryEntryId) -> HistoryEntry {
        HistoryEntry {
            id,
            city: self.city,
            postal_code: self.postal_code,
            budget_per_person: self.budget_per_person,
            owner_email: self.owner_email,
            recorded_at: Some(self.recorded_at),
        }
    }
}

/// One persisted past search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    pub city: CityName,
    pub postal_code: Option<String>,
    pub budget_per_person: Budget,
    pub owner_email: String,
    /// Missing on entries written before timestamps were recorded.
    pub recorded_at: Option<DateTime<Utc>>,
}

impl HistoryEntry {
    /// Criteria to replay this search with.
    pub fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            budget_per_person: self.budget_per_person,
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
        }
    }
}

/// Result of offering an entry to the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedChange {
    /// Entry is now displayed; `evicted` left the window to make room.
    Added {
        entry: HistoryEntry,
        evicted: Option<HistoryEntry>,
    },
    /// Entry was already displayed or had been seen this session.
    Ignored,
}

/// Bounded, oldest-first window over the history observed this session.
#[derive(Debug, Clone, Default)]
pub struct HistoryFeed {
    entries: VecDeque<HistoryEntry>,
    last_seen: Option<HistoryEntryId>,
}

impl HistoryFeed {
    /// Empty feed, as after a session reset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an entry in arrival order.
    ///
    /// Entries whose key does not sort after the newest key already observed
    /// are ignored, so a reload overlapping a local echo never duplicates.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use welp_backend::domain::{
    ///     Budget, CityName, FeedChange, HistoryEntryId, HistoryFeed, NewHistoryEntry,
    /// };
    ///
    /// let entry = NewHistoryEntry {
    ///     city: CityName::normalize("austin").expect("valid city"),
    ///     postal_code: None,
    ///     budget_per_person: Budget::new(15.0).expect("valid budget"),
    ///     owner_email: "ada@example.com".into(),
    ///     recorded_at: Utc::now(),
    /// }
    /// .into_entry(HistoryEntryId::new("-a"));
    /// let mut feed = HistoryFeed::new();
    /// assert!(matches!(feed.push(entry.clone()), FeedChange::Added { .. }));
    /// assert_eq!(feed.push(entry), FeedChange::Ignored);
    /// ```
    pub fn push(&mut self, entry: HistoryEntry) -> FeedChange {
        if self
            .last_seen
            .as_ref()
            .is_some_and(|newest| entry.id <= *newest)
        {
            return FeedChange::Ignored;
        }
        self.last_seen = Some(entry.id.clone());
        let evicted = if self.entries.len() >= HISTORY_DISPLAY_CAP {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry.clone());
        FeedChange::Added { entry, evicted }
    }

    /// Displayed entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Number of displayed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is displayed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a displayed entry for replay.
    pub fn find(&self, id: &HistoryEntryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == *id)
    }
}
