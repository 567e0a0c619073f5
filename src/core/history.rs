//! Session history.
//!
//! Records what happened during one session: completion requests, failures,
//! phase transitions, resets and file operations. The log lives in memory
//! only. It survives a wizard reset and is never written to a project file.

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::wizard::Phase;

/// Default number of entries kept before the oldest are dropped.
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Something that happened during the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// A completion request was sent for a phase
    Requested { phase: Phase },
    /// The reply decoded into the phase's schema
    Succeeded { phase: Phase, strategy: &'static str },
    /// The request or its decoding failed
    Failed { phase: Phase, error: String },
    /// A forward transition
    Advanced { from: Phase, to: Phase },
    /// The stored outcome of a phase was discarded for a retry
    Discarded { phase: Phase },
    /// All phase data was cleared
    Reset { from: Phase },
    /// The project was written to a file
    Saved { path: PathBuf },
    /// The project was loaded from a file
    Restored { phase: Phase },
}

impl fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested { phase } => write!(f, "{phase}: request sent"),
            Self::Succeeded { phase, strategy } => write!(f, "{phase}: response accepted ({strategy})"),
            Self::Failed { phase, error } => write!(f, "{phase}: failed - {error}"),
            Self::Advanced { from, to } => write!(f, "{from} -> {to}"),
            Self::Discarded { phase } => write!(f, "{phase}: result discarded"),
            Self::Reset { from } => write!(f, "reset from {from}"),
            Self::Saved { path } => write!(f, "saved to {}", path.display()),
            Self::Restored { phase } => write!(f, "restored at {phase}"),
        }
    }
}

/// A single timestamped history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub event: HistoryEvent,
}

/// In-memory session log.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: VecDeque<HistoryEntry>,
    max_entries: usize,
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl SessionHistory {
    /// Create a log keeping at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self { entries: VecDeque::new(), max_entries: max_entries.max(1) }
    }

    /// Append an event, dropping the oldest entry when full.
    pub fn record(&mut self, event: HistoryEvent) {
        if self.entries.len() == self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry { at: Utc::now(), event });
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of failed requests recorded for a phase.
    pub fn failures(&self, phase: Phase) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(&e.event, HistoryEvent::Failed { phase: p, .. } if *p == phase))
            .count()
    }
}
