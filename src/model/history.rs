use super::RtmlUrl;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// 3.1a audit trail of agents that handled the document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn add_entry(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn clear_entries(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HistoryEntry {
    pub time_stamp: Option<DateTime<FixedOffset>>,
    pub agent: Option<HistoryAgent>,
    pub description: Option<String>,
    pub error: Option<String>,
    pub rejection_reason: Option<String>,
    pub rejection_description: Option<String>,
}

impl HistoryEntry {
    pub fn is_rejection(&self) -> bool {
        self.rejection_reason.is_some() || self.rejection_description.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HistoryAgent {
    pub name: Option<String>,
    pub uri: Option<RtmlUrl>,
    pub description: Option<String>,
}
