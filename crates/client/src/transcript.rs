//! Local transcript of a chat surface
//!
//! Holds server-confirmed messages plus optimistic entries that have not
//! been confirmed yet. Reconciliation never matches by id: a confirmed
//! message replaces the last pending entry of the same role, else it is
//! appended.

use crate::transport::{ChatMessage, Role};

/// Confirmation status of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Shown optimistically, waiting for the server
    Pending,
    /// Authoritative server record
    Confirmed,
    /// The turn carrying this entry failed
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub body: String,
    pub status: EntryStatus,
    /// Server record, once confirmed
    pub message: Option<ChatMessage>,
}

impl TranscriptEntry {
    fn optimistic(body: String) -> Self {
        Self {
            role: Role::User,
            body,
            status: EntryStatus::Pending,
            message: None,
        }
    }

    fn confirmed(message: ChatMessage) -> Self {
        Self {
            role: message.author_role,
            body: message.body.clone(),
            status: EntryStatus::Confirmed,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with server history, kept in the order given
    pub fn hydrate(&mut self, messages: Vec<ChatMessage>) {
        self.entries = messages.into_iter().map(TranscriptEntry::confirmed).collect();
    }

    /// Add a user entry not yet known to the server. Returns its index.
    pub fn push_optimistic(&mut self, body: impl Into<String>) -> usize {
        self.entries.push(TranscriptEntry::optimistic(body.into()));
        self.entries.len() - 1
    }

    /// Merge a confirmed message into the transcript
    pub fn reconcile(&mut self, message: ChatMessage) {
        if self.contains(&message) {
            return;
        }

        let slot = self
            .entries
            .iter()
            .rposition(|e| e.status == EntryStatus::Pending && e.role == message.author_role);

        match slot {
            Some(index) => self.entries[index] = TranscriptEntry::confirmed(message),
            None => self.entries.push(TranscriptEntry::confirmed(message)),
        }
    }

    /// Mark the last pending entry as failed. Returns its index.
    pub fn fail_pending(&mut self) -> Option<usize> {
        let index = self
            .entries
            .iter()
            .rposition(|e| e.status == EntryStatus::Pending)?;
        self.entries[index].status = EntryStatus::Failed;
        Some(index)
    }

    /// Remove the most recent failed entry and return its text
    pub fn take_last_failed(&mut self) -> Option<String> {
        let index = self
            .entries
            .iter()
            .rposition(|e| e.status == EntryStatus::Failed)?;
        Some(self.entries.remove(index).body)
    }

    pub fn last_failed(&self) -> Option<&TranscriptEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.status == EntryStatus::Failed)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains(&self, message: &ChatMessage) -> bool {
        self.entries
            .iter()
            .filter_map(|e| e.message.as_ref())
            .any(|m| m.id == message.id)
    }
}
