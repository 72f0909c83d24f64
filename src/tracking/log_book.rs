use std::collections::HashSet;

use crate::api::status::LogEntry;

/// The log lines seen during one generation run.
///
/// Entries are identified by their message text alone, so a line the server
/// repeats (even with a different timestamp) is only ever absorbed once.
#[derive(Debug, Clone, Default)]
pub struct LogBook {
    entries: Vec<LogEntry>,
    seen: HashSet<String>,
}

impl LogBook {
    pub fn new() -> Self {
        LogBook::default()
    }

    /// Appends the unseen entries of `batch` and returns them in server order.
    pub fn absorb(&mut self, batch: Vec<LogEntry>) -> Vec<LogEntry> {
        let mut fresh = Vec::new();
        for mut entry in batch {
            if !self.seen.insert(entry.message.clone()) {
                continue;
            }
            if entry.timestamp.is_none() {
                entry.timestamp = Some(crate::timestamp());
            }
            self.entries.push(entry.clone());
            fresh.push(entry);
        }
        fresh
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
