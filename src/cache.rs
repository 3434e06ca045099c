//! Client-side copies of server query results.
//!
//! Entries are keyed by logical resource. Nothing outside a fetch may put data
//! into the cache: results only enter through [`QueryCache::complete`] with
//! the ticket handed out by [`QueryCache::begin_fetch`], and writers can only
//! mark keys stale with [`QueryCache::invalidate`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::api::models::{Contact, Message, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    ContactDirectory,
    Thread(UserId),
}

#[derive(Debug, Clone)]
pub enum QueryData {
    Contacts(Arc<[Contact]>),
    Thread(Arc<[Message]>),
}

/// Proof that a fetch was started. Results carrying an outdated ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: QueryKey,
    generation: u64,
}

#[derive(Debug, Default)]
struct Entry {
    data: Option<QueryData>,
    error: Option<String>,
    stale: bool,
    in_flight: bool,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, Entry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the next read of `key` has to go to the server.
    pub fn needs_fetch(&self, key: QueryKey) -> bool {
        match self.entries.get(&key) {
            None => true,
            Some(e) if e.in_flight => false,
            Some(e) => e.stale || (e.data.is_none() && e.error.is_none()),
        }
    }

    pub fn begin_fetch(&mut self, key: QueryKey) -> FetchTicket {
        let entry = self.entries.entry(key).or_default();
        entry.generation += 1;
        entry.in_flight = true;
        log::debug!("fetch {:?} #{}", key, entry.generation);
        FetchTicket { key, generation: entry.generation }
    }

    /// Stores a fetch result. Returns false when the ticket was superseded by a
    /// newer fetch or an invalidation, in which case the result is discarded.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<QueryData, String>) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            return false;
        };
        if entry.generation != ticket.generation {
            log::debug!("dropping superseded result for {:?}", ticket.key);
            return false;
        }
        entry.in_flight = false;
        entry.stale = false;
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
            }
            Err(message) => entry.error = Some(message),
        }
        true
    }

    pub fn invalidate(&mut self, key: QueryKey) {
        if let Some(entry) = self.entries.get_mut(&key) {
            log::debug!("invalidate {:?}", key);
            entry.stale = true;
            entry.in_flight = false;
            entry.generation += 1;
        }
    }

    pub fn invalidate_all(&mut self, keys: &[QueryKey]) {
        for key in keys {
            self.invalidate(*key);
        }
    }

    pub fn is_loading(&self, key: QueryKey) -> bool {
        self.entries.get(&key).is_some_and(|e| e.in_flight)
    }

    pub fn is_stale(&self, key: QueryKey) -> bool {
        self.entries.get(&key).is_some_and(|e| e.stale)
    }

    pub fn error(&self, key: QueryKey) -> Option<&str> {
        self.entries.get(&key).and_then(|e| e.error.as_deref())
    }

    pub fn contacts(&self) -> Option<Arc<[Contact]>> {
        match self.entries.get(&QueryKey::ContactDirectory)?.data.as_ref()? {
            QueryData::Contacts(list) => Some(list.clone()),
            QueryData::Thread(_) => None,
        }
    }

    pub fn thread(&self, contact_id: UserId) -> Option<Arc<[Message]>> {
        match self.entries.get(&QueryKey::Thread(contact_id))?.data.as_ref()? {
            QueryData::Thread(list) => Some(list.clone()),
            QueryData::Contacts(_) => None,
        }
    }
}
