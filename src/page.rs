//! State behind the messages screen: directory, selection, thread and composer
//! over one query cache.
//!
//! Fetches are split in two halves so the GTK shell can run the request on
//! the tokio runtime: `start_*` hands out a ticket, `complete_*` applies the
//! result on the main loop. The `load_*` helpers run both halves in place.

use std::collections::HashMap;
use std::sync::Arc;

use crate::api::MessagingApi;
use crate::api::models::{Contact, Message, NewMessage, UserId};
use crate::cache::{FetchTicket, QueryCache, QueryData, QueryKey};
use crate::composer::{Composer, SubmitOutcome};
use crate::directory::{fetch_directory, DirectoryState};
use crate::selection::{ContactSelector, Route};
use crate::session::{Session, SessionHandle};
use crate::thread::fetch_thread;
use crate::Result;

pub struct MessagesPage {
    session: SessionHandle,
    cache: QueryCache,
    selector: ContactSelector,
    // Keyed by route id. Entries with a draft or a send in flight outlive navigation.
    composers: HashMap<String, Composer>,
    snapshot: Option<Arc<[Contact]>>,
}

impl MessagesPage {
    pub fn new(session: SessionHandle, route: Route) -> Self {
        let composers = route
            .contact_id()
            .map(|id| (id.to_string(), Composer::new(id)))
            .into_iter()
            .collect();
        Self {
            session,
            cache: QueryCache::new(),
            selector: ContactSelector::new(route),
            composers,
            snapshot: None,
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn route(&self) -> &Route {
        self.selector.route()
    }

    /// Contacts from a previous run, displayed until the first fetch lands.
    pub fn set_snapshot(&mut self, contacts: Vec<Contact>) {
        if !contacts.is_empty() {
            self.snapshot = Some(contacts.into());
        }
    }

    pub fn directory(&self) -> DirectoryState {
        match DirectoryState::from_cache(&self.cache, self.session.is_signed_in()) {
            DirectoryState::Loading => match &self.snapshot {
                Some(list) => DirectoryState::Loaded(list.clone()),
                None => DirectoryState::Loading,
            },
            state => state,
        }
    }

    pub fn active_contact(&self) -> Option<Contact> {
        let list = self.cache.contacts()?;
        self.selector.active(&list).cloned()
    }

    pub fn active_thread(&self) -> Option<Arc<[Message]>> {
        self.cache.thread(self.active_contact()?.id)
    }

    pub fn navigate(&mut self, route: Route, explicit: bool) {
        self.selector.navigate(route, explicit);
        let target = self.selector.contact_id().map(str::to_string);
        self.composers
            .retain(|id, c| c.is_in_flight() || !c.draft().is_empty() || target.as_ref() == Some(id));
        if let Some(id) = target {
            self.composers.entry(id.clone()).or_insert_with(|| Composer::new(id));
        }
    }

    pub fn start_directory_fetch(&mut self) -> Option<FetchTicket> {
        let key = QueryKey::ContactDirectory;
        if !self.session.is_signed_in() || !self.cache.needs_fetch(key) {
            return None;
        }
        Some(self.cache.begin_fetch(key))
    }

    /// Applies a directory result and returns where to auto-navigate, if anywhere.
    pub fn complete_directory_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<Contact>>) -> Option<Route> {
        let accepted = self.cache.complete(
            ticket,
            result.map(|list| QueryData::Contacts(list.into())).map_err(|e| e.user_message()),
        );
        if !accepted {
            return None;
        }
        let list = self.cache.contacts()?;
        if self.cache.error(QueryKey::ContactDirectory).is_some() {
            return None;
        }
        let route = self.selector.observe_directory(&list)?;
        self.navigate(route.clone(), false);
        Some(route)
    }

    pub fn start_thread_fetch(&mut self) -> Option<(FetchTicket, UserId)> {
        let contact = self.active_contact()?;
        let key = QueryKey::Thread(contact.id);
        if !self.session.is_signed_in() || !self.cache.needs_fetch(key) {
            return None;
        }
        Some((self.cache.begin_fetch(key), contact.id))
    }

    pub fn complete_thread_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<Message>>) -> bool {
        let loaded = result.is_ok();
        let accepted = self.cache.complete(
            ticket,
            result.map(|list| QueryData::Thread(list.into())).map_err(|e| e.user_message()),
        );
        // Opening a thread marks it read on the server; refresh the badge.
        if accepted && loaded {
            let unread = self
                .active_contact()
                .filter(|c| QueryKey::Thread(c.id) == ticket.key)
                .is_some_and(|c| c.unread_count > 0);
            if unread {
                self.cache.invalidate(QueryKey::ContactDirectory);
            }
        }
        accepted
    }

    /// Composer of the contact in the route.
    pub fn composer(&self) -> Option<&Composer> {
        self.composers.get(self.selector.contact_id()?)
    }

    pub fn composer_mut(&mut self) -> Option<&mut Composer> {
        let id = self.selector.contact_id()?;
        self.composers.get_mut(id)
    }

    /// Starts a send from the active composer. The body carries the receiver
    /// that `finish_send` must be given back.
    pub fn begin_send(&mut self) -> Option<Result<NewMessage>> {
        let session = self.session.current();
        let composer = self.composer_mut()?;
        Some(composer.begin_submit(session.as_ref()))
    }

    /// Applies the result of the send to `receiver`, whichever contact is
    /// open now. Returns `None` when no composer is waiting on that receiver.
    pub fn finish_send(&mut self, receiver: UserId, result: Result<Message>) -> Option<SubmitOutcome> {
        let waiting = self
            .composers
            .values_mut()
            .find(|c| c.pending_receiver() == Some(receiver));
        let Some(composer) = waiting else {
            if result.is_ok() {
                self.cache
                    .invalidate_all(&[QueryKey::Thread(receiver), QueryKey::ContactDirectory]);
            }
            return None;
        };
        let outcome = composer.finish_submit(result);
        if let SubmitOutcome::Sent { invalidate, .. } = &outcome {
            self.cache.invalidate_all(invalidate);
        }
        Some(outcome)
    }

    /// Periodic refresh: marks the open thread stale, and the directory too
    /// unless its last fetch failed.
    pub fn poll(&mut self) {
        if self.cache.error(QueryKey::ContactDirectory).is_none() {
            self.cache.invalidate(QueryKey::ContactDirectory);
        }
        if let Some(contact) = self.active_contact() {
            self.cache.invalidate(QueryKey::Thread(contact.id));
        }
    }

    /// User-requested refresh. Also retries a failed directory.
    pub fn reload(&mut self) {
        self.cache.invalidate(QueryKey::ContactDirectory);
        if let Some(contact) = self.active_contact() {
            self.cache.invalidate(QueryKey::Thread(contact.id));
        }
    }

    pub async fn load_directory<A: MessagingApi>(&mut self, api: &A) -> Option<Route> {
        let ticket = self.start_directory_fetch()?;
        let session = self.session.current();
        let result = fetch_directory(api, session.as_ref()).await;
        self.complete_directory_fetch(ticket, result)
    }

    pub async fn load_thread<A: MessagingApi>(&mut self, api: &A) -> bool {
        let Some((ticket, contact_id)) = self.start_thread_fetch() else {
            return false;
        };
        let session = self.session.current();
        let result = fetch_thread(api, session.as_ref(), contact_id).await;
        self.complete_thread_fetch(ticket, result)
    }

    pub async fn send<A: MessagingApi>(&mut self, api: &A) -> Option<SubmitOutcome> {
        let session = self.session.current();
        let id = self.selector.contact_id()?;
        let composer = self.composers.get_mut(id)?;
        Some(composer.submit(api, session.as_ref(), &mut self.cache).await)
    }
}
