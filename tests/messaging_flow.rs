use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use tradehub::api::MessagingApi;
use tradehub::api::models::{Contact, CurrentUser, LastMessage, Message, NewMessage, UserId};
use tradehub::cache::QueryKey;
use tradehub::composer::{SubmitOutcome, SEND_FAILED};
use tradehub::directory::DirectoryState;
use tradehub::page::MessagesPage;
use tradehub::selection::Route;
use tradehub::session::{Session, SessionHandle};
use tradehub::{Error, Result};

const ME: UserId = 100;

#[derive(Default)]
struct FakeBackend {
    contacts: Mutex<Vec<Contact>>,
    threads: Mutex<HashMap<UserId, Vec<Message>>>,
    sent: Mutex<Vec<NewMessage>>,
    reject_send: Mutex<Option<(u16, Option<String>)>>,
    contact_calls: AtomicUsize,
    thread_calls: AtomicUsize,
    send_calls: AtomicUsize,
}

impl FakeBackend {
    fn with_contacts(contacts: Vec<Contact>) -> Self {
        let backend = Self::default();
        *backend.contacts.lock().unwrap() = contacts;
        backend
    }
}

impl MessagingApi for FakeBackend {
    async fn contacts(&self, _session: &Session) -> Result<Vec<Contact>> {
        self.contact_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.contacts.lock().unwrap().clone())
    }

    async fn thread(&self, _session: &Session, contact_id: UserId) -> Result<Vec<Message>> {
        self.thread_calls.fetch_add(1, Ordering::SeqCst);
        let mut threads = self.threads.lock().unwrap();
        // Reading a thread marks it read.
        for c in self.contacts.lock().unwrap().iter_mut().filter(|c| c.id == contact_id) {
            c.unread_count = 0;
        }
        Ok(threads.entry(contact_id).or_default().clone())
    }

    async fn send_message(&self, _session: &Session, message: &NewMessage) -> Result<Message> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, text)) = self.reject_send.lock().unwrap().clone() {
            return Err(Error::Api { status, message: text });
        }
        self.sent.lock().unwrap().push(message.clone());
        let created = Message {
            id: 1000 + self.sent.lock().unwrap().len() as i64,
            sender_id: ME,
            receiver_id: message.receiver_id,
            content: message.content.clone(),
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        self.threads.lock().unwrap().entry(message.receiver_id).or_default().push(created.clone());
        for c in self.contacts.lock().unwrap().iter_mut().filter(|c| c.id == message.receiver_id) {
            c.last_message = Some(LastMessage {
                sender_id: ME,
                content: message.content.clone(),
                created_at: created.created_at,
            });
        }
        Ok(created)
    }
}

fn contact(id: UserId, name: &str, unread: u32) -> Contact {
    Contact {
        id,
        full_name: name.to_string(),
        avatar_url: None,
        tradesman_profile: None,
        last_message: None,
        unread_count: unread,
    }
}

fn signed_in() -> SessionHandle {
    SessionHandle::new(Some(Session {
        base_url: "https://m.test".into(),
        token: "t".into(),
        user: CurrentUser { id: ME, full_name: "Me".into() },
    }))
}

#[tokio::test]
async fn first_contact_is_opened_when_route_has_no_id() {
    let mut alice = contact(1, "Alice", 2);
    alice.last_message = Some(LastMessage {
        sender_id: 1,
        content: "Are you free Monday?".into(),
        created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    });
    let backend = FakeBackend::with_contacts(vec![alice, contact(2, "Bob", 0)]);
    let mut page = MessagesPage::new(signed_in(), Route::Messages);

    let nav = page.load_directory(&backend).await;
    assert_eq!(nav.map(|r| r.path()).as_deref(), Some("/messages/1"));
    assert_eq!(page.route().path(), "/messages/1");

    // Reloading the directory does not navigate again.
    page.poll();
    assert_eq!(page.load_directory(&backend).await, None);
    assert_eq!(backend.contact_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn route_with_id_is_left_alone() {
    let backend = FakeBackend::with_contacts(vec![contact(1, "Alice", 0), contact(2, "Bob", 0)]);
    let mut page = MessagesPage::new(signed_in(), Route::thread(2));
    assert_eq!(page.load_directory(&backend).await, None);
    assert_eq!(page.active_contact().map(|c| c.id), Some(2));

    let empty = FakeBackend::default();
    let mut page = MessagesPage::new(signed_in(), Route::Thread("5".into()));
    assert_eq!(page.load_directory(&empty).await, None);
    assert!(page.active_contact().is_none());
    assert_eq!(page.directory().contacts().map(|c| c.len()), Some(0));
}

#[tokio::test]
async fn stale_link_renders_no_selection() {
    let backend = FakeBackend::with_contacts(vec![contact(1, "Alice", 0)]);
    let mut page = MessagesPage::new(signed_in(), Route::thread(404));
    assert_eq!(page.load_directory(&backend).await, None);
    assert!(page.active_contact().is_none());
    assert!(!page.load_thread(&backend).await);
    assert_eq!(backend.thread_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn signed_out_page_issues_no_requests() {
    let backend = FakeBackend::with_contacts(vec![contact(1, "Alice", 0)]);
    let mut page = MessagesPage::new(SessionHandle::default(), Route::thread(1));
    assert_eq!(page.load_directory(&backend).await, None);
    assert!(matches!(page.directory(), DirectoryState::Disabled));

    page.composer_mut().unwrap().set_draft("Hello");
    match page.send(&backend).await {
        Some(SubmitOutcome::Blocked(Error::Unauthenticated)) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(page.composer().unwrap().draft(), "Hello");
    assert_eq!(backend.contact_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.send_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_send_clears_input_and_refetches() {
    let backend = FakeBackend::with_contacts(vec![contact(42, "Quinn Plumbing", 0)]);
    let mut page = MessagesPage::new(signed_in(), Route::Thread("42".into()));
    page.load_directory(&backend).await;
    assert!(page.load_thread(&backend).await);
    assert_eq!(page.active_thread().map(|t| t.len()), Some(0));

    page.composer_mut().unwrap().set_draft("Hello");
    match page.send(&backend).await {
        Some(SubmitOutcome::Sent { invalidate, .. }) => {
            assert_eq!(invalidate, [QueryKey::Thread(42), QueryKey::ContactDirectory]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        backend.sent.lock().unwrap().as_slice(),
        &[NewMessage { receiver_id: 42, content: "Hello".into() }]
    );
    assert_eq!(page.composer().unwrap().draft(), "");
    assert!(page.cache().is_stale(QueryKey::Thread(42)));
    assert!(page.cache().is_stale(QueryKey::ContactDirectory));

    page.load_directory(&backend).await;
    page.load_thread(&backend).await;
    assert_eq!(backend.contact_calls.load(Ordering::SeqCst), 2);
    assert_eq!(backend.thread_calls.load(Ordering::SeqCst), 2);
    assert_eq!(page.active_thread().map(|t| t.len()), Some(1));
    let preview = page.active_contact().and_then(|c| c.preview(ME, 40));
    assert_eq!(preview.as_deref(), Some("You: Hello"));
}

#[tokio::test]
async fn failed_send_keeps_input_and_notifies() {
    let backend = FakeBackend::with_contacts(vec![contact(42, "Quinn", 0)]);
    *backend.reject_send.lock().unwrap() = Some((403, Some("You cannot message this user".into())));
    let mut page = MessagesPage::new(signed_in(), Route::thread(42));
    page.load_directory(&backend).await;

    page.composer_mut().unwrap().set_draft("Hello");
    match page.send(&backend).await {
        Some(SubmitOutcome::Failed { notification }) => assert_eq!(notification, "You cannot message this user"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(page.composer().unwrap().draft(), "Hello");
    assert!(!page.cache().is_stale(QueryKey::ContactDirectory));

    *backend.reject_send.lock().unwrap() = Some((502, None));
    match page.send(&backend).await {
        Some(SubmitOutcome::Failed { notification }) => assert_eq!(notification, SEND_FAILED),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(backend.send_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_drafts_never_reach_the_server() {
    let backend = FakeBackend::with_contacts(vec![contact(42, "Quinn", 0)]);
    let mut page = MessagesPage::new(signed_in(), Route::thread(42));
    page.load_directory(&backend).await;

    let too_long = "x".repeat(1001);
    let padded = format!(" {}", "x".repeat(1000));
    for draft in ["", "   \n\t", too_long.as_str(), padded.as_str()] {
        page.composer_mut().unwrap().set_draft(draft);
        assert!(!page.composer().unwrap().can_submit());
        match page.send(&backend).await {
            Some(SubmitOutcome::Blocked(Error::Validation(_))) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
    assert_eq!(backend.send_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn opening_unread_thread_refreshes_badge() {
    let backend = FakeBackend::with_contacts(vec![contact(1, "Alice", 3)]);
    let mut page = MessagesPage::new(signed_in(), Route::Messages);
    page.load_directory(&backend).await;
    assert_eq!(page.active_contact().map(|c| c.unread_count), Some(3));

    assert!(page.load_thread(&backend).await);
    assert!(page.cache().is_stale(QueryKey::ContactDirectory));
    page.load_directory(&backend).await;
    assert_eq!(page.active_contact().map(|c| c.unread_count), Some(0));
}

#[tokio::test]
async fn explicit_choice_survives_later_directory_loads() {
    let backend = FakeBackend::with_contacts(vec![contact(1, "Alice", 0), contact(2, "Bob", 0)]);
    let mut page = MessagesPage::new(signed_in(), Route::Messages);
    page.navigate(Route::thread(2), true);
    page.navigate(Route::Messages, false);

    backend.contacts.lock().unwrap().insert(0, contact(3, "Cara", 1));
    assert_eq!(page.load_directory(&backend).await, None);
    assert_eq!(page.route(), &Route::Messages);
}
