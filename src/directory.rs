use std::sync::Arc;

use crate::api::MessagingApi;
use crate::api::models::Contact;
use crate::cache::{QueryCache, QueryKey};
use crate::session::Session;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub enum DirectoryState {
    /// No user session, so nothing is requested.
    Disabled,
    Loading,
    Failed(String),
    Loaded(Arc<[Contact]>),
}

impl DirectoryState {
    pub fn from_cache(cache: &QueryCache, signed_in: bool) -> Self {
        if !signed_in {
            return DirectoryState::Disabled;
        }
        let key = QueryKey::ContactDirectory;
        if let Some(message) = cache.error(key) {
            return DirectoryState::Failed(message.to_string());
        }
        match cache.contacts() {
            Some(list) => DirectoryState::Loaded(list),
            None => DirectoryState::Loading,
        }
    }

    pub fn contacts(&self) -> Option<&[Contact]> {
        match self {
            DirectoryState::Loaded(list) => Some(&list[..]),
            _ => None,
        }
    }
}

pub async fn fetch_directory<A: MessagingApi>(api: &A, session: Option<&Session>) -> Result<Vec<Contact>> {
    let session = session.ok_or(Error::Unauthenticated)?;
    match api.contacts(session).await {
        Ok(list) => {
            log::debug!("directory loaded with {} contacts", list.len());
            Ok(list)
        }
        Err(e) => {
            log::warn!("directory fetch failed: {}", e);
            Err(e)
        }
    }
}
