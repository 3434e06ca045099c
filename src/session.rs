use std::sync::{Arc, RwLock};

use crate::api::models::{CurrentUser, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub base_url: String,
    pub token: String,
    pub user: CurrentUser,
}

impl Session {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

/// Current-user capability handed to every view at startup.
///
/// Cloning shares the same slot, so signing out in one window is seen by all
/// readers. Readers take a snapshot with [`SessionHandle::current`].
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    pub fn new(session: Option<Session>) -> Self {
        Self { inner: Arc::new(RwLock::new(session)) }
    }

    pub fn current(&self) -> Option<Session> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }

    pub fn sign_in(&self, session: Session) {
        log::info!("signed in as user {}", session.user.id);
        self.replace(Some(session));
    }

    pub fn sign_out(&self) {
        log::info!("signed out");
        self.replace(None);
    }

    fn replace(&self, value: Option<Session>) {
        match self.inner.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}
