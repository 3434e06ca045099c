use thiserror::Error;

use crate::api::MessagingApi;
use crate::api::models::{Message, NewMessage, UserId};
use crate::cache::{QueryCache, QueryKey};
use crate::session::Session;
use crate::{Error, Result};

pub const MAX_CONTENT_CHARS: usize = 1000;
pub const SEND_FAILED: &str = "Failed to send message";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("Message cannot be empty")]
    Empty,
    #[error("Message cannot be longer than 1000 characters ({len} entered)")]
    TooLong { len: usize },
}

/// Returns the trimmed content when it is sendable. Blank input is empty;
/// the length cap applies to the field as typed, whitespace included.
pub fn validate_content(content: &str) -> std::result::Result<&str, ContentError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ContentError::Empty);
    }
    let len = content.chars().count();
    if len > MAX_CONTENT_CHARS {
        return Err(ContentError::TooLong { len });
    }
    Ok(trimmed)
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Refused before any request was made.
    Blocked(Error),
    Sent { message: Message, invalidate: [QueryKey; 2] },
    Failed { notification: String },
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    receiver_id: String,
    draft: String,
    pending: Option<UserId>,
}

impl Composer {
    pub fn new(receiver_id: impl Into<String>) -> Self {
        Self { receiver_id: receiver_id.into(), draft: String::new(), pending: None }
    }

    pub fn receiver_id(&self) -> &str {
        &self.receiver_id
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn is_in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Receiver of the request currently in flight.
    pub fn pending_receiver(&self) -> Option<UserId> {
        self.pending
    }

    pub fn field_error(&self) -> Option<ContentError> {
        validate_content(&self.draft).err()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_in_flight() && self.field_error().is_none()
    }

    /// Builds the request body and marks the composer busy. Nothing is sent
    /// when this fails.
    pub fn begin_submit(&mut self, session: Option<&Session>) -> Result<NewMessage> {
        if self.is_in_flight() {
            return Err(Error::SubmitInFlight);
        }
        let content = validate_content(&self.draft)?.to_string();
        if session.is_none() {
            return Err(Error::Unauthenticated);
        }
        let receiver_id: UserId = self
            .receiver_id
            .trim()
            .parse()
            .map_err(|_| Error::InvalidReceiver(self.receiver_id.clone()))?;
        self.pending = Some(receiver_id);
        Ok(NewMessage { receiver_id, content })
    }

    pub fn finish_submit(&mut self, result: Result<Message>) -> SubmitOutcome {
        let receiver = self.pending.take();
        match result {
            Ok(message) => {
                self.draft.clear();
                let thread = receiver.unwrap_or(message.receiver_id);
                log::info!("message {} sent to {}", message.id, thread);
                SubmitOutcome::Sent {
                    message,
                    invalidate: [QueryKey::Thread(thread), QueryKey::ContactDirectory],
                }
            }
            Err(e) => {
                log::warn!("sending to {} failed: {}", self.receiver_id, e);
                let notification = match e {
                    Error::Api { message: Some(message), .. } => message,
                    _ => SEND_FAILED.to_string(),
                };
                SubmitOutcome::Failed { notification }
            }
        }
    }

    pub async fn submit<A: MessagingApi>(
        &mut self,
        api: &A,
        session: Option<&Session>,
        cache: &mut QueryCache,
    ) -> SubmitOutcome {
        let body = match self.begin_submit(session) {
            Ok(body) => body,
            Err(e) => return SubmitOutcome::Blocked(e),
        };
        let result = match session {
            Some(session) => api.send_message(session, &body).await,
            None => Err(Error::Unauthenticated),
        };
        let outcome = self.finish_submit(result);
        if let SubmitOutcome::Sent { invalidate, .. } = &outcome {
            cache.invalidate_all(invalidate);
        }
        outcome
    }
}
