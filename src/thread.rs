use crate::api::MessagingApi;
use crate::api::models::{Message, UserId};
use crate::session::Session;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

pub fn direction(message: &Message, me: UserId) -> Direction {
    if message.sender_id == me { Direction::Outgoing } else { Direction::Incoming }
}

/// Oldest first. Messages with equal timestamps keep server order.
pub fn order_thread(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by_key(|m| m.created_at);
    messages
}

pub async fn fetch_thread<A: MessagingApi>(
    api: &A,
    session: Option<&Session>,
    contact_id: UserId,
) -> Result<Vec<Message>> {
    let session = session.ok_or(Error::Unauthenticated)?;
    let messages = api.thread(session, contact_id).await?;
    log::debug!("thread {} loaded with {} messages", contact_id, messages.len());
    Ok(order_thread(messages))
}
