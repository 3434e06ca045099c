pub mod client;
pub mod models;

use std::future::Future;

use crate::Result;
use crate::session::Session;
use models::{Contact, Message, NewMessage, UserId};

/// Request/response contract of the messaging backend.
pub trait MessagingApi {
    fn contacts(&self, session: &Session) -> impl Future<Output = Result<Vec<Contact>>> + Send;

    fn thread(
        &self,
        session: &Session,
        contact_id: UserId,
    ) -> impl Future<Output = Result<Vec<Message>>> + Send;

    fn send_message(
        &self,
        session: &Session,
        message: &NewMessage,
    ) -> impl Future<Output = Result<Message>> + Send;
}
