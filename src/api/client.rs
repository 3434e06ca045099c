use reqwest::Client as HttpClient;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::api::MessagingApi;
use crate::api::models::{ApiErrorBody, Contact, LoginRequest, LoginResponse, Message, NewMessage, UserId};
use crate::session::Session;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct ApiClient {
    pub http: HttpClient,
}

impl ApiClient {
    pub fn new() -> Self {
        Self { http: HttpClient::new() }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn base_api(base_url: &str) -> String {
        let trimmed = base_url.trim_end_matches('/');
        if trimmed.ends_with("/api") { trimmed.to_string() } else { format!("{}/api", trimmed) }
    }

    fn with_auth(req: RequestBuilder, session: &Session) -> RequestBuilder {
        req.bearer_auth(&session.token)
    }

    /// Exchanges credentials for a bearer token and the signed-in user.
    pub async fn login(&self, base_url: &str, email: &str, password: &str) -> Result<Session> {
        let endpoint = format!("{}/auth/login", Self::base_api(base_url));
        let body = LoginRequest { email: email.trim().to_string(), password: password.to_string() };
        let resp = self.http.post(&endpoint).json(&body).send().await?;
        let login: LoginResponse = read_json(resp).await?;
        Ok(Session { base_url: base_url.trim_end_matches('/').to_string(), token: login.token, user: login.user })
    }
}

impl MessagingApi for ApiClient {
    async fn contacts(&self, session: &Session) -> Result<Vec<Contact>> {
        let endpoint = format!("{}/messages/contacts", Self::base_api(&session.base_url));
        log::debug!("GET {}", endpoint);
        let resp = Self::with_auth(self.http.get(&endpoint), session).send().await?;
        let json: Value = read_json(resp).await?;
        Ok(serde_json::from_value(unwrap_list(json, &["contacts", "data"]))?)
    }

    async fn thread(&self, session: &Session, contact_id: UserId) -> Result<Vec<Message>> {
        let endpoint = format!("{}/messages/{}", Self::base_api(&session.base_url), contact_id);
        log::debug!("GET {}", endpoint);
        let resp = Self::with_auth(self.http.get(&endpoint), session).send().await?;
        let json: Value = read_json(resp).await?;
        Ok(serde_json::from_value(unwrap_list(json, &["messages", "data"]))?)
    }

    async fn send_message(&self, session: &Session, message: &NewMessage) -> Result<Message> {
        let endpoint = format!("{}/messages", Self::base_api(&session.base_url));
        log::debug!("POST {} receiver={}", endpoint, message.receiver_id);
        let resp = Self::with_auth(self.http.post(&endpoint).json(message), session).send().await?;
        let json: Value = read_json(resp).await?;
        let created = match json.get("data") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => json,
        };
        Ok(serde_json::from_value(created)?)
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if !status.is_success() {
        let body: ApiErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        let message = body.message.or(body.error).filter(|m| !m.trim().is_empty());
        return Err(Error::Api { status: status.as_u16(), message });
    }
    Ok(serde_json::from_slice(&bytes)?)
}

// Accept both a bare array and an envelope such as {"data": [...]}.
fn unwrap_list(json: Value, keys: &[&str]) -> Value {
    if json.is_array() {
        return json;
    }
    for key in keys {
        if let Some(arr) = json.get(*key).filter(|v| v.is_array()) {
            return arr.clone();
        }
    }
    json
}
