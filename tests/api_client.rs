use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tradehub::api::client::ApiClient;
use tradehub::api::models::{CurrentUser, NewMessage};
use tradehub::api::MessagingApi;
use tradehub::directory::fetch_directory;
use tradehub::session::Session;
use tradehub::thread::fetch_thread;
use tradehub::Error;

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("Bearer secret") => Ok(()),
        Some("Bearer explode") => Err(StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        _ => Err((StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()),
    }
}

async fn contacts(headers: HeaderMap) -> Response {
    if let Err(resp) = authorized(&headers) {
        return resp;
    }
    Json(json!([
        {
            "id": 1,
            "fullName": "Alice",
            "unreadCount": 2,
            "lastMessage": { "senderId": 1, "content": "Hi there", "createdAt": "2024-05-01T10:00:00Z" }
        },
        {
            "id": 2,
            "fullName": "Bob Stone",
            "avatarUrl": "https://cdn.test/bob.png",
            "tradesmanProfile": { "businessName": "Stone Masonry" },
            "unreadCount": 0
        }
    ]))
    .into_response()
}

async fn thread(headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(resp) = authorized(&headers) {
        return resp;
    }
    Json(json!({
        "data": [
            { "id": 11, "senderId": 99, "receiverId": id, "content": "second", "createdAt": "2024-05-01T10:05:00Z" },
            { "id": 10, "senderId": id, "receiverId": 99, "content": "first", "createdAt": "2024-05-01T10:00:00Z" }
        ]
    }))
    .into_response()
}

async fn send(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(resp) = authorized(&headers) {
        return resp;
    }
    if body["content"] == "blocked" {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "message": "Receiver blocked you" }))).into_response();
    }
    let created = json!({
        "id": 500,
        "senderId": 99,
        "receiverId": body["receiverId"],
        "content": body["content"],
        "createdAt": "2024-05-01T11:00:00Z"
    });
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "hunter2" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" }))).into_response();
    }
    Json(json!({ "token": "secret", "user": { "id": 99, "fullName": "Dana" } })).into_response()
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/messages/contacts", get(contacts))
        .route("/api/messages/:id", get(thread))
        .route("/api/messages", post(send));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn session(base_url: &str, token: &str) -> Session {
    Session {
        base_url: base_url.to_string(),
        token: token.to_string(),
        user: CurrentUser { id: 99, full_name: "Dana".into() },
    }
}

#[tokio::test]
async fn login_returns_session() {
    let base = spawn_server().await;
    let client = ApiClient::new();
    let signed_in = client.login(&format!("{}/", base), " dana@example.com ", "hunter2").await.unwrap();
    assert_eq!(signed_in.token, "secret");
    assert_eq!(signed_in.user.id, 99);
    assert_eq!(signed_in.base_url, base);

    let err = client.login(&base, "dana@example.com", "wrong").await.unwrap_err();
    assert!(err.is_unauthenticated());
    assert_eq!(err.user_message(), "Invalid credentials");
}

#[tokio::test]
async fn contacts_are_decoded_in_server_order() {
    let base = spawn_server().await;
    let client = ApiClient::new();
    let list = fetch_directory(&client, Some(&session(&base, "secret"))).await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].display_name(), "Alice");
    assert_eq!(list[0].unread_count, 2);
    assert_eq!(list[1].display_name(), "Stone Masonry");
    assert_eq!(list[1].avatar_url.as_deref(), Some("https://cdn.test/bob.png"));
}

#[tokio::test]
async fn server_errors_become_api_errors() {
    let base = spawn_server().await;
    let client = ApiClient::new();

    match client.contacts(&session(&base, "nope")).await {
        Err(Error::Api { status: 401, message }) => assert_eq!(message.as_deref(), Some("Unauthorized")),
        other => panic!("unexpected {:?}", other),
    }
    match client.contacts(&session(&base, "explode")).await {
        Err(Error::Api { status: 500, message: None }) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = ApiClient::new();
    let err = client.contacts(&session("http://127.0.0.1:9", "secret")).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(err.user_message(), "Could not reach the server.");
}

#[tokio::test]
async fn thread_is_unwrapped_and_ordered() {
    let base = spawn_server().await;
    let client = ApiClient::new();
    let messages = fetch_thread(&client, Some(&session(&base, "secret")), 7).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second"]);
    assert!(messages.iter().all(|m| m.sender_id == 7 || m.receiver_id == 7));
}

#[tokio::test]
async fn send_message_posts_camel_case_body() {
    let base = spawn_server().await;
    let client = ApiClient::new();
    let s = session(&base, "secret");

    let created = client
        .send_message(&s, &NewMessage { receiver_id: 42, content: "Hello".into() })
        .await
        .unwrap();
    assert_eq!(created.receiver_id, 42);
    assert_eq!(created.content, "Hello");

    let err = client
        .send_message(&s, &NewMessage { receiver_id: 42, content: "blocked".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { status: 422, .. }));
    assert_eq!(err.user_message(), "Receiver blocked you");
}

#[tokio::test]
async fn missing_session_skips_the_network() {
    let client = ApiClient::new();
    assert!(matches!(fetch_directory(&client, None).await, Err(Error::Unauthenticated)));
    assert!(matches!(fetch_thread(&client, None, 1).await, Err(Error::Unauthenticated)));
}
