use friendbook::api;
use friendbook::application_impl::FakeAuthService;
use friendbook::domain_model::UserId;
use friendbook::server::Server;
use friendbook::settings::parse_settings_str;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use warp::http::StatusCode;

const FAKE_AUTH: &str = r#"
[auth]
backend = "fake"
issuer = "test.auth"
audience = "test-client"
access_ttl_secs = 300

[http]
address = "127.0.0.1:0"

[log]
filter = "info"

[store]
backend = "memory"
max_connections = 1
acquire_timeout_secs = 1
"#;

const REAL_AUTH: &str = r#"
[auth]
backend = "real"
issuer = "test.auth"
audience = "test-client"
access_ttl_secs = 300
signing_key = "api-test-signing-key"

[http]
address = "127.0.0.1:0"

[log]
filter = "info"

[store]
backend = "memory"
max_connections = 1
acquire_timeout_secs = 1
"#;

async fn server(settings: &str) -> Arc<Server> {
    let settings = parse_settings_str(settings).unwrap();
    Arc::new(Server::try_new(&settings).await.unwrap())
}

struct Account {
    id: UserId,
    bearer: String,
}

/// Drives the v1 filter in-process. Users registered through `signup` use
/// their real tokens; any other name falls back to a fake-auth identity.
struct Client {
    server: Arc<Server>,
    accounts: Mutex<HashMap<String, Account>>,
}

impl Client {
    async fn new(settings: &str) -> Self {
        Client {
            server: server(settings).await,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    async fn fake() -> Self {
        Self::new(FAKE_AUTH).await
    }

    async fn real() -> Self {
        Self::new(REAL_AUTH).await
    }

    /// Registers `username`, logs in and remembers the token.
    async fn signup(&self, username: &str) -> UserId {
        let request = warp::test::request()
            .method("POST")
            .path("/api/v1/register")
            .json(&json!({
                "email": format!("{username}@example.com"),
                "username": username,
                "password": "correct horse",
                "first_name": username,
                "last_name": "Tester",
            }));
        let (status, _) = self.send(request).await;
        assert_eq!(status, StatusCode::CREATED);

        let request = warp::test::request()
            .method("POST")
            .path("/api/v1/login")
            .json(&json!({ "username": username, "password": "correct horse" }));
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::OK);

        let id: UserId = serde_json::from_value(body["data"]["user"]["user_id"].clone()).unwrap();
        let bearer = format!("Bearer {}", body["data"]["token"].as_str().unwrap());
        self.accounts
            .lock()
            .unwrap()
            .insert(username.to_string(), Account { id, bearer });
        id
    }

    fn id(&self, username: &str) -> UserId {
        match self.accounts.lock().unwrap().get(username) {
            Some(account) => account.id,
            None => FakeAuthService::id_for(username),
        }
    }

    fn bearer(&self, username: &str) -> String {
        match self.accounts.lock().unwrap().get(username) {
            Some(account) => account.bearer.clone(),
            None => format!("Bearer {}", FakeAuthService::token_for(username)),
        }
    }

    async fn send(&self, request: warp::test::RequestBuilder) -> (StatusCode, Value) {
        let filter = api::v1::api(self.server.clone());
        let response = request.reply(&filter).await;
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        (response.status(), body)
    }

    async fn get(&self, path: &str, user: Option<&str>) -> (StatusCode, Value) {
        let mut request = warp::test::request().method("GET").path(path);
        if let Some(user) = user {
            request = request.header("authorization", self.bearer(user));
        }
        self.send(request).await
    }

    async fn post(&self, path: &str, user: &str, body: Value) -> (StatusCode, Value) {
        let request = warp::test::request()
            .method("POST")
            .path(path)
            .header("authorization", self.bearer(user))
            .json(&body);
        self.send(request).await
    }

    async fn befriend(&self, requester: &str, recipient: &str) {
        let (status, _) = self
            .post("/api/v1/friend_request", requester, json!({ "target": self.id(recipient) }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self
            .post(
                "/api/v1/friend_response",
                recipient,
                json!({ "requester": self.id(requester), "action": "accept" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

fn error_code(body: &Value) -> &str {
    assert_eq!(body["success"], false);
    body["error"]["code"].as_str().unwrap()
}

#[tokio::test]
async fn hello_needs_no_auth() {
    let client = Client::fake().await;
    let (status, body) = client.get("/api/v1/hello", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["message"], "Hello, world!");
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn friend_request_accept_flow() {
    let client = Client::real().await;
    client.signup("alice").await;
    client.signup("bob").await;

    let (status, body) = client
        .post("/api/v1/friend_request", "alice", json!({ "target": client.id("bob") }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");

    let (status, body) = client.get("/api/v1/incoming_requests", Some("bob")).await;
    assert_eq!(status, StatusCode::OK);
    let incoming = body["data"].as_array().unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0]["owner"], json!(client.id("alice")));
    assert_eq!(incoming[0]["status"], "pending");

    let (status, body) = client
        .post(
            "/api/v1/friend_response",
            "bob",
            json!({ "requester": client.id("alice"), "action": "accept" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "friend");

    for (me, other) in [("alice", "bob"), ("bob", "alice")] {
        let path = format!("/api/v1/friend_status?target={}", client.id(other));
        let (status, body) = client.get(&path, Some(me)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "friend");

        let (_, body) = client.get("/api/v1/friends", Some(me)).await;
        assert_eq!(body["data"][0]["target"], json!(client.id(other)));
    }

    let (_, body) = client.get("/api/v1/incoming_requests", Some("bob")).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn relationship_errors_map_to_status_codes() {
    let client = Client::real().await;
    client.signup("alice").await;
    client.signup("bob").await;

    let (status, body) = client
        .post("/api/v1/friend_request", "alice", json!({ "target": client.id("alice") }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "InvalidOperation");

    client
        .post("/api/v1/friend_request", "alice", json!({ "target": client.id("bob") }))
        .await;
    let (status, body) = client
        .post("/api/v1/friend_request", "bob", json!({ "target": client.id("alice") }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "Conflict");

    let (status, body) = client
        .post(
            "/api/v1/friend_response",
            "alice",
            json!({ "requester": client.id("bob"), "action": "accept" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NotFound");

    let (status, body) = client
        .post(
            "/api/v1/friend_response",
            "bob",
            json!({ "requester": client.id("alice"), "action": "poke" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "InvalidOperation");
}

#[tokio::test]
async fn block_and_decline_over_http() {
    let client = Client::real().await;
    client.signup("alice").await;
    client.signup("bob").await;
    client.signup("carol").await;

    client
        .post("/api/v1/friend_request", "alice", json!({ "target": client.id("bob") }))
        .await;
    let (status, body) = client
        .post(
            "/api/v1/friend_response",
            "bob",
            json!({ "requester": client.id("alice"), "action": "decline" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "none");

    let (status, body) = client
        .post(
            "/api/v1/friend_response",
            "carol",
            json!({ "requester": client.id("alice"), "action": "block" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "blocked");

    let path = format!("/api/v1/friend_status?target={}", client.id("carol"));
    let (_, body) = client.get(&path, Some("alice")).await;
    assert_eq!(body["data"]["status"], "blocked");
}

#[tokio::test]
async fn requests_without_valid_token_are_unauthorized() {
    let client = Client::fake().await;

    let (status, body) = client.get("/api/v1/friends", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidToken");

    let request = warp::test::request()
        .method("GET")
        .path("/api/v1/friends")
        .header("authorization", "Bearer not-a-real-token");
    let (status, body) = client.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidToken");

    let request = warp::test::request()
        .method("GET")
        .path("/api/v1/friends")
        .header("authorization", "Basic abc");
    let (status, _) = client.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_body_and_unknown_route() {
    let client = Client::fake().await;

    let request = warp::test::request()
        .method("POST")
        .path("/api/v1/friend_request")
        .header("authorization", client.bearer("alice"))
        .header("content-type", "application/json")
        .body("{\"target\": 42}");
    let (status, body) = client.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "InvalidInput");

    let (status, body) = client.get("/api/v1/nope", Some("alice")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NotFound");
}

#[tokio::test]
async fn friends_posts_over_http() {
    let client = Client::real().await;
    client.signup("alice").await;
    client.signup("bob").await;
    client.signup("mallory").await;
    client.befriend("alice", "bob").await;

    let (status, _) = client
        .post("/api/v1/posts", "bob", json!({ "title": "hi", "content": "from bob" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    client
        .post("/api/v1/posts", "mallory", json!({ "title": "hi", "content": "from mallory" }))
        .await;

    let (status, body) = client.get("/api/v1/friends_posts", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    let posts = body["data"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["content"], "from bob");

    let (_, body) = client.get("/api/v1/posts", Some("bob")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn comments_and_likes_over_http() {
    let client = Client::real().await;
    client.signup("alice").await;
    client.signup("bob").await;

    let (_, body) = client
        .post("/api/v1/posts", "alice", json!({ "title": "t", "content": "c" }))
        .await;
    let post_id = body["data"]["post_id"].as_i64().unwrap();

    let (status, body) = client
        .post("/api/v1/comments", "bob", json!({ "post_id": post_id, "content": "nice" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["data"]["comment_id"].as_i64().unwrap();

    let (status, body) = client
        .get(&format!("/api/v1/comments/{post_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["content"], "nice");

    let delete = |user: &str| {
        warp::test::request()
            .method("DELETE")
            .path(&format!("/api/v1/comments/{comment_id}"))
            .header("authorization", client.bearer(user))
    };
    let (status, body) = client.send(delete("alice")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "Forbidden");
    let (status, _) = client.send(delete("bob")).await;
    assert_eq!(status, StatusCode::OK);

    let likes = format!("/api/v1/likes/{post_id}");
    let (_, body) = client.post(&likes, "bob", json!({})).await;
    assert_eq!(body["data"]["action"], "liked");

    let (_, body) = client.get(&format!("{likes}/count"), None).await;
    assert_eq!(body["data"]["like_count"], 1);
    let (_, body) = client.get(&format!("{likes}/mine"), Some("bob")).await;
    assert_eq!(body["data"]["liked"], true);

    let (_, body) = client.post(&likes, "bob", json!({})).await;
    assert_eq!(body["data"]["action"], "unliked");
    let (_, body) = client.get(&format!("{likes}/count"), None).await;
    assert_eq!(body["data"]["like_count"], 0);

    let (status, _) = client.post("/api/v1/likes/9999", "bob", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_login_and_use_token() {
    let client = Client::real().await;
    let register = json!({
        "email": "alice@example.com",
        "username": "alice",
        "password": "correct horse",
        "first_name": "Alice",
        "last_name": "Liddell",
    });

    let request = warp::test::request()
        .method("POST")
        .path("/api/v1/register")
        .json(&register);
    let (status, body) = client.send(request).await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["data"]["user_id"].clone();

    let request = warp::test::request()
        .method("POST")
        .path("/api/v1/register")
        .json(&register);
    let (status, body) = client.send(request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "UsernameTaken");

    let request = warp::test::request()
        .method("POST")
        .path("/api/v1/login")
        .json(&json!({ "username": "alice", "password": "wrong horse" }));
    let (status, body) = client.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "InvalidCredentials");

    let request = warp::test::request()
        .method("POST")
        .path("/api/v1/login")
        .json(&json!({ "username": "alice", "password": "correct horse" }));
    let (status, body) = client.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["user_id"], user_id);
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let request = warp::test::request()
        .method("GET")
        .path("/api/v1/users?search=ali")
        .header("authorization", format!("Bearer {token}"));
    let (status, body) = client.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["username"], "alice");

    let request = warp::test::request()
        .method("GET")
        .path(&format!("/api/v1/username?user_id={}", user_id.as_str().unwrap()))
        .header("authorization", format!("Bearer {token}"));
    let (status, body) = client.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn relationships_with_unknown_users_are_not_found() {
    let client = Client::real().await;
    client.signup("alice").await;
    let ghost = UserId::new_random();

    let (status, body) = client
        .post("/api/v1/friend_request", "alice", json!({ "target": ghost }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NotFound");

    for action in ["accept", "decline", "block"] {
        let (status, body) = client
            .post(
                "/api/v1/friend_response",
                "alice",
                json!({ "requester": ghost, "action": action }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{action}");
        assert_eq!(error_code(&body), "NotFound");
    }

    let (_, body) = client.get("/api/v1/friends", Some("alice")).await;
    assert!(body["data"].as_array().unwrap().is_empty());
    let path = format!("/api/v1/friend_status?target={ghost}");
    let (_, body) = client.get(&path, Some("alice")).await;
    assert_eq!(body["data"]["status"], "none");
}

#[tokio::test]
async fn user_id_resolves_usernames() {
    let client = Client::real().await;
    let alice = client.signup("alice").await;
    client.signup("bob").await;

    let (status, body) = client.get("/api/v1/user_id?username=alice", Some("bob")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], json!(alice));

    let (status, body) = client.get("/api/v1/user_id?username=nobody", Some("bob")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NotFound");

    let (status, _) = client.get("/api/v1/user_id?username=alice", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
