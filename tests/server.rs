#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderMap, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use taskvault::api::types::{CSRF_HEADER, SESSION_COOKIE};
    use taskvault::db::tasks::{TaskStore, TASKS_FILE_NAME};
    use taskvault::libs::config::{AdminCredentials, ServerConfig};
    use taskvault::server::{router, AppState};
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};
    use tower::ServiceExt;

    const USER: &str = "admin";
    const PASS: &str = "correct horse";

    struct ServerTestContext {
        temp_dir: TempDir,
        state: Arc<AppState>,
    }

    impl AsyncTestContext for ServerTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let store = TaskStore::in_dir(temp_dir.path());
            let state = Arc::new(AppState::new(store, AdminCredentials::new(USER, PASS), &ServerConfig::default()));
            ServerTestContext { temp_dir, state }
        }
    }

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: Value,
    }

    impl ServerTestContext {
        async fn send(&self, request: Request<Body>) -> Reply {
            let response = router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            Reply { status, headers, body }
        }

        async fn request(&self, method: Method, uri: &str, session: Option<&str>, csrf: Option<&str>, body: Option<Value>) -> Reply {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(session) = session {
                builder = builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, session));
            }
            if let Some(csrf) = csrf {
                builder = builder.header(CSRF_HEADER, csrf);
            }
            let body = match body {
                Some(body) => {
                    builder = builder.header(header::CONTENT_TYPE, "application/json");
                    Body::from(body.to_string())
                }
                None => Body::empty(),
            };
            self.send(builder.body(body).unwrap()).await
        }

        async fn try_login(&self, password: &str) -> Reply {
            self.request(Method::POST, "/api/login", None, None, Some(json!({ "username": USER, "password": password })))
                .await
        }

        async fn login(&self) -> String {
            let reply = self.try_login(PASS).await;
            assert_eq!(reply.status, StatusCode::OK);
            let cookie = reply.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
            let pair = cookie.split(';').next().unwrap();
            pair.trim_start_matches(&format!("{}=", SESSION_COOKIE)).to_string()
        }

        async fn csrf(&self, session: &str) -> String {
            let reply = self.request(Method::GET, "/api/csrf-token", Some(session), None, None).await;
            assert_eq!(reply.status, StatusCode::OK);
            reply.body["csrfToken"].as_str().unwrap().to_string()
        }

        async fn put_tasks(&self, session: &str, items: Value) -> Reply {
            let csrf = self.csrf(session).await;
            self.request(Method::PUT, "/api/tasks", Some(session), Some(&csrf), Some(json!({ "items": items })))
                .await
        }

        async fn get_tasks(&self, session: &str) -> Reply {
            self.request(Method::GET, "/api/tasks", Some(session), None, None).await
        }
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_health(ctx: &mut ServerTestContext) {
        let reply = ctx.request(Method::GET, "/health", None, None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["status"], "ok");
        assert!(reply.body["timestamp"].is_string());
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_login_sets_session_cookie(ctx: &mut ServerTestContext) {
        let reply = ctx.try_login(PASS).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, json!({ "success": true }));

        let cookie = reply.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_wrong_password_is_rejected(ctx: &mut ServerTestContext) {
        let reply = ctx.try_login("nope").await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, json!({ "error": "Invalid credentials" }));
        assert!(reply.headers.get(header::SET_COOKIE).is_none());
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_auth_status(ctx: &mut ServerTestContext) {
        let anonymous = ctx.request(Method::GET, "/api/auth-status", None, None, None).await;
        assert_eq!(anonymous.body, json!({ "authenticated": false }));

        let unknown = ctx.request(Method::GET, "/api/auth-status", Some("forged"), None, None).await;
        assert_eq!(unknown.body, json!({ "authenticated": false }));

        let session = ctx.login().await;
        let reply = ctx.request(Method::GET, "/api/auth-status", Some(&session), None, None).await;
        assert_eq!(reply.body, json!({ "authenticated": true }));
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_tasks_require_session(ctx: &mut ServerTestContext) {
        let reply = ctx.request(Method::GET, "/api/tasks", None, None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, json!({ "error": "Authentication required" }));

        let reply = ctx.request(Method::PUT, "/api/tasks", Some("forged"), Some("x"), Some(json!({ "items": [] }))).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

        let reply = ctx.request(Method::GET, "/api/csrf-token", None, None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_empty_list_before_first_save(ctx: &mut ServerTestContext) {
        let session = ctx.login().await;
        let reply = ctx.get_tasks(&session).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["items"], json!([]));
        assert_eq!(reply.body["lastSaved"], Value::Null);
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_put_requires_csrf_token(ctx: &mut ServerTestContext) {
        let session = ctx.login().await;
        let items = json!({ "items": [] });

        let missing = ctx.request(Method::PUT, "/api/tasks", Some(&session), None, Some(items.clone())).await;
        assert_eq!(missing.status, StatusCode::FORBIDDEN);
        assert_eq!(missing.body, json!({ "error": "Invalid CSRF token" }));

        let token = ctx.csrf(&session).await;
        let wrong = ctx.request(Method::PUT, "/api/tasks", Some(&session), Some("not-the-token"), Some(items.clone())).await;
        assert_eq!(wrong.status, StatusCode::FORBIDDEN);

        let ok = ctx.request(Method::PUT, "/api/tasks", Some(&session), Some(&token), Some(items)).await;
        assert_eq!(ok.status, StatusCode::OK);
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_csrf_token_is_per_session(ctx: &mut ServerTestContext) {
        let first = ctx.login().await;
        let second = ctx.login().await;
        let token = ctx.csrf(&first).await;

        assert_eq!(ctx.csrf(&first).await, token);
        assert_ne!(ctx.csrf(&second).await, token);

        let reply = ctx.request(Method::PUT, "/api/tasks", Some(&second), Some(&token), Some(json!({ "items": [] }))).await;
        assert_eq!(reply.status, StatusCode::FORBIDDEN);
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_put_rejects_bad_payloads(ctx: &mut ServerTestContext) {
        let session = ctx.login().await;
        let token = ctx.csrf(&session).await;

        let not_array = ctx.request(Method::PUT, "/api/tasks", Some(&session), Some(&token), Some(json!({ "items": {} }))).await;
        assert_eq!(not_array.status, StatusCode::BAD_REQUEST);
        assert!(not_array.body["error"].is_string());

        let bad_record = ctx.put_tasks(&session, json!([{ "id": "a", "text": "no type" }])).await;
        assert_eq!(bad_record.status, StatusCode::BAD_REQUEST);

        let duplicate = ctx
            .put_tasks(&session, json!([{ "id": "a", "type": "item", "text": "1" }, { "id": "a", "type": "item", "text": "2" }]))
            .await;
        assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);

        let invalid_json = ctx
            .send(
                Request::builder()
                    .method(Method::PUT)
                    .uri("/api/tasks")
                    .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, session))
                    .header(CSRF_HEADER, token.as_str())
                    .body(Body::from("{ nope"))
                    .unwrap(),
            )
            .await;
        assert_eq!(invalid_json.status, StatusCode::BAD_REQUEST);

        assert!(!ctx.temp_dir.path().join(TASKS_FILE_NAME).exists());
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_save_and_reload(ctx: &mut ServerTestContext) {
        let session = ctx.login().await;
        let reply = ctx
            .put_tasks(
                &session,
                json!([
                    { "type": "header", "text": "Work" },
                    { "type": "item", "text": "Write report", "done": false }
                ]),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["success"], true);
        assert!(reply.body["lastSaved"].is_string());

        let loaded = ctx.get_tasks(&session).await;
        let items = loaded.body["items"].as_array().unwrap().clone();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["type"], "header");
        assert!(items.iter().all(|item| item["id"].is_string() && item["createdAt"].is_string()));
        assert_eq!(loaded.body["lastSaved"], reply.body["lastSaved"]);

        let document: Value = serde_json::from_str(&std::fs::read_to_string(ctx.temp_dir.path().join(TASKS_FILE_NAME)).unwrap()).unwrap();
        assert_eq!(document.as_array().map(|items| items.len()), Some(2));
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_server_owns_timestamps(ctx: &mut ServerTestContext) {
        let session = ctx.login().await;
        ctx.put_tasks(&session, json!([{ "id": "i1", "type": "item", "text": "Task" }])).await;
        let created = ctx.get_tasks(&session).await.body["items"][0]["createdAt"].clone();

        let reply = ctx
            .put_tasks(
                &session,
                json!([{ "id": "i1", "type": "item", "text": "Task", "done": true,
                          "createdAt": "2000-01-01T00:00:00Z", "completedAt": "2000-01-01T00:00:00Z" }]),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);

        let item = ctx.get_tasks(&session).await.body["items"][0].clone();
        assert_eq!(item["createdAt"], created);
        assert!(item["completedAt"].is_string());
        assert_ne!(item["completedAt"], "2000-01-01T00:00:00Z");

        ctx.put_tasks(&session, json!([{ "id": "i1", "type": "item", "text": "Task", "done": false }])).await;
        let item = ctx.get_tasks(&session).await.body["items"][0].clone();
        assert!(item.get("completedAt").is_none());
        assert_eq!(item["createdAt"], created);
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_post_saves_like_put(ctx: &mut ServerTestContext) {
        let session = ctx.login().await;
        let token = ctx.csrf(&session).await;
        let reply = ctx
            .request(Method::POST, "/api/tasks", Some(&session), Some(&token), Some(json!({ "items": [{ "type": "item", "text": "x" }] })))
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(ctx.get_tasks(&session).await.body["items"].as_array().map(|items| items.len()), Some(1));
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_logout_ends_session(ctx: &mut ServerTestContext) {
        let session = ctx.login().await;
        let reply = ctx.request(Method::POST, "/api/logout", Some(&session), None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, json!({ "success": true }));
        assert!(reply.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap().contains("Max-Age=0"));

        assert_eq!(ctx.get_tasks(&session).await.status, StatusCode::UNAUTHORIZED);
        let again = ctx.request(Method::POST, "/api/logout", Some(&session), None, None).await;
        assert_eq!(again.status, StatusCode::UNAUTHORIZED);
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_repeated_failed_logins_are_throttled(ctx: &mut ServerTestContext) {
        for _ in 0..5 {
            assert_eq!(ctx.try_login("wrong").await.status, StatusCode::UNAUTHORIZED);
        }
        let blocked = ctx.try_login(PASS).await;
        assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);
        assert!(blocked.body["error"].is_string());
    }

    #[test_context(ServerTestContext)]
    #[tokio::test]
    async fn test_successful_login_resets_throttle(ctx: &mut ServerTestContext) {
        for _ in 0..4 {
            ctx.try_login("wrong").await;
        }
        ctx.login().await;
        for _ in 0..4 {
            assert_eq!(ctx.try_login("wrong").await.status, StatusCode::UNAUTHORIZED);
        }
        assert_eq!(ctx.try_login(PASS).await.status, StatusCode::OK);
    }
}
