use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{admin, auth, resumes};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(resumes::router())
                .merge(admin::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::build_app;
    use crate::admin::services::ensure_admin_bootstrap;
    use crate::state::AppState;

    const BOUNDARY: &str = "resume-vault-boundary";

    async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, bytes) = send(app, req).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn upload_request(user_id: Option<Uuid>, file: Option<&[u8]>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(id) = user_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"userId\"\r\n\r\n{id}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nBackend role\r\n"
            )
            .as_bytes(),
        );
        if let Some(data) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cv.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/resumes")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn register(app: &axum::Router, email: &str) -> Uuid {
        let (status, body) = send_json(
            app,
            Method::POST,
            "/api/auth/register",
            Some(json!({ "name": "Ada", "email": email, "password": "pw-1234" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["user"]["id"].as_str().unwrap().parse().unwrap()
    }

    async fn upload(app: &axum::Router, user_id: Uuid) -> Uuid {
        let (status, bytes) = send(app, upload_request(Some(user_id), Some(b"%PDF-1.4"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        body["resume"]["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn health() {
        let app = build_app(AppState::fake());
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn register_and_login_never_expose_password() {
        let app = build_app(AppState::fake());
        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/auth/register",
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "pw-1234" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["role"], "user");
        assert!(!body.to_string().contains("password"));

        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ada@example.com", "password": "pw-1234" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert!(!body.to_string().contains("password"));
    }

    #[tokio::test]
    async fn duplicate_registration_is_409() {
        let app = build_app(AppState::fake());
        register(&app, "ada@example.com").await;
        let (status, body) = send_json(
            &app,
            Method::POST,
            "/api/auth/register",
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "other" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let app = build_app(AppState::fake());
        register(&app, "ada@example.com").await;
        let wrong_pw = send_json(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ada@example.com", "password": "wrong" })),
        )
        .await;
        let unknown = send_json(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": "pw-1234" })),
        )
        .await;
        assert_eq!(wrong_pw.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_pw, unknown);
    }

    #[tokio::test]
    async fn resume_lifecycle_over_http() {
        let app = build_app(AppState::fake());
        let user = register(&app, "ada@example.com").await;
        let resume = upload(&app, user).await;

        let (_, active) =
            send_json(&app, Method::GET, &format!("/api/resumes/user/{user}"), None).await;
        assert_eq!(active.as_array().unwrap().len(), 1);
        assert_eq!(active[0]["description"], "Backend role");
        assert!(active[0].get("archived").is_none());

        let (status, _) =
            send_json(&app, Method::PUT, &format!("/api/resumes/{resume}/archive"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, active) =
            send_json(&app, Method::GET, &format!("/api/resumes/user/{user}"), None).await;
        assert!(active.as_array().unwrap().is_empty());
        let (_, archived) =
            send_json(&app, Method::GET, &format!("/api/resumes/user/{user}/archived"), None).await;
        assert_eq!(archived[0]["archived"], true);
        assert!(archived[0]["archivedAt"].is_string());

        let (status, _) =
            send_json(&app, Method::PUT, &format!("/api/resumes/{resume}/restore"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, active) =
            send_json(&app, Method::GET, &format!("/api/resumes/user/{user}"), None).await;
        assert!(active[0].get("archived").is_none());
        assert!(active[0].get("archivedAt").is_none());

        let (status, _) =
            send_json(&app, Method::DELETE, &format!("/api/resumes/{resume}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) =
            send_json(&app, Method::DELETE, &format!("/api/resumes/{resume}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn download_returns_stored_bytes() {
        let app = build_app(AppState::fake());
        let resume = upload(&app, Uuid::new_v4()).await;
        let req = Request::builder()
            .uri(format!("/api/resumes/{resume}/download"))
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"%PDF-1.4");
    }

    #[tokio::test]
    async fn upload_without_file_is_rejected() {
        let app = build_app(AppState::fake());
        let (status, _) = send(&app, upload_request(Some(Uuid::new_v4()), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_delete_cascades_and_protects_admins() {
        let state = AppState::fake();
        let admin = ensure_admin_bootstrap(state.store.as_ref(), &state.config.admin)
            .await
            .unwrap()
            .unwrap();
        let app = build_app(state);

        let user = register(&app, "ada@example.com").await;
        for _ in 0..3 {
            upload(&app, user).await;
        }

        let (status, body) =
            send_json(&app, Method::DELETE, &format!("/api/admin/users/{}", admin.id), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let (status, body) =
            send_json(&app, Method::DELETE, &format!("/api/admin/users/{user}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deletedResumes"], 3);

        let (_, all) = send_json(&app, Method::GET, "/api/admin/resumes", None).await;
        assert!(all.as_array().unwrap().is_empty());

        let (status, _) =
            send_json(&app, Method::DELETE, &format!("/api/admin/users/{user}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_view_marks_unknown_owner() {
        let app = build_app(AppState::fake());
        upload(&app, Uuid::new_v4()).await;
        let (status, all) = send_json(&app, Method::GET, "/api/admin/resumes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all[0]["userName"], "Unknown User");
        assert_eq!(all[0]["userEmail"], "Unknown Email");
        assert_eq!(all[0]["fileName"], "cv.pdf");
    }

    #[tokio::test]
    async fn admin_status_and_manual_creation() {
        let app = build_app(AppState::fake());
        let (_, body) = send_json(&app, Method::GET, "/api/admin/status", None).await;
        assert_eq!(body["adminExists"], false);

        let (status, body) = send_json(&app, Method::POST, "/api/admin/create", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "admin@test.local");
        assert_eq!(body["user"]["role"], "admin");

        let (_, body) = send_json(&app, Method::GET, "/api/admin/status", None).await;
        assert_eq!(body["adminExists"], true);

        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/admin/create",
            Some(json!({ "email": "second@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, users) = send_json(&app, Method::GET, "/api/admin/users", None).await;
        assert_eq!(users.as_array().unwrap().len(), 1);
    }

    fn raw_admin_create(body: &'static str, content_type: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::POST).uri("/api/admin/create");
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn malformed_admin_body_is_rejected_without_creating_admin() {
        let app = build_app(AppState::fake());
        let truncated = r#"{"email":"boss@example.com","password":"s3cret""#;

        for content_type in [Some("application/json"), None] {
            let (status, bytes) = send(&app, raw_admin_create(truncated, content_type)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }

        let (_, body) = send_json(&app, Method::GET, "/api/admin/status", None).await;
        assert_eq!(body["adminExists"], false);
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "admin@test.local", "password": "admin-test-pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_body_without_content_type_uses_supplied_fields() {
        let app = build_app(AppState::fake());
        let (status, bytes) = send(
            &app,
            raw_admin_create(r#"{"email":"boss@example.com","password":"s3cret"}"#, None),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["user"]["email"], "boss@example.com");

        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "boss@example.com", "password": "s3cret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn download_keeps_non_ascii_file_name() {
        let state = AppState::fake();
        let resume = crate::resumes::services::upload(
            state.store.as_ref(),
            crate::resumes::repo_types::NewResume {
                user_id: Uuid::new_v4(),
                file_name: "Lebenslauf_Müller.pdf".into(),
                content_type: "application/pdf".into(),
                description: String::new(),
                file_data: b"%PDF".to_vec(),
            },
        )
        .await
        .unwrap();
        let app = build_app(state);

        let req = Request::builder()
            .uri(format!("/api/resumes/{}/download", resume.id))
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let disposition = res.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("filename=\"Lebenslauf_M_ller.pdf\""));
        assert!(disposition.contains("filename*=UTF-8''Lebenslauf_M%C3%BCller.pdf"));
    }
}
