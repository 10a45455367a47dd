pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::career::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .route(
            "/api/v1/resume/tailor",
            post(handlers::handle_resume_tailor).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/v1/interview", post(handlers::handle_interview))
        .route("/api/v1/chat", post(handlers::handle_chat))
        .route("/api/v1/models", get(handlers::handle_models))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::Config;
    use crate::llm_client::credentials::StaticCredential;
    use crate::llm_client::LlmClient;

    fn app(server: &MockServer, key: Option<&str>) -> Router {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.completion_url = format!("{}/chat/completions", server.uri());
        config.models_url = format!("{}/models", server.uri());
        config.model_priority = vec!["fake/a".to_string(), "fake/b".to_string()];
        config.max_upload_bytes = 1024;

        let llm = LlmClient::new(
            config.llm_settings(),
            Arc::new(StaticCredential(key.map(str::to_string))),
        )
        .unwrap();
        build_router(AppState { llm, config })
    }

    async fn answer_with(server: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })))
            .mount(server)
            .await;
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(&server, None), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_returns_extracted_json() {
        let server = MockServer::start().await;
        answer_with(
            &server,
            "Sure!\n```json\n{\"skills\": [\"Rust\"], \"missingSkills\": [], \"matchScore\": 80, \
             \"suggestions\": [], \"responsibilities\": [\"Ship\"]}\n```",
        )
        .await;

        let (status, body) = send(
            app(&server, Some("sk-or-v1-test")),
            post_json("/api/v1/analyze", json!({"jobDescription": "Rust engineer"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"], json!(["Rust"]));
        assert_eq!(body["matchScore"], 80.0);
    }

    #[tokio::test]
    async fn test_analyze_requires_job_description() {
        let server = MockServer::start().await;
        let (status, body) = send(
            app(&server, Some("sk-or-v1-test")),
            post_json("/api/v1/analyze", json!({"jobDescription": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"]["message"],
            "Job description is required"
        );
    }

    #[tokio::test]
    async fn test_missing_credential_is_reported_verbatim() {
        let server = MockServer::start().await;
        let (status, body) = send(
            app(&server, None),
            post_json("/api/v1/interview", json!({"role": "SRE"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "LLM_NOT_CONFIGURED");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("OPENROUTER_API_KEY"));
    }

    #[tokio::test]
    async fn test_unparseable_answer_is_bad_gateway() {
        let server = MockServer::start().await;
        answer_with(&server, "I'd rather not answer in JSON.").await;

        let (status, body) = send(
            app(&server, Some("sk-or-v1-test")),
            post_json("/api/v1/interview", json!({"role": "SRE"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "LLM_MALFORMED_OUTPUT");
    }

    #[tokio::test]
    async fn test_all_models_unavailable_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let (status, body) = send(
            app(&server, Some("sk-or-v1-test")),
            post_json("/api/v1/chat", json!({"message": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "LLM_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_chat_returns_free_text() {
        let server = MockServer::start().await;
        answer_with(&server, "Lead with impact numbers.").await;

        let (status, body) = send(
            app(&server, Some("sk-or-v1-test")),
            post_json(
                "/api/v1/chat",
                json!({
                    "message": "How do I improve my resume?",
                    "history": [{"role": "user", "content": "Hi"}]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "Lead with impact numbers.");
        assert!(body["timestamp"].is_string());
    }

    fn multipart(file_name: &str, content_type: &str, content: &str) -> Request<Body> {
        let boundary = "workhub-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/resume/tailor")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_resume_tailor_from_text_upload() {
        let server = MockServer::start().await;
        answer_with(
            &server,
            r#"{"summary": "Backend engineer.", "experiences": [], "skills": ["Rust"]}"#,
        )
        .await;

        let (status, body) = send(
            app(&server, Some("sk-or-v1-test")),
            multipart("cv.txt", "text/plain", "Jane Doe\nRust engineer"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"], "Backend engineer.");
    }

    #[tokio::test]
    async fn test_resume_tailor_rejects_oversized_upload() {
        let server = MockServer::start().await;
        let (status, _) = send(
            app(&server, Some("sk-or-v1-test")),
            multipart("cv.txt", "text/plain", &"x".repeat(4096)),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_models_lists_priority_and_available() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "fake/b"}]})),
            )
            .mount(&server)
            .await;

        let request = Request::builder()
            .uri("/api/v1/models")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(&server, Some("sk-or-v1-test")), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["priority"], json!(["fake/a", "fake/b"]));
        assert_eq!(body["available"], json!(["fake/b"]));
    }
}
