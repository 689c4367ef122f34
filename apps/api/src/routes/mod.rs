pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::assessment::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::hello_handler))
        .route("/hello", get(health::hello_handler))
        .route("/health", get(health::health_handler))
        .route("/extract/", post(handlers::handle_extract))
        .route("/extract", post(handlers::handle_extract))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::assessment::document::build_docx;
    use crate::config::Config;
    use crate::llm_client::mock::MockProvider;
    use crate::llm_client::LlmError;

    const TCP_REPLY: &str = r#"{"assessment_type":"written_assessment","questions_and_answers":[{"question_number":1,"question":"Explain TCP handshake.","suggested_answer":["SYN, SYN-ACK, ACK."]}]}"#;

    fn app(provider: MockProvider) -> Router {
        let config = Config::from_pairs(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        build_router(AppState {
            provider: Arc::new(provider),
            config,
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn form_request(content: &str) -> Request<Body> {
        let body = serde_urlencoded::to_string([("content", content)]).unwrap();
        Request::builder()
            .method("POST")
            .uri("/extract/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str, &[u8])]) -> Request<Body> {
        let boundary = "X-ASSESSMENT-BOUNDARY";
        let mut body: Vec<u8> = Vec::new();
        for (name, file_name, mime, data) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            let disposition = match file_name {
                Some(f) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
            };
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/extract/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_hello_routes() {
        for uri in ["/hello", "/"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let (status, body) = send(app(MockProvider::replying("{}")), request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, b"Hello, World!");
        }
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(MockProvider::replying("{}")), request).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_form_extract_returns_model_json_verbatim() {
        let request = form_request(
            "Question 1: Explain TCP handshake. Suggested answer: SYN, SYN-ACK, ACK.",
        );
        let (status, body) = send(app(MockProvider::replying(TCP_REPLY)), request).await;

        assert_eq!(status, StatusCode::OK);
        let got: Value = serde_json::from_slice(&body).unwrap();
        let expected: Value = serde_json::from_str(TCP_REPLY).unwrap();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_extract_without_trailing_slash() {
        let mut request = form_request("Question 1: What is DNS?");
        *request.uri_mut() = "/extract".parse().unwrap();
        let (status, _) = send(app(MockProvider::replying("{}")), request).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unparseable_reply_returns_error_payload() {
        let request = form_request("Question 1: Explain TCP handshake.");
        let (status, body) =
            send(app(MockProvider::replying("Sorry, I cannot help.")), request).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Failed to parse the response from OpenAI");
    }

    #[tokio::test]
    async fn test_provider_timeout_maps_to_gateway_timeout() {
        let request = form_request("Question 1: Explain TCP handshake.");
        let (status, body) = send(
            app(MockProvider::failing(|| LlmError::Timeout)),
            request,
        )
        .await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "PROVIDER_TIMEOUT");
    }

    #[tokio::test]
    async fn test_missing_content_field_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/extract/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("text=hello"))
            .unwrap();
        let (status, _) = send(app(MockProvider::replying("{}")), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_json_body_is_accepted() {
        let request = Request::builder()
            .method("POST")
            .uri("/extract/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"content": "Question 1: Explain TCP handshake."}"#))
            .unwrap();
        let (status, body) = send(app(MockProvider::replying(TCP_REPLY)), request).await;
        assert_eq!(status, StatusCode::OK);
        let got: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(got["assessment_type"], "written_assessment");
    }

    #[tokio::test]
    async fn test_multipart_content_field() {
        let provider = Arc::new(MockProvider::replying(TCP_REPLY));
        let config = Config::from_pairs(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        let app = build_router(AppState {
            provider: provider.clone(),
            config,
        });

        let request = multipart_request(&[(
            "content",
            None,
            "text/plain",
            b"Case Study: Acme Ltd\nQuestion 1: Why did sales fall?".as_slice(),
        )]);
        let (status, _) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        let prompts = provider.prompts();
        assert!(prompts[0].contains("\"assessment_type\": \"case_study\""));
        assert!(prompts[0].ends_with("Case Study: Acme Ltd\nQuestion 1: Why did sales fall?"));
    }

    #[tokio::test]
    async fn test_multipart_text_file_upload_is_normalized() {
        let provider = Arc::new(MockProvider::replying(TCP_REPLY));
        let config = Config::from_pairs(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        let app = build_router(AppState {
            provider: provider.clone(),
            config,
        });

        let request = multipart_request(&[(
            "file",
            Some("exam.txt"),
            "text/plain",
            b"  Question 1: Explain TCP handshake.  \n\n Suggested answer: SYN ".as_slice(),
        )]);
        let (status, _) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(provider.prompts()[0]
            .ends_with("Question 1: Explain TCP handshake.\nSuggested answer: SYN"));
    }

    #[tokio::test]
    async fn test_multipart_docx_upload_is_extracted() {
        let provider = Arc::new(MockProvider::replying(TCP_REPLY));
        let config = Config::from_pairs(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        let app = build_router(AppState {
            provider: provider.clone(),
            config,
        });

        let docx = build_docx(&["Question 1: Explain TCP handshake.", "Suggested answer: SYN"]);
        let request = multipart_request(&[(
            "file",
            Some("exam.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            docx.as_slice(),
        )]);
        let (status, _) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(provider.prompts()[0]
            .ends_with("Question 1: Explain TCP handshake.\nSuggested answer: SYN"));
    }

    #[tokio::test]
    async fn test_multipart_unknown_file_type_is_unsupported() {
        let request = multipart_request(&[(
            "file",
            Some("exam.doc"),
            "application/msword",
            b"\xd0\xcf\x11\xe0".as_slice(),
        )]);
        let (status, body) = send(app(MockProvider::replying("{}")), request).await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn test_multipart_without_usable_field_is_bad_request() {
        let request = multipart_request(&[("notes", None, "text/plain", b"hello".as_slice())]);
        let (status, _) = send(app(MockProvider::replying("{}")), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
