//! `POST /api/v1/analyze`: one screenshot upload in, one trend report out.

use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        State,
    },
    http::StatusCode,
    Extension, Json,
};
use trendsignal_analysis::{run_full_pipeline, ImagePayload};
use trendsignal_core::PipelineResult;

use crate::middleware::RequestId;

use super::{map_analysis_error, ApiError, ApiResponse, AppState, ResponseMeta};

const UPLOAD_FIELD: &str = "file";

pub(super) async fn analyze_screenshot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<PipelineResult>>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            format!("expected a multipart/form-data upload: {e}"),
        )
    })?;

    let image = read_upload(&req_id.0, &mut multipart).await?;
    let client = state.require_client(&req_id.0)?;

    let result = run_full_pipeline(client.as_ref(), &image)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Finds the `file` field, checks it is a non-empty image, and encodes it.
async fn read_upload(request_id: &str, multipart: &mut Multipart) -> Result<ImagePayload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(request_id, &e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_owned();
        if !content_type.starts_with("image/") {
            return Err(ApiError::new(
                request_id,
                "bad_request",
                "file must be an image (e.g. PNG, JPEG)",
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(request_id, &e))?;
        if bytes.is_empty() {
            return Err(ApiError::new(request_id, "bad_request", "uploaded file is empty"));
        }

        tracing::debug!(bytes = bytes.len(), content_type = %content_type, "received screenshot upload");
        return ImagePayload::from_bytes(&bytes, Some(&content_type))
            .map_err(|e| map_analysis_error(request_id.to_owned(), &e));
    }

    Err(ApiError::new(
        request_id,
        "bad_request",
        format!("multipart field '{UPLOAD_FIELD}' is required"),
    ))
}

fn multipart_error(request_id: &str, error: &MultipartError) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(request_id, "payload_too_large", "uploaded file is too large")
    } else {
        ApiError::new(
            request_id,
            "bad_request",
            format!("invalid multipart body: {}", error.body_text()),
        )
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::test_support::{
        app_with_model, app_without_client, completion, send, TEST_UPLOAD_LIMIT,
    };

    const BOUNDARY: &str = "trendsignal-test-boundary";

    fn upload(content_type: &str, bytes: &[u8]) -> Request<Body> {
        upload_field("file", content_type, bytes)
    }

    fn upload_field(name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"feed.png\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/analyze")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn mount_reply(server: &MockServer, marker: &str, reply: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains(marker))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let (status, json) = send(app_without_client(), upload("text/plain", b"hello")).await;
        assert_eq!(status, 400);
        assert_eq!(json["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let (status, json) = send(app_without_client(), upload("image/png", b"")).await;
        assert_eq!(status, 400);
        assert_eq!(json["error"]["message"], "uploaded file is empty");
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let (status, _) = send(
            app_without_client(),
            upload_field("screenshot", "image/png", b"png"),
        )
        .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn non_multipart_body_is_rejected_with_meta() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/analyze")
            .header("content-type", "application/json")
            .header("x-request-id", "req-json")
            .body(Body::from("{}"))
            .expect("request");

        let (status, json) = send(app_without_client(), request).await;
        assert_eq!(status, 400);
        assert_eq!(json["meta"]["request_id"], "req-json");
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let big = vec![0_u8; TEST_UPLOAD_LIMIT + 1];
        let (status, json) = send(app_without_client(), upload("image/png", &big)).await;
        assert_eq!(status, 413);
        assert_eq!(json["error"]["code"], "payload_too_large");
    }

    #[tokio::test]
    async fn valid_upload_without_model_client_is_503() {
        let (status, json) = send(app_without_client(), upload("image/png", b"png")).await;
        assert_eq!(status, 503);
        assert_eq!(json["error"]["code"], "not_configured");
    }

    #[tokio::test]
    async fn empty_feed_returns_canned_report() {
        let server = MockServer::start().await;
        mount_reply(&server, "image_url", r#"{"videos": []}"#).await;

        let (status, json) = send(app_with_model(&server.uri()), upload("image/png", b"png")).await;

        assert_eq!(status, 200);
        assert_eq!(json["data"]["topic"], "Unknown");
        assert_eq!(json["data"]["trend_strength"], "HEATING_UP");
        assert_eq!(json["data"]["hooks"], json!([]));
    }

    #[tokio::test]
    async fn full_pipeline_over_http() {
        let server = MockServer::start().await;
        mount_reply(
            &server,
            "image_url",
            r#"{"videos": [{"title": "AI took my job", "creator": "Dev Daily", "views": 50000, "hours_since_posted": 4, "emotional_tone": "fear"}]}"#,
        )
        .await;
        mount_reply(
            &server,
            "group them into dominant trending topics",
            r#"{"topics": [{"topic_name": "AI Jobs", "video_count": 1}]}"#,
        )
        .await;
        mount_reply(
            &server,
            "trend_strength: one of",
            r#"{"trend_strength": "EARLY", "confidence": "low"}"#,
        )
        .await;
        mount_reply(
            &server,
            "why_trending: 1-2 sentences",
            r#"{"why_trending": "Layoffs", "who_is_winning": "Small channels", "posting_advice": "Go short", "hooks": ["a", "b"]}"#,
        )
        .await;

        let (status, json) = send(app_with_model(&server.uri()), upload("image/png", b"png")).await;

        assert_eq!(status, 200);
        assert_eq!(
            json["data"],
            json!({
                "topic": "AI Jobs",
                "trend_strength": "EARLY",
                "why_trending": "Layoffs",
                "who_is_winning": "Small channels",
                "how_to_post": "Go short",
                "hooks": ["a", "b"]
            })
        );
    }

    #[tokio::test]
    async fn provider_rate_limit_is_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "quota exceeded" }
            })))
            .mount(&server)
            .await;

        let (status, json) = send(app_with_model(&server.uri()), upload("image/png", b"png")).await;
        assert_eq!(status, 429);
        assert_eq!(json["error"]["code"], "rate_limited");
    }

    #[tokio::test]
    async fn unparseable_model_output_is_400() {
        let server = MockServer::start().await;
        mount_reply(&server, "image_url", "I can't read this screenshot.").await;

        let (status, json) = send(app_with_model(&server.uri()), upload("image/png", b"png")).await;
        assert_eq!(status, 400);
        assert_eq!(json["error"]["code"], "parse_failure");
    }

    #[tokio::test]
    async fn provider_server_error_is_502() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (status, json) = send(app_with_model(&server.uri()), upload("image/png", b"png")).await;
        assert_eq!(status, 502);
        assert_eq!(json["error"]["code"], "upstream_error");
    }
}
