use crate::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tablesnap_core::api::{
    ErrorBody, IMAGE_FIELD, METHOD_NOT_ALLOWED_MESSAGE, MISSING_API_KEY_MESSAGE,
    NO_IMAGE_MESSAGE,
};
use tablesnap_core::{extract_table, resolve_mime_type, ImageData};
use utoipa::ToSchema;

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ExtractImageRequest {
    /// The table image. Its part Content-Type is used as the image MIME type.
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

struct UploadedImage {
    data: Vec<u8>,
    content_type: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

fn multipart_error_response(e: MultipartError, max_upload_bytes: usize) -> Response {
    tracing::warn!("Multipart read error: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Image too large. Maximum size is {} bytes.", max_upload_bytes),
        )
    } else {
        error_response(e.status(), "Failed to read multipart data.")
    }
}

/// Find the `image` file part and read it into memory. Other fields, and plain
/// text parts that happen to be named `image`, are skipped.
async fn read_image_field(
    multipart: &mut Multipart,
    max_upload_bytes: usize,
) -> Result<Option<UploadedImage>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => return Err(multipart_error_response(e, max_upload_bytes)),
        };

        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        if field.file_name().is_none() {
            tracing::debug!("Skipping image field without a filename");
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error_response(e, max_upload_bytes))?;

        if data.is_empty() {
            return Ok(None);
        }

        return Ok(Some(UploadedImage {
            data: data.to_vec(),
            content_type,
        }));
    }
}

#[utoipa::path(
    post,
    path = "/api/extract",
    tag = "extract",
    request_body(content_type = "multipart/form-data", content = ExtractImageRequest),
    responses(
        (status = 200, description = "Extracted table; the first row holds the headers", body = Vec<Vec<String>>),
        (status = 400, description = "No image file uploaded", body = ErrorBody),
        (status = 405, description = "Only POST is allowed", body = ErrorBody),
        (status = 413, description = "Image too large", body = ErrorBody),
        (status = 500, description = "Missing API key or extraction failure", body = ErrorBody)
    )
)]
pub async fn extract(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // Checked before the body is touched so misconfiguration fails every request the same way.
    let Some(provider) = state.provider.clone() else {
        tracing::error!("API_KEY environment variable not set on server.");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, MISSING_API_KEY_MESSAGE);
    };

    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(e) => {
            tracing::warn!("Request is not multipart: {}", e);
            return error_response(StatusCode::BAD_REQUEST, NO_IMAGE_MESSAGE);
        }
    };

    let upload = match read_image_field(&mut multipart, state.max_upload_bytes).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return error_response(StatusCode::BAD_REQUEST, NO_IMAGE_MESSAGE),
        Err(response) => return response,
    };

    if upload.data.len() > state.max_upload_bytes {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "Image too large. Maximum size is {} bytes.",
                state.max_upload_bytes
            ),
        );
    }

    let mime_type = resolve_mime_type(upload.content_type.as_deref(), &upload.data);
    tracing::info!(
        mime_type = %mime_type,
        image_bytes = upload.data.len(),
        "Extracting table from upload"
    );

    match extract_table(provider.as_ref(), ImageData::new(upload.data, mime_type)).await {
        Ok(table) => (StatusCode::OK, Json(table)).into_response(),
        Err(e) => {
            tracing::error!("Error processing file upload: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.public_message())
        }
    }
}

/// Fallback for every method other than POST on the extract route.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorBody::new(METHOD_NOT_ALLOWED_MESSAGE)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MULTIPART_OVERHEAD_BYTES;
    use crate::RelayState;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::{Arc, Mutex};
    use tablesnap_core::api::paths;
    use tablesnap_core::llm::FakeProvider;
    use tablesnap_core::{LlmError, LlmProvider, Table, VisionRequest, EXTRACTION_FAILED_MESSAGE};
    use tower::ServiceExt;

    const BOUNDARY: &str = "tablesnap-test-boundary";
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    /// Remembers the MIME type of the last image it was sent.
    #[derive(Debug, Default)]
    struct RecordingProvider {
        last_mime_type: Mutex<Option<String>>,
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        async fn complete(&self, request: &VisionRequest) -> Result<String, LlmError> {
            *self.last_mime_type.lock().unwrap() = Some(request.image.mime_type.clone());
            Ok(r#"[["A"]]"#.to_string())
        }

        fn provider_name(&self) -> &'static str {
            "recording"
        }

        fn model_name(&self) -> &str {
            "recording-model"
        }
    }

    fn state_with(provider: Option<Arc<dyn LlmProvider>>) -> AppState {
        Arc::new(RelayState {
            provider,
            max_upload_bytes: 1024,
        })
    }

    fn multipart_body(field: &str, content_type: Option<&str>, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"table.png\"\r\n",
                BOUNDARY, field
            )
            .as_bytes(),
        );
        if let Some(content_type) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn text_field_body(field: &str, value: &str) -> Vec<u8> {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n--{b}--\r\n",
            b = BOUNDARY,
            field = field,
            value = value
        )
        .into_bytes()
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(paths::EXTRACT)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Vec<u8>, Response) {
        let response = crate::api::router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap().to_vec();
        (status, bytes, Response::from_parts(parts, Body::empty()))
    }

    fn error_of(bytes: &[u8]) -> String {
        serde_json::from_slice::<ErrorBody>(bytes).unwrap().error
    }

    #[tokio::test]
    async fn test_extract_returns_table() {
        let provider = Arc::new(FakeProvider::with_response(r#"[["A","B"],["1","2"]]"#));
        let state = state_with(Some(provider.clone()));

        let request = upload_request(multipart_body("image", Some("image/png"), PNG_MAGIC));
        let (status, body, _) = send(state, request).await;

        assert_eq!(status, StatusCode::OK);
        let table: Table = serde_json::from_slice(&body).unwrap();
        assert_eq!(table.to_clipboard_text(), "A\tB\n1\t2");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_every_request() {
        let with_image = upload_request(multipart_body("image", Some("image/png"), PNG_MAGIC));
        let (status, body, _) = send(state_with(None), with_image).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(&body), MISSING_API_KEY_MESSAGE);

        let not_multipart = Request::builder()
            .method("POST")
            .uri(paths::EXTRACT)
            .body(Body::from("hello"))
            .unwrap();
        let (status, body, _) = send(state_with(None), not_multipart).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(&body), MISSING_API_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_image_field() {
        let provider = Arc::new(FakeProvider::default());
        let request = upload_request(multipart_body("file", Some("image/png"), PNG_MAGIC));
        let (status, body, _) = send(state_with(Some(provider.clone())), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&body), "No image file uploaded.");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_text_field_named_image_is_not_an_upload() {
        let provider = Arc::new(FakeProvider::with_response(r#"[["A"]]"#));
        let request = upload_request(text_field_body("image", "hello"));
        let (status, body, _) = send(state_with(Some(provider.clone())), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&body), NO_IMAGE_MESSAGE);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_file_part_after_text_part_is_used() {
        let provider = Arc::new(FakeProvider::with_response(r#"[["A"]]"#));
        let mut body = text_field_body("image", "hello");
        // Drop the closing delimiter so the file part follows in the same body.
        body.truncate(body.len() - format!("--{}--\r\n", BOUNDARY).len());
        body.extend_from_slice(&multipart_body("image", Some("image/png"), PNG_MAGIC));
        let (status, _, _) = send(state_with(Some(provider.clone())), upload_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_image_field() {
        let provider = Arc::new(FakeProvider::default());
        let request = upload_request(multipart_body("image", Some("image/png"), b""));
        let (status, body, _) = send(state_with(Some(provider)), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&body), NO_IMAGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_non_multipart_body() {
        let provider = Arc::new(FakeProvider::default());
        let request = Request::builder()
            .method("POST")
            .uri(paths::EXTRACT)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"image":"abc"}"#))
            .unwrap();
        let (status, body, _) = send(state_with(Some(provider)), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&body), NO_IMAGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_get_is_method_not_allowed() {
        let request = Request::builder()
            .method("GET")
            .uri(paths::EXTRACT)
            .body(Body::empty())
            .unwrap();
        let (status, body, response) = send(state_with(None), request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
        assert_eq!(error_of(&body), METHOD_NOT_ALLOWED_MESSAGE);
    }

    #[tokio::test]
    async fn test_malformed_ai_output_is_laundered() {
        let provider = Arc::new(FakeProvider::with_response(r#"{"headers":["A"]}"#));
        let request = upload_request(multipart_body("image", Some("image/png"), PNG_MAGIC));
        let (status, body, _) = send(state_with(Some(provider)), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(&body), EXTRACTION_FAILED_MESSAGE);
        let raw = String::from_utf8(body).unwrap();
        assert!(!raw.contains("expected table format"));
    }

    #[tokio::test]
    async fn test_provider_failure_is_laundered() {
        let provider = Arc::new(FakeProvider::failing("quota exceeded for project 1234"));
        let request = upload_request(multipart_body("image", Some("image/png"), PNG_MAGIC));
        let (status, body, _) = send(state_with(Some(provider)), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let raw = String::from_utf8(body).unwrap();
        assert!(!raw.contains("quota"));
        assert!(raw.contains(EXTRACTION_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_upload_over_limit() {
        let provider = Arc::new(FakeProvider::default());
        let big = vec![7u8; 4096];
        let request = upload_request(multipart_body("image", Some("image/png"), &big));
        let (status, body, _) = send(state_with(Some(provider.clone())), request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(error_of(&body).starts_with("Image too large"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_at_limit_is_accepted() {
        let provider = Arc::new(FakeProvider::with_response(r#"[["A"]]"#));
        let mut image = PNG_MAGIC.to_vec();
        image.resize(1024, 0);
        let request = upload_request(multipart_body("image", Some("image/png"), &image));
        let (status, _, _) = send(state_with(Some(provider.clone())), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_upload_one_byte_over_limit() {
        let provider = Arc::new(FakeProvider::default());
        let image = vec![7u8; 1025];
        let request = upload_request(multipart_body("image", Some("image/png"), &image));
        let (status, body, _) = send(state_with(Some(provider.clone())), request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            error_of(&body),
            "Image too large. Maximum size is 1024 bytes."
        );
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_body_over_transport_limit() {
        let provider = Arc::new(FakeProvider::default());
        let image = vec![7u8; 1024 + MULTIPART_OVERHEAD_BYTES + 1];
        let request = upload_request(multipart_body("image", Some("image/png"), &image));
        let (status, body, _) = send(state_with(Some(provider.clone())), request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            error_of(&body),
            "Image too large. Maximum size is 1024 bytes."
        );
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_mime_type_sniffed_when_missing() {
        let provider = Arc::new(RecordingProvider::default());
        let request = upload_request(multipart_body("image", None, JPEG_MAGIC));
        let (status, _, _) = send(state_with(Some(provider.clone())), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            provider.last_mime_type.lock().unwrap().as_deref(),
            Some("image/jpeg")
        );
    }

    #[tokio::test]
    async fn test_mime_type_defaults_to_png() {
        let provider = Arc::new(RecordingProvider::default());
        let request = upload_request(multipart_body("image", None, b"not an image"));
        let (status, _, _) = send(state_with(Some(provider.clone())), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            provider.last_mime_type.lock().unwrap().as_deref(),
            Some("image/png")
        );
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let provider = Arc::new(FakeProvider::with_response(r#"[["A"],["1"]]"#));
        let state = state_with(Some(provider.clone()));

        let requests = (0..8).map(|_| {
            let state = state.clone();
            tokio::spawn(async move {
                let request =
                    upload_request(multipart_body("image", Some("image/png"), PNG_MAGIC));
                send(state, request).await.0
            })
        });

        for handle in requests.collect::<Vec<_>>() {
            assert_eq!(handle.await.unwrap(), StatusCode::OK);
        }
        assert_eq!(provider.calls(), 8);
    }
}
