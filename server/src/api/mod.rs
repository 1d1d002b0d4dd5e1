pub mod extract;

use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tablesnap_core::api::{paths, ErrorBody};
use utoipa::OpenApi;

/// Room for multipart boundaries and part headers on top of the image limit.
/// The image size itself is enforced per field in the handler.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Returns the relay router with its state applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            paths::EXTRACT,
            post(extract::extract).fallback(extract::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(
            state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        ))
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(extract::extract),
    components(schemas(ErrorBody, extract::ExtractImageRequest))
)]
pub struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
