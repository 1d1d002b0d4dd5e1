mod api;
mod config;
mod telemetry;

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::routing::get;
use axum::{Json, Router};
use config::ServerConfig;
use std::env;
use std::sync::Arc;
use tablesnap_core::llm::{create_provider, LlmError, LlmProvider};
use tablesnap_core::AiConfig;
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Read-only state shared by every request.
#[derive(Debug)]
pub struct RelayState {
    /// Built once at startup. `None` when the API key is missing; every
    /// extraction request then fails with a configuration error.
    pub provider: Option<Arc<dyn LlmProvider>>,
    pub max_upload_bytes: usize,
}

/// Application state shared across all handlers
pub type AppState = Arc<RelayState>;

fn build_provider(ai_config: &AiConfig) -> anyhow::Result<Option<Arc<dyn LlmProvider>>> {
    match create_provider(ai_config) {
        Ok(provider) => {
            tracing::info!(
                provider = provider.provider_name(),
                model = provider.model_name(),
                "AI provider ready"
            );
            Ok(Some(provider))
        }
        Err(LlmError::NotConfigured(reason)) => {
            tracing::error!(
                "API_KEY environment variable not set on server ({}); extraction requests will fail",
                reason
            );
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(api::openapi())
}

fn app(state: AppState) -> Router {
    api::router(state)
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        println!("{}", api::openapi().to_pretty_json()?);
        return Ok(());
    }

    telemetry::init_telemetry()?;

    let server_config = ServerConfig::from_env()?;
    let ai_config = AiConfig::from_env()?;

    let state: AppState = Arc::new(RelayState {
        provider: build_provider(&ai_config)?,
        max_upload_bytes: server_config.max_upload_bytes,
    });

    let listener = tokio::net::TcpListener::bind(server_config.listen_addr).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!(
        "OpenAPI spec available at http://{}/api-docs/openapi.json",
        listener.local_addr()?
    );

    axum::serve(listener, app(state)).await?;

    Ok(())
}
