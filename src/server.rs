use crate::{
    config::Cors,
    error::ConvertError,
    pipeline::{ConversionRequest, Pipeline},
};
use anyhow::{anyhow, Context, Result};
use axum::{
    Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info};

/// Room for multipart boundaries and part headers on top of the file limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// `POST /convert` and `GET /health` with CORS and request tracing.
pub fn build_router(pipeline: Arc<Pipeline>) -> Result<Router> {
    let cfg = pipeline.config();
    let cors = create_cors_layer(&cfg.cors)?;
    let body_limit = usize::try_from(cfg.server.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Ok(Router::new()
        .route(
            "/convert",
            post(convert).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/health", get(health))
        .with_state(AppState { pipeline })
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

fn create_cors_layer(cfg: &Cors) -> Result<CorsLayer> {
    let origin = if cfg.allowed_origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cfg.allowed_origins {
            let value = origin
                .trim()
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid CORS origin: {origin}"))?;
            origins.push(value);
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION]);

    if let Some(max_age) = cfg.max_age_seconds {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

pub async fn serve(pipeline: Arc<Pipeline>) -> Result<()> {
    let bind_addr = pipeline.config().server.bind_address();
    let strategies = pipeline.strategy_names();
    let router = build_router(pipeline)?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(
        "docpress listening on http://{} strategies={:?}",
        bind_addr, strategies
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow!("server error: {e}"))?;

    info!("docpress stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

fn multipart_error(err: MultipartError, limit: u64) -> ConvertError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ConvertError::PayloadTooLarge { limit }
    } else {
        ConvertError::MalformedUpload(err.body_text())
    }
}

async fn convert(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ConvertError> {
    // Not a multipart body at all: there is no file part to find.
    let mut multipart = multipart.map_err(|rejection| {
        debug!("rejected non-multipart upload: {}", rejection.body_text());
        ConvertError::MissingFile
    })?;
    let limit = state.pipeline.config().server.max_upload_bytes;
    let mut upload: Option<ConversionRequest> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if upload.is_some() || field.name() != Some("file") {
            continue;
        }
        // A `file` part without a filename is a plain form value, not an upload.
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        state.pipeline.validate_filename(&filename)?;

        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        upload = Some(ConversionRequest {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    let request = upload.ok_or(ConvertError::MissingFile)?;

    let pipeline = state.pipeline.clone();
    let output = tokio::task::spawn_blocking(move || pipeline.run(request))
        .await
        .map_err(|e| {
            error!("conversion task aborted: {e}");
            ConvertError::Unexpected(anyhow!("Conversion task aborted"))
        })??;

    let disposition = format!("attachment; filename=\"{}\"", output.download_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.pdf,
    )
        .into_response())
}
