use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::TryStreamExt;
use normalizer_lib::{IngestError, Ingestor, Record};
use serde::Serialize;
use serde_json::{Value, json};
use std::io;
use std::pin::pin;
use std::sync::Arc;
use tokio_util::io::StreamReader;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, Span};

/// Multipart form field carrying the spreadsheet
pub const UPLOAD_FIELD: &str = "file";

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    ingestor: Arc<Ingestor>,
}

/// Error answered to the client as `{"detail": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        ApiError {
            status: StatusCode::from_u16(error.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            detail: error.to_string(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(error: MultipartError) -> Self {
        ApiError {
            status: error.status(),
            detail: error.body_text(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

pub fn router(ingestor: Ingestor) -> Router {
    // The ingestor enforces the real limit; this only has to stay above it
    let body_limit = usize::try_from(ingestor.max_file_size())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    let state = AppState {
        ingestor: Arc::new(ingestor),
    };

    Router::new()
        .route("/", get(root))
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Excel to JSON normalizer is running",
        "endpoints": {
            "/upload": "POST - send an Excel file in the 'file' form field to convert it to JSON"
        }
    }))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<Record>>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let span = tracing::info_span!("upload", filename = %filename);
        let records = process_upload(state.ingestor.clone(), &filename, field)
            .instrument(span)
            .await?;
        return Ok(Json(records));
    }

    tracing::warn!("upload without a '{}' field", UPLOAD_FIELD);
    Err(ApiError {
        status: StatusCode::BAD_REQUEST,
        detail: format!("Missing '{UPLOAD_FIELD}' field in multipart form"),
    })
}

async fn process_upload(
    ingestor: Arc<Ingestor>,
    filename: &str,
    field: Field<'_>,
) -> Result<Vec<Record>, ApiError> {
    ingestor.check_extension(filename)?;

    let reader = pin!(StreamReader::new(field.map_err(io::Error::other)));
    let bytes = ingestor.read_upload(reader).await?;

    // Decoding is CPU bound; keep it off the async workers
    let span = Span::current();
    let records = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        ingestor.ingest_bytes(bytes)
    })
    .await
    .map_err(|e| IngestError::Processing(format!("worker task failed: {e}")))??;

    Ok(records)
}
