use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use tokio::task::AbortHandle;
use tracing::{error, info, info_span, Instrument};
use validator::Validate;

use crate::extraction::fetch::preview;
use crate::middleware::require_session;
use crate::models::{AnalyzeRequest, AnalyzeResponse, AppState, PdfProbeRequest, PdfProbeResponse};
use crate::types::{AppError, AppResult, Violation};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/files/analyze", post(analyze_file))
        .route("/api/files/test-pdf", post(test_pdf))
        // Session check runs before the body is even parsed
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session))
        .with_state(state)
}

/// Parse the body as JSON whatever the declared Content-Type; browsers posting
/// a string body send `text/plain`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|e| {
        AppError::Validation(vec![Violation::new(
            "body",
            "invalid_json",
            format!("Failed to parse the request body as JSON: {}", e),
        )])
    })
}

/// Aborts the task when the handler future is dropped, e.g. by the timeout layer.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// POST /api/files/analyze - describe one attachment
async fn analyze_file(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<AnalyzeResponse>> {
    let payload: AnalyzeRequest = parse_body(&body)?;
    payload.validate()?;
    let request = payload.into_extraction();
    let request_id = uuid::Uuid::new_v4();

    info!(
        %request_id,
        content_type = %request.content_type,
        file_name = request.display_name.as_deref().unwrap_or("-"),
        "File analyze request received: {}",
        preview(&request.locator)
    );

    // Own task so a panicking engine turns into a 500 instead of a dropped connection.
    // Dropping the handler (timeout, client gone) aborts it.
    let pipeline = state.pipeline.clone();
    let task_request = request.clone();
    let task = tokio::spawn(
        async move { pipeline.analyze(&task_request).await }
            .instrument(info_span!("analyze", %request_id)),
    );
    let _abort = AbortOnDrop(task.abort_handle());
    let result = task
        .await
        .map_err(|e| AppError::Internal(format!("analysis task {} failed: {}", request_id, e)))?;

    Ok(Json(AnalyzeResponse::new(&request, &result)))
}

/// POST /api/files/test-pdf - page count and first-page text of a PDF
async fn test_pdf(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Response> {
    let payload: PdfProbeRequest = parse_body(&body)?;
    payload.validate()?;
    let url = payload.url.unwrap_or_default();

    info!("Testing PDF URL: {}", preview(&url));

    match state.pdf.probe(&url).await {
        Ok(probe) => {
            info!(pages = probe.pages, "PDF probe extracted {} chars", probe.text.len());
            let response = PdfProbeResponse {
                success: true,
                pages: probe.pages,
                text_length: probe.text.chars().count(),
                text: probe.text,
            };
            Ok((StatusCode::OK, Json(response)).into_response())
        }
        Err(e) => {
            error!("PDF probe failed: {}", e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                })),
            )
                .into_response())
        }
    }
}
