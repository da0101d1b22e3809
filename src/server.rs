/*!
 * HTTP boundary: the two endpoints in front of the scheduler.
 *
 * - `POST /analyze_emotion/` - submit a frame (multipart `file`, optional
 *   `message` text); answers 200 with a result envelope or 202 queued.
 * - `GET /get_result/` - poll the last published result for a session.
 *
 * The session identifier comes from the `X-Session-Id` header, else the
 * `session` query parameter, else a default constant. All state lives behind
 * the scheduler; handlers hold no locks across awaits.
 */

use axum::{Json, Router};
use axum::extract::{Multipart, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use anyhow::{Context, Result};
use bytes::Bytes;
use log::info;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::errors::ServerError;
use crate::scheduler::{CoalescingScheduler, SubmitOutcome};
use crate::session::DEFAULT_SESSION_ID;

/// Query parameters shared by both endpoints
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    /// Session identifier, when not supplied via header
    #[serde(default)]
    session: Option<String>,
}

/// Resolve the session identifier: header, then query, then default
fn resolve_session_id(headers: &HeaderMap, query: &SessionQuery) -> String {
    headers
        .get("X-Session-Id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| {
            query
                .session
                .clone()
                .filter(|value| !value.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
}

/// Handler for `POST /analyze_emotion/`
async fn analyze_emotion(
    State(scheduler): State<CoalescingScheduler>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
    mut multipart: Multipart,
) -> Response {
    let session_id = resolve_session_id(&headers, &query);

    let mut image: Option<Bytes> = None;
    let mut message = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return bad_request(ServerError::MalformedRequest(e.to_string()));
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => match field.bytes().await {
                Ok(bytes) => image = Some(bytes),
                Err(e) => {
                    return bad_request(ServerError::MalformedRequest(e.to_string()));
                }
            },
            Some("message") => match field.text().await {
                Ok(text) => message = text,
                Err(e) => {
                    return bad_request(ServerError::MalformedRequest(e.to_string()));
                }
            },
            _ => {}
        }
    }

    let Some(image) = image else {
        return bad_request(ServerError::MissingImage(
            "multipart field 'file' is required".to_string(),
        ));
    };

    match scheduler.submit(&session_id, image, &message).await {
        SubmitOutcome::Completed(result) => (StatusCode::OK, Json(result)).into_response(),
        SubmitOutcome::Queued => {
            (StatusCode::ACCEPTED, Json(json!({ "detail": "queued" }))).into_response()
        }
    }
}

/// Handler for `GET /get_result/`
async fn get_result(
    State(scheduler): State<CoalescingScheduler>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Response {
    let session_id = resolve_session_id(&headers, &query);

    match scheduler.last_result(&session_id) {
        None => Json(json!({ "status": "none" })).into_response(),
        Some(result) => Json(json!({ "status": "ok", "result": result })).into_response(),
    }
}

fn bad_request(error: ServerError) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": error.to_string() }))).into_response()
}

/// Build the application router over a scheduler
pub fn router(scheduler: CoalescingScheduler) -> Router {
    Router::new()
        .route("/analyze_emotion/", post(analyze_emotion))
        .route("/get_result/", get(get_result))
        .layer(CorsLayer::permissive())
        .with_state(scheduler)
}

/// Bind and serve until the process is stopped
pub async fn serve(addr: &str, scheduler: CoalescingScheduler) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, router(scheduler))
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
