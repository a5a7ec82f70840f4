//! JSON HTTP service.
//!
//! Each client creates a session and then builds its bibliography, runs
//! audits and downloads Word exports against that session. Session state
//! lives in a [`SessionStore`] owned by the router state and expires after
//! `[server].session_ttl_secs` of inactivity.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/format` | Format a reference without storing it |
//! | `POST` | `/sessions` | Create a session |
//! | `DELETE` | `/sessions/{id}` | End a session |
//! | `GET`  | `/sessions/{id}/bibliography` | Sorted bibliography |
//! | `DELETE` | `/sessions/{id}/bibliography` | Clear the bibliography |
//! | `POST` | `/sessions/{id}/references` | Validate, format and add a reference |
//! | `POST` | `/sessions/{id}/bibliography/correct` | Apply gold-standard corrections |
//! | `GET`  | `/sessions/{id}/bibliography/docx` | Download the bibliography |
//! | `POST` | `/sessions/{id}/audit` | Audit an essay sent as the raw request body |
//! | `GET`  | `/sessions/{id}/audit/docx` | Download the last audit report |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "year is required" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `extraction_failed` (422), `internal` (500).

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::audit::Scanner;
use crate::bibliography::Bibliography;
use crate::config::Config;
use crate::correct::CorrectionTable;
use crate::export::{self, DOCX_CONTENT_TYPE};
use crate::extract;
use crate::format::{format_reference, stamp_access_date, today};
use crate::models::{AuditReport, CitationFields, FormattedReference, Span};
use crate::session::SessionStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    sessions: Arc<SessionStore>,
    scanner: Arc<Scanner>,
    corrections: Arc<CorrectionTable>,
}

/// Builds the router. Exposed separately from [`run_server`] so that
/// callers can embed the service or bind it themselves.
pub fn router(config: &Config) -> anyhow::Result<Router> {
    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionStore::new(Duration::from_secs(
            config.server.session_ttl_secs,
        ))),
        scanner: Arc::new(Scanner::new(&config.audit)?),
        corrections: Arc::new(CorrectionTable::with_extra(&config.corrections)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(handle_health))
        .route("/format", post(handle_format))
        .route("/sessions", post(handle_create_session))
        .route("/sessions/{id}", delete(handle_end_session))
        .route(
            "/sessions/{id}/bibliography",
            get(handle_get_bibliography).delete(handle_clear_bibliography),
        )
        .route("/sessions/{id}/references", post(handle_add_reference))
        .route("/sessions/{id}/bibliography/correct", post(handle_correct))
        .route("/sessions/{id}/bibliography/docx", get(handle_bibliography_docx))
        .route("/sessions/{id}/audit", post(handle_audit))
        .route("/sessions/{id}/audit/docx", get(handle_audit_docx))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(cors)
        .with_state(state))
}

/// Starts the HTTP server on `[server].bind` and runs until the process
/// is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let app = router(config)?;
    let bind_addr = config.server.bind.clone();

    println!("Referencing server listening on http://{}", bind_addr);
    tracing::info!(bind = %bind_addr, "server started");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn extraction_failed(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        code: "extraction_failed".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

fn session_not_found(id: &str) -> AppError {
    not_found(format!("session not found: {}", id))
}

fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| session_not_found(raw))
}

// ============ Shared response shapes ============

/// One bibliography entry in every display form.
#[derive(Serialize)]
struct EntryResponse {
    /// Text with emphasis removed.
    display: String,
    /// Text with `*italic*` / `**bold**` markers.
    markup: String,
    spans: Vec<Span>,
}

impl From<&FormattedReference> for EntryResponse {
    fn from(r: &FormattedReference) -> Self {
        Self {
            display: r.plain(),
            markup: r.markup(),
            spans: r.spans.clone(),
        }
    }
}

#[derive(Serialize)]
struct BibliographyResponse {
    entries: Vec<EntryResponse>,
}

impl From<&Bibliography> for BibliographyResponse {
    fn from(b: &Bibliography) -> Self {
        Self {
            entries: b.iter().map(EntryResponse::from).collect(),
        }
    }
}

fn docx_response(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Validates submitted fields and formats them. Websites submitted without
/// an access date are stamped with today's date.
fn build_reference(mut fields: CitationFields) -> Result<FormattedReference, AppError> {
    fields
        .validate()
        .map_err(|e| bad_request(e.to_string()))?;
    stamp_access_date(&mut fields, &today());
    Ok(format_reference(&fields))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /format ============

async fn handle_format(Json(fields): Json<CitationFields>) -> Result<Json<EntryResponse>, AppError> {
    let reference = build_reference(fields)?;
    Ok(Json(EntryResponse::from(&reference)))
}

// ============ Sessions ============

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
}

async fn handle_create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

async fn handle_end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let session = parse_session_id(&id)?;
    if state.sessions.remove(session).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&id))
    }
}

// ============ Bibliography ============

async fn handle_get_bibliography(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BibliographyResponse>, AppError> {
    let session = parse_session_id(&id)?;
    state
        .sessions
        .with_session(session, |s| {
            s.bibliography.sort();
            Json(BibliographyResponse::from(&s.bibliography))
        })
        .await
        .ok_or_else(|| session_not_found(&id))
}

async fn handle_clear_bibliography(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let session = parse_session_id(&id)?;
    state
        .sessions
        .with_session(session, |s| s.bibliography.clear())
        .await
        .ok_or_else(|| session_not_found(&id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_add_reference(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<CitationFields>,
) -> Result<(StatusCode, Json<EntryResponse>), AppError> {
    let session = parse_session_id(&id)?;
    let kind = fields.kind;
    // Validation happens before the session is touched.
    let reference = build_reference(fields)?;
    let response = EntryResponse::from(&reference);
    state
        .sessions
        .with_session(session, |s| s.bibliography.push(reference))
        .await
        .ok_or_else(|| session_not_found(&id))?;
    tracing::debug!(session = %session, kind = kind.as_str(), "reference added");
    Ok((StatusCode::CREATED, Json(response)))
}

async fn handle_correct(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BibliographyResponse>, AppError> {
    let session = parse_session_id(&id)?;
    let corrections = state.corrections.clone();
    state
        .sessions
        .with_session(session, |s| {
            s.bibliography = corrections.apply(&s.bibliography);
            s.bibliography.sort();
            Json(BibliographyResponse::from(&s.bibliography))
        })
        .await
        .ok_or_else(|| session_not_found(&id))
}

async fn handle_bibliography_docx(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let session = parse_session_id(&id)?;
    let bibliography = state
        .sessions
        .with_session(session, |s| {
            s.bibliography.sort();
            s.bibliography.clone()
        })
        .await
        .ok_or_else(|| session_not_found(&id))?;
    let bytes = export::bibliography_docx(&bibliography, &state.config.export)
        .map_err(|e| internal(e.to_string()))?;
    Ok(docx_response(bytes, "Leeds_Harvard_Bibliography.docx"))
}

// ============ Audit ============

#[derive(Deserialize)]
struct AuditQuery {
    /// Used to infer the content type when the request does not carry one.
    filename: Option<String>,
}

async fn handle_audit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AuditQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AuditReport>, AppError> {
    let session = parse_session_id(&id)?;

    let declared = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|ct| !ct.starts_with("application/octet-stream"));
    let content_type = match (declared, query.filename.as_deref()) {
        (Some(ct), _) => ct.to_string(),
        (None, Some(name)) => extract::content_type_for_path(std::path::Path::new(name))
            .ok_or_else(|| bad_request(format!("cannot determine document type of '{}'", name)))?
            .to_string(),
        (None, None) => {
            return Err(bad_request(
                "send a Content-Type header or a ?filename= query parameter",
            ))
        }
    };

    let bibliography = state
        .sessions
        .with_session(session, |s| s.bibliography.clone())
        .await
        .ok_or_else(|| session_not_found(&id))?;

    // A failed extraction leaves the bibliography and previous report intact.
    let paragraphs = extract::extract_paragraphs(&body, &content_type).map_err(|e| {
        tracing::warn!(session = %session, error = %e, "essay extraction failed");
        extraction_failed(e.to_string())
    })?;

    let report = state.scanner.audit(&paragraphs, &bibliography);
    let response = report.clone();
    state
        .sessions
        .with_session(session, |s| s.last_audit = Some(report))
        .await
        .ok_or_else(|| session_not_found(&id))?;
    Ok(Json(response))
}

async fn handle_audit_docx(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let session = parse_session_id(&id)?;
    let report = state
        .sessions
        .with_session(session, |s| s.last_audit.clone())
        .await
        .ok_or_else(|| session_not_found(&id))?
        .ok_or_else(|| not_found("no audit has been run in this session"))?;
    let bytes = export::audit_report_docx(&report, &state.config.export)
        .map_err(|e| internal(e.to_string()))?;
    Ok(docx_response(bytes, "Referencing_Report.docx"))
}
