use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::state::{AppState, Latest};
use crate::error::Error;
use crate::forms::TaxRecord;
use crate::pdf::fields::FormField;
use crate::pdf::fill::FillReport;
use crate::workflow::generate_filled;

const INDEX_HTML: &str = include_str!("index.html");

/// Errors returned to the browser as `{"error": ...}`
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Generate(Error),
    Internal(String),
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        AppError::Generate(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Generate(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AppError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        if status.is_server_error() {
            log::error!("{}", message);
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct FieldValue {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub number: u64,
    pub form: String,
    pub summary: String,
    pub filename: String,
    pub values: Vec<FieldValue>,
    pub record: TaxRecord,
    pub report: FillReport,
    pub unresolved: Vec<&'static str>,
}

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(INDEX_HTML.replace("{{ form_name }}", state.kind.display_name()))
}

pub async fn generate(State(state): State<Arc<AppState>>) -> Result<Json<GenerateResponse>, AppError> {
    let worker = state.clone();
    let generated = tokio::task::spawn_blocking(move || {
        let mut generator = worker
            .generator
            .lock()
            .map_err(|_| AppError::Internal("generator lock poisoned".to_string()))?;
        generate_filled(worker.kind, &worker.template, &mut *generator, &worker.options)
            .map_err(AppError::from)
    })
    .await
    .map_err(|e| AppError::Internal(format!("generate task failed: {e}")))??;

    let filename = state.kind.default_output();

    // Numbering under the lock keeps the highest number on the PDF `/download` serves
    let number = {
        let mut latest = state
            .latest
            .lock()
            .map_err(|_| AppError::Internal("download lock poisoned".to_string()))?;
        *latest = Some(Latest {
            filename: filename.clone(),
            pdf_bytes: generated.pdf_bytes,
        });
        state.generated.fetch_add(1, Ordering::SeqCst) + 1
    };

    let values = generated
        .record
        .field_values()
        .into_iter()
        .map(|(key, value)| FieldValue { key, value })
        .collect();

    Ok(Json(GenerateResponse {
        number,
        form: state.kind.display_name().to_string(),
        summary: generated.record.summary(),
        filename,
        values,
        record: generated.record,
        report: generated.report,
        unresolved: generated.unresolved,
    }))
}

pub async fn download(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let latest = state
        .latest
        .lock()
        .map_err(|_| AppError::Internal("download lock poisoned".to_string()))?
        .clone()
        .ok_or_else(|| AppError::NotFound("Nothing generated yet".to_string()))?;

    let disposition = format!("attachment; filename=\"{}\"", latest.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        latest.pdf_bytes,
    )
        .into_response())
}

pub async fn fields(State(state): State<Arc<AppState>>) -> Json<Vec<FormField>> {
    Json(state.fields.clone())
}
