//! Browser UI: generate a filled form and download it

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::config::ServeConfig;
use crate::error::Result;
use crate::template::load_template;
use crate::workflow::GenerateOptions;

pub use state::AppState;

/// Build the UI router around shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/generate", post(handlers::generate))
        .route("/download", get(handlers::download))
        .route("/fields", get(handlers::fields))
        .with_state(state)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        log::info!("Shutting down");
    }
}

/// Load the template and serve the UI until Ctrl-C
pub async fn serve(config: ServeConfig) -> Result<()> {
    let template = load_template(&config.template).await?;
    let options = GenerateOptions {
        period: config.period,
        signature_date: config.signature_date,
        fill: config.fill.clone(),
    };
    let state = Arc::new(AppState::new(config.form, &template, options, config.seed)?);
    log::info!(
        "Serving {} from {} ({} template fields)",
        config.form,
        config.template,
        state.fields.len()
    );

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    eprintln!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::forms::FormKind;
    use crate::pdf::fill::save_to_bytes;
    use crate::pdf::scaffold::build_template;
    use crate::period::TaxPeriod;

    fn test_state(kind: FormKind) -> Arc<AppState> {
        let template = save_to_bytes(&mut build_template(kind)).unwrap();
        let options = GenerateOptions::new(TaxPeriod::year(2023));
        Arc::new(AppState::new(kind, &template, options, Some(11)).unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_request(uri: &str) -> Request<Body> {
        Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_index_has_one_download_button() {
        let app = router(test_state(FormKind::F1040));
        let resp = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("Form 1040"));
        assert!(html.contains(">Generate</button>"));
        assert_eq!(html.matches(">Download</button>").count(), 1);
    }

    #[tokio::test]
    async fn test_download_before_generate_is_404() {
        let app = router(test_state(FormKind::F1040));
        let resp = app.oneshot(get_request("/download")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generate_then_download() {
        let state = test_state(FormKind::F941ScheduleD);

        let resp = router(state.clone()).oneshot(post_request("/generate")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["number"], 1);
        assert_eq!(json["record"]["form"], "f941_schedule_d");
        assert!(json["unresolved"].as_array().unwrap().is_empty());
        assert!(!json["values"].as_array().unwrap().is_empty());

        let resp = router(state).oneshot(get_request("/download")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("f941sd-filled.pdf"));

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"%PDF-"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_download_matches_highest_numbered_generate() {
        let state = test_state(FormKind::F941ScheduleD);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let app = router(state.clone());
                tokio::spawn(async move {
                    let resp = app.oneshot(post_request("/generate")).await.unwrap();
                    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
                    serde_json::from_slice::<serde_json::Value>(&body).unwrap()
                })
            })
            .collect();
        let mut responses = Vec::new();
        for task in tasks {
            responses.push(task.await.unwrap());
        }

        let mut numbers: Vec<u64> = responses.iter().map(|r| r["number"].as_u64().unwrap()).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=8).collect::<Vec<u64>>());
        let last = responses.iter().find(|r| r["number"] == 8).unwrap();
        let filer_name = last["record"]["filer_name"].as_str().unwrap();

        let resp = router(state).oneshot(get_request("/download")).await.unwrap();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let doc = lopdf::Document::load_mem(&body).unwrap();
        let fields = crate::extract::extract_from_document(&doc, "download.pdf").unwrap();
        assert!(fields.iter().any(|f| f.value == filer_name));
    }

    #[tokio::test]
    async fn test_fields_listing() {
        let app = router(test_state(FormKind::F1040));
        let resp = app.oneshot(get_request("/fields")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), FormKind::F1040.field_specs().len());
        assert!(json[0]["full_name"].as_str().unwrap().starts_with("topmostSubform[0]"));
    }

    #[test]
    fn test_state_rejects_formless_pdf() {
        let mut doc = lopdf::Document::with_version("1.7");
        let mut catalog = lopdf::Dictionary::new();
        catalog.set("Type", lopdf::Object::Name(b"Catalog".to_vec()));
        let id = doc.add_object(catalog);
        doc.trailer.set("Root", lopdf::Object::Reference(id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let options = GenerateOptions::new(TaxPeriod::year(2023));
        assert!(AppState::new(FormKind::F1040, &bytes, options, None).is_err());
    }
}
