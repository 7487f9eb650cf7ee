use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Form, Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::CuratorError;
use crate::curator::Curator;
use crate::models::TripRequest;
use crate::render::{FormValues, PageOutcome, export_document, export_filename, form_page};

const BODY_LIMIT_BYTES: usize = 256 * 1024;

#[derive(Clone)]
pub struct AppState {
    curator: Arc<Curator>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadForm {
    pub destination: String,
    pub markdown: String,
}

pub fn router(curator: Arc<Curator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(show_form).post(submit_form))
        .route("/download", post(download))
        .route("/api/itinerary", post(api_itinerary))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { curator })
}

pub async fn run(curator: Arc<Curator>) -> Result<()> {
    let server = &curator.config().server;
    let addr = format!("{}:{}", server.host, server.port);
    let port = server.port;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://localhost:{}", port);

    axum::serve(listener, router(curator))
        .await
        .context("Web server stopped unexpectedly")
}

fn default_form(curator: &Curator) -> FormValues {
    let defaults = &curator.config().defaults;
    FormValues {
        destination: defaults.destination.clone(),
        preferences: defaults.preferences.clone(),
        start_date: String::new(),
        days: defaults.days,
        test_mode: curator.config().llm.test_mode,
    }
}

fn parse_start_date(raw: &str) -> Result<Option<NaiveDate>, CuratorError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| CuratorError::validation(format!("Invalid start date '{raw}'.")))
}

fn trip_request(form: &FormValues) -> Result<TripRequest, CuratorError> {
    Ok(TripRequest {
        destination: form.destination.clone(),
        preferences: form.preferences.clone(),
        start_date: parse_start_date(&form.start_date)?,
        days: form.days,
        test_mode: form.test_mode,
    })
}

fn html_page(rendered: crate::Result<String>) -> Response {
    match rendered {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.user_message()).into_response()
        }
    }
}

async fn show_form(State(state): State<AppState>) -> Response {
    let max_days = state.curator.config().defaults.max_days;
    html_page(form_page(&default_form(&state.curator), max_days, &PageOutcome::Empty))
}

async fn submit_form(State(state): State<AppState>, Form(form): Form<FormValues>) -> Response {
    let max_days = state.curator.config().defaults.max_days;

    let generated = match trip_request(&form) {
        Ok(request) => state.curator.generate(request).await,
        Err(e) => Err(e),
    };

    let page = match &generated {
        Ok(itinerary) => form_page(&form, max_days, &PageOutcome::Itinerary(itinerary)),
        Err(e) if e.is_validation() => {
            form_page(&form, max_days, &PageOutcome::Warning(e.user_message()))
        }
        Err(e) => {
            tracing::error!("Itinerary generation failed: {}", e);
            form_page(&form, max_days, &PageOutcome::Error(e.user_message()))
        }
    };
    html_page(page)
}

async fn download(Form(form): Form<DownloadForm>) -> Response {
    let document = match export_document(form.destination.trim(), &form.markdown) {
        Ok(document) => document,
        Err(e) => return html_page(Err(e)),
    };
    let disposition = format!("attachment; filename=\"{}\"", export_filename(&form.destination));
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    )
        .into_response()
}

fn error_status(err: &CuratorError) -> StatusCode {
    match err {
        CuratorError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        CuratorError::Api { .. } | CuratorError::EmptyCompletion | CuratorError::Search { .. } => {
            StatusCode::BAD_GATEWAY
        }
        CuratorError::Config { .. } | CuratorError::Render { .. } | CuratorError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn api_itinerary(State(state): State<AppState>, Json(request): Json<TripRequest>) -> Response {
    match state.curator.generate(request).await {
        Ok(itinerary) => Json(itinerary).into_response(),
        Err(e) => {
            if !e.is_validation() {
                tracing::error!("Itinerary generation failed: {}", e);
            }
            (error_status(&e), Json(json!({ "error": e.user_message() }))).into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_date() {
        assert_eq!(parse_start_date("").unwrap(), None);
        assert_eq!(
            parse_start_date("2025-05-12").unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 12)
        );
        assert!(parse_start_date("12/05/2025").unwrap_err().is_validation());
    }

    #[test]
    fn test_error_status() {
        assert_eq!(
            error_status(&CuratorError::validation("x")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(error_status(&CuratorError::EmptyCompletion), StatusCode::BAD_GATEWAY);
        assert_eq!(
            error_status(&CuratorError::config("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
