//! Minimal web front end: one form, one analysis endpoint.
//!
//! Every request builds its own agent and pipeline; requests share only the
//! immutable configuration.

pub mod page;

pub use page::{escape_html, format_result, render_page, Notice};

use crate::agent::dispatcher::truncate;
use crate::agent::MaterialAgent;
use crate::config::AppConfig;
use crate::llm::{InferenceClient, LlmBackend};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Builds a backend for one request from the caller's API key.
pub type BackendFactory = Arc<dyn Fn(&str) -> Result<Box<dyn LlmBackend>> + Send + Sync>;

/// Application state shared across handlers.
pub struct AppState {
    pub config: AppConfig,
    pub backend: BackendFactory,
}

impl AppState {
    /// State whose agents talk to the configured chat-completions endpoint.
    pub fn new(config: AppConfig) -> Self {
        let llm = config.llm.clone();
        Self {
            config,
            backend: Arc::new(move |api_key: &str| -> Result<Box<dyn LlmBackend>> {
                Ok(Box::new(InferenceClient::new(&llm, api_key)))
            }),
        }
    }

    pub fn with_backend(config: AppConfig, backend: BackendFactory) -> Self {
        Self { config, backend }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeForm {
    pub query: String,
    pub api_key: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

/// Bind to `config.bind` and serve until Ctrl-C.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.bind.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server failed")?;
    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Html<String> {
    Html(render_page("", Notice::None))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AnalyzeForm>,
) -> Html<String> {
    let api_key = form.api_key.trim();
    if api_key.is_empty() {
        return Html(render_page(
            &form.query,
            Notice::Error("API key is required to use this system."),
        ));
    }
    if form.query.is_empty() {
        return Html(render_page("", Notice::Error("Please enter a query.")));
    }

    match run_query(&state, api_key, &form.query).await {
        Ok(result) => {
            info!("Query processed: {}...", truncate(&form.query, 50));
            let formatted = format_result(&result);
            Html(render_page(&form.query, Notice::Result(&formatted)))
        }
        Err(e) => {
            error!("Error processing query: {:#}", e);
            let message = format!("Error during processing: {:#}", e);
            Html(render_page(&form.query, Notice::Error(&message)))
        }
    }
}

/// Run one query on a fresh agent in its own task. A panicking session is
/// reported as an error.
async fn run_query(state: &AppState, api_key: &str, query: &str) -> Result<String> {
    let backend = (state.backend)(api_key)?;
    let mut agent = MaterialAgent::new(backend, state.config.llm.max_turns);
    let query = query.to_string();
    let result = tokio::spawn(async move { agent.run(&query).await })
        .await
        .context("Agent task failed")?;
    Ok(result)
}
