//! Stax Server - HTTP routes over the docs site
//!
//! Thin axum adapter around [`stax_core::Site`]:
//! - Page view as JSON for the presentation layer
//! - Raw markdown export with a long-lived cache directive
//! - Route listing, navigation, and head metadata
//! - Content reloading on change (optional feature)

pub mod error;
#[cfg(feature = "watch")]
pub mod watcher;

use anyhow::{Context, Result};
use axum::extract::{RawPathParams, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use stax_core::config::ServerConfig;
use stax_core::nav::NavNode;
use stax_core::{Config, ContentTree, DocsError, PageMetadata, PageView, Route, Site, SlugPath};

pub use error::ApiError;

/// Content type of the raw markdown route
pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

#[derive(Clone)]
pub struct AppState {
    pub site: Arc<Site>,
    pub cache_control: Arc<str>,
}

/// Build the router for a site
pub fn router(site: Arc<Site>, server: &ServerConfig) -> Router {
    let state = AppState {
        site,
        cache_control: Arc::from(server.cache_control.as_str()),
    };

    let docs = server.docs_prefix.trim_end_matches('/');
    let markdown = server.markdown_prefix.trim_end_matches('/');

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/routes", get(list_routes))
        .route("/api/nav", get(navigation))
        .route("/api/metadata", get(root_metadata))
        .route("/api/metadata/*slug", get(page_metadata))
        .route(&root_route(docs), get(root_page))
        .route(&format!("{}/*slug", docs), get(page))
        .route(&root_route(markdown), get(root_markdown))
        .route(&format!("{}/*slug", markdown), get(raw_markdown))
        .fallback(not_found)
        .with_state(state)
}

fn root_route(prefix: &str) -> String {
    if prefix.is_empty() {
        "/".to_string()
    } else {
        prefix.to_string()
    }
}

async fn root_page(State(state): State<AppState>) -> Result<Json<PageView>, ApiError> {
    render_page(&state, &SlugPath::root())
}

async fn page(
    State(state): State<AppState>,
    params: RawPathParams,
) -> Result<Json<PageView>, ApiError> {
    render_page(&state, &slug_param(&params)?)
}

/// The `*slug` capture, matched segment for segment.
///
/// Empty segments and encoded slashes never name a document.
fn slug_param(params: &RawPathParams) -> Result<SlugPath, ApiError> {
    let raw = params
        .iter()
        .find_map(|(key, value)| (key == "slug").then_some(value))
        .unwrap_or_default();
    SlugPath::from_encoded(raw)
        .ok_or_else(|| ApiError(DocsError::NotFound(SlugPath::from_url(raw))))
}

fn render_page(state: &AppState, path: &SlugPath) -> Result<Json<PageView>, ApiError> {
    Ok(Json(state.site.page(path.segments())?))
}

async fn root_markdown(State(state): State<AppState>) -> Result<Response, ApiError> {
    markdown_response(&state, &SlugPath::root())
}

async fn raw_markdown(
    State(state): State<AppState>,
    params: RawPathParams,
) -> Result<Response, ApiError> {
    markdown_response(&state, &slug_param(&params)?)
}

fn markdown_response(state: &AppState, path: &SlugPath) -> Result<Response, ApiError> {
    let markdown = state.site.raw_markdown(path.segments())?;
    Ok((
        [
            (header::CONTENT_TYPE, MARKDOWN_CONTENT_TYPE),
            (header::CACHE_CONTROL, &*state.cache_control),
        ],
        markdown.to_string(),
    )
        .into_response())
}

async fn root_metadata(State(state): State<AppState>) -> Result<Json<PageMetadata>, ApiError> {
    Ok(Json(state.site.metadata(&[])?))
}

async fn page_metadata(
    State(state): State<AppState>,
    params: RawPathParams,
) -> Result<Json<PageMetadata>, ApiError> {
    let path = slug_param(&params)?;
    Ok(Json(state.site.metadata(path.segments())?))
}

async fn list_routes(State(state): State<AppState>) -> Json<Vec<Route>> {
    Json(state.site.list_all_routes())
}

async fn navigation(State(state): State<AppState>) -> Json<Vec<NavNode>> {
    Json(state.site.navigation())
}

async fn not_found() -> impl IntoResponse {
    (axum::http::StatusCode::NOT_FOUND, error::NOT_FOUND_BODY)
}

/// Re-ingest the content directory and swap it in.
///
/// On failure the current tree stays in place.
pub fn reload_content(site: &Site, config: &Config) -> Result<()> {
    let tree = ContentTree::load(&config.content, &config.site)
        .context("Failed to reload content")?;
    site.replace_tree(tree);
    Ok(())
}

/// Serve the site until Ctrl-C
pub async fn serve(site: Arc<Site>, config: &Config) -> Result<()> {
    let app = router(Arc::clone(&site), &config.server);

    #[cfg(feature = "watch")]
    let _reloader = if config.watch.enabled {
        Some(watcher::spawn_reloader(Arc::clone(&site), config.clone())?)
    } else {
        None
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
