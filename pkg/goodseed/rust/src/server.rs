// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! HTTP server and API handlers.
//!
//! - GET /api/projects - projects with run counts
//! - GET /api/runs[?project=] - runs, newest first
//! - GET /api/runs/{project}/{run}/configs
//! - GET /api/runs/{project}/{run}/metrics[?path=]
//! - GET /api/runs/{project}/{run}/metric-paths
//! - GET /api/runs/{project}/{run}/string_series[?path=&limit=&offset=&tail=]
//!
//! Store reads are blocking SQLite calls and run on the blocking pool. Each
//! request opens what it needs and closes it before responding.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State, rejection::PathRejection},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::codec::{
    ConfigMap, ConfigsResponse, MetricPathsResponse, MetricsResponse, ProjectsResponse,
    RunsResponse, StringSeriesResponse,
};
use crate::config::ServerConfig;
use crate::error::{ApiError, StoreError};
use crate::routes::{self, RunResource, RunRoute};
use crate::scan;
use crate::store::RunStore;
use crate::types::PageRequest;

const DASHBOARD_URL: &str = "https://goodseed.ai/app/local";

/// Application state shared across handlers.
pub struct AppState {
    pub projects_dir: PathBuf,
}

/// Build the application router for a projects directory.
pub fn build_app(projects_dir: PathBuf) -> Router {
    let state = Arc::new(AppState { projects_dir });

    Router::new()
        .route("/api/projects", get(projects_handler))
        .route("/api/runs", get(runs_handler))
        .route(
            &format!("{}*rest", routes::RUN_ROUTE_PREFIX),
            get(run_resource_handler),
        )
        .fallback(not_found_handler)
        .layer(middleware::from_fn(preflight))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on loopback and serve until SIGINT/SIGTERM.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    if config.verbose {
        info!("Goodseed server running at http://localhost:{}", config.port);
        info!(projects_dir = %config.projects_dir.display(), "Data directory");
    }
    info!("View your runs at {}?port={}", DASHBOARD_URL, config.port);

    let app = build_app(config.projects_dir);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let (Ok(mut sigint), Ok(mut sigterm)) = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) else {
        tracing::warn!("Failed to install signal handlers, falling back to Ctrl+C");
        let _ = tokio::signal::ctrl_c().await;
        return;
    };

    tokio::select! {
        _ = sigint.recv() => info!("Received SIGINT, shutting down"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl+C, shutting down");
}

/// Answer CORS preflight for any path without reaching the routes.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}

/// Run a blocking store operation off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

// --- Handlers ---

async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// GET /api/projects - projects from file metadata only.
async fn projects_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProjectsResponse>, ApiError> {
    let projects = blocking(move || Ok(scan::scan_projects(&state.projects_dir))).await?;
    Ok(Json(ProjectsResponse { projects }))
}

/// GET /api/runs - runs newest first, optionally for one project.
async fn runs_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<RunsResponse>, ApiError> {
    let project = param(&params, "project").map(str::to_string);
    let runs =
        blocking(move || Ok(scan::scan_runs(&state.projects_dir, project.as_deref()))).await?;
    Ok(Json(RunsResponse { runs }))
}

/// GET /api/runs/{project}/{run}/{resource}
async fn run_resource_handler(
    State(state): State<Arc<AppState>>,
    rest: Result<Path<String>, PathRejection>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    // e.g. a percent-encoded segment that isn't UTF-8
    let Ok(Path(rest)) = rest else {
        return Err(ApiError::NotFound("Not found".to_string()));
    };
    let Some(route) = routes::match_run_route(&rest) else {
        return Err(ApiError::NotFound("Not found".to_string()));
    };
    let Some(path) = routes::resolve_run_path(&state.projects_dir, &route.project, &route.run)
    else {
        return Err(ApiError::run_not_found(&route.project, &route.run));
    };

    let series = param(&params, "path").map(str::to_string);
    let page = match route.resource {
        RunResource::StringSeries => PageRequest::from_params(
            parse_count(&params, "limit")?,
            parse_count(&params, "offset")?.unwrap_or(0),
            parse_count(&params, "tail")?,
        ),
        _ => PageRequest::All,
    };

    blocking(move || {
        let store = RunStore::open(&path).map_err(|e| match e {
            StoreError::Missing(_) => ApiError::run_not_found(&route.project, &route.run),
            e => e.into(),
        })?;
        read_resource(&store, &route, series.as_deref(), page)
    })
    .await
}

fn read_resource(
    store: &RunStore,
    route: &RunRoute,
    series: Option<&str>,
    page: PageRequest,
) -> Result<Response, ApiError> {
    let response = match route.resource {
        RunResource::Configs => Json(ConfigsResponse {
            configs: ConfigMap(store.read_configs()?),
        })
        .into_response(),
        RunResource::Metrics => Json(MetricsResponse {
            metrics: store.read_metric_points(series)?,
        })
        .into_response(),
        RunResource::MetricPaths => Json(MetricPathsResponse {
            paths: store.read_metric_series_names()?,
        })
        .into_response(),
        RunResource::StringSeries => {
            Json(StringSeriesResponse::from(store.read_string_points(series, page)?))
                .into_response()
        }
    };
    Ok(response)
}

/// A query parameter, with empty values treated as absent.
fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

fn parse_count(params: &HashMap<String, String>, key: &str) -> Result<Option<u64>, ApiError> {
    param(params, key)
        .map(|raw| {
            raw.parse::<u64>().map_err(|_| {
                ApiError::BadRequest(format!(
                    "invalid '{key}': expected a non-negative integer, got {raw:?}"
                ))
            })
        })
        .transpose()
}
