//! `scorecard serve` — HTTP front end rendering one results page per request.
//!
//! | Route                 | Response                                    |
//! |-----------------------|---------------------------------------------|
//! | `GET /?repo=h/o/n`    | HTML results page, `400` on a bad `repo`    |
//! | `GET /healthz`        | `200 ok`                                    |

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clap::Args;
use serde::Deserialize;

use scorecard_core::{CheckRegistry, RepoUrl};
use scorecard_renderer::{PageContext, PageRenderer};

use super::{load_registry, run_context};

/// Arguments for `scorecard serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Cancel checks still running after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory of `.tera` files overriding the embedded page template.
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,
}

impl ServeArgs {
    pub async fn run(self, config: Option<&Path>) -> Result<()> {
        let registry = load_registry(config)?;
        let renderer = PageRenderer::new(self.templates.as_deref())
            .context("failed to load page templates")?;
        let state = AppState::new(registry, renderer, self.timeout);

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", self.port))
            .await
            .with_context(|| format!("failed to bind port {}", self.port))?;
        let port = listener
            .local_addr()
            .context("failed to read listener address")?
            .port();
        println!("Listening on localhost:{port}");
        tracing::info!(port, checks = state.registry.len(), "server started");

        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("received ctrl-c, shutting down server");
    }
}

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<CheckRegistry>,
    renderer: Arc<PageRenderer>,
    timeout: Option<u64>,
}

impl AppState {
    pub fn new(registry: CheckRegistry, renderer: PageRenderer, timeout: Option<u64>) -> Self {
        Self {
            registry: Arc::new(registry),
            renderer: Arc::new(renderer),
            timeout,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(results_page))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    repo: Option<String>,
}

async fn results_page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    let Some(raw) = query.repo.filter(|r| !r.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            "missing 'repo' query parameter; expected host/owner/name",
        )
            .into_response();
    };
    let repo = match RepoUrl::parse(&raw) {
        Ok(repo) => repo,
        Err(err) => {
            tracing::debug!(repo = %raw, error = %err, "rejected results request");
            return (StatusCode::BAD_REQUEST, format!("invalid repo '{raw}': {err}"))
                .into_response();
        }
    };
    tracing::info!(repo = %repo, "results page requested");

    let ctx = run_context(state.timeout);
    // Dropped with this future, e.g. when the client disconnects.
    let _cancel_on_drop = ctx.token().clone().drop_guard();

    let mut stream = match scorecard_runner::run(&ctx, repo, &state.registry) {
        Ok(stream) => stream,
        Err(err) => {
            tracing::error!(error = %err, "failed to start run");
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    let mut page = PageContext::new(raw.trim());
    while let Some(result) = stream.next().await {
        tracing::info!(
            check = %result.name,
            outcome = result.outcome.label(),
            duration_ms = result.duration_ms,
            "check result",
        );
        page.record(&result);
    }

    match state.renderer.render(&page) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to render results page");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render results page").into_response()
        }
    }
}
