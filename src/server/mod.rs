//! HTTP server for uploads and question answering.

pub mod handlers;
pub mod json_error;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::context::AppContext;
use handlers::{ASK_PATH, UPLOAD_PATH, ask_question, health, status, upload_pdf};

pub use json_error::{ApiError, ApiJson};

pub struct AppBuilder {
    app: Router,
}

impl AppBuilder {
    pub fn new(ctx: AppContext) -> Self {
        let max_upload_bytes = ctx.config.server.max_upload_bytes;
        let app = Router::new()
            .route(
                UPLOAD_PATH,
                post(upload_pdf).layer(DefaultBodyLimit::max(max_upload_bytes)),
            )
            .route(ASK_PATH, post(ask_question))
            .route("/health", get(health))
            .route("/status", get(status))
            .with_state(ctx);
        Self { app }
    }

    pub fn with_trace_layer(self) -> Self {
        Self {
            app: self.app.layer(TraceLayer::new_for_http()),
        }
    }

    pub fn with_cors_layer(self) -> Self {
        Self {
            app: self.app.layer(CorsLayer::permissive()),
        }
    }

    pub fn build(self) -> Router {
        self.app
    }
}

/// Build the full application router.
pub fn router(ctx: AppContext) -> Router {
    AppBuilder::new(ctx)
        .with_trace_layer()
        .with_cors_layer()
        .build()
}

pub struct Server {
    ctx: AppContext,
}

impl Server {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Serve until SIGINT or SIGTERM, then drain in-flight requests.
    pub async fn run(self, address: &str) -> Result<()> {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("failed to bind {address}"))?;
        let local = listener.local_addr()?;
        info!("Listening on http://{local}");

        axum::serve(listener, router(self.ctx))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        info!("Server stopped");
        Ok(())
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
