//! # HTTP Job Service
//!
//! Thin orchestration layer over the badge pipeline: upload a template,
//! submit a generation job, poll its status, fetch finished badges.
//!
//! ## Usage
//!
//! ```bash
//! lanyard serve --listen 0.0.0.0:8080
//! ```

mod handlers;
mod state;

pub use state::{JobStatus, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::LanyardError;
use crate::fonts::FontRegistry;
use state::{AppState, SESSION_EXPIRATION_SECS};

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use lanyard::server::{ServerConfig, serve};
///
/// # async fn example() -> Result<(), lanyard::error::LanyardError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
/// };
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), LanyardError> {
    // Fail fast: a job submitted against a fontless process would silently
    // render with wrong metrics, so refuse to start instead.
    let registry = FontRegistry::global()?;
    println!(
        "Fonts: {} faces from {}",
        registry.fonts_registered(),
        registry.source_dir().display()
    );

    let app_state = Arc::new(AppState::new(config.clone()));

    // Expire abandoned template upload sessions in the background.
    tokio::spawn(cleanup_sessions(app_state.clone()));

    let app = Router::new()
        .route(
            "/api/template/upload",
            post(handlers::upload_template).layer(DefaultBodyLimit::max(50 * 1024 * 1024)),
        )
        .route("/api/jobs", post(handlers::create_job))
        .route("/api/jobs/:id", get(handlers::job_status))
        .route("/api/jobs/:id/badges/:index", get(handlers::badge))
        .with_state(app_state);

    println!("Lanyard HTTP server starting...");
    println!("Listening on: {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            LanyardError::Server(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| LanyardError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task to clean up expired template sessions.
async fn cleanup_sessions(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(SESSION_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        let now = Instant::now();

        let mut templates = state.templates.write().await;
        let before = templates.len();
        templates.retain(|_, session| now.duration_since(session.last_accessed) < expiration);
        let after = templates.len();
        if before != after {
            println!(
                "[sessions] Cleaned up {} expired template sessions ({} remaining)",
                before - after,
                after
            );
        }
    }
}
