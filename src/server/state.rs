//! Server state: configuration, job registry, template upload sessions.

use image::DynamicImage;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Uploaded template sessions expire after this long without use.
pub const SESSION_EXPIRATION_SECS: u64 = 3600;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

/// Lifecycle of one generation job, as reported to polling clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing { current: usize, total: usize },
    Completed { badge_count: usize },
    Failed { error: String },
}

/// An uploaded template image held in memory between upload and job start.
pub struct TemplateSession {
    pub image: DynamicImage,
    pub last_accessed: Instant,
}

impl TemplateSession {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            last_accessed: Instant::now(),
        }
    }

    /// Keep the session alive.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Job id → current status. Status stays queryable after completion.
    pub jobs: RwLock<HashMap<Uuid, JobStatus>>,
    /// Job id → finished PNG buffers, in row order. Only completed jobs.
    pub badges: RwLock<HashMap<Uuid, Vec<Vec<u8>>>>,
    /// Template upload sessions.
    pub templates: RwLock<HashMap<Uuid, TemplateSession>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            jobs: RwLock::new(HashMap::new()),
            badges: RwLock::new(HashMap::new()),
            templates: RwLock::new(HashMap::new()),
        }
    }
}
