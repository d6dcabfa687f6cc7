//! API handlers: template upload, job creation, status polling, badge fetch.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::LanyardError;
use crate::fonts::FontRegistry;
use crate::generate::{fetch_template, generate_badges, load_template};
use crate::template::{DataRow, FieldMapping, TemplateField};

use super::state::{AppState, JobStatus, TemplateSession};

/// Response from the template upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// Request body for POST /api/jobs.
///
/// Exactly one of `template_id` (an upload session), `template_path`, or
/// `template_url` identifies the background image.
#[derive(Debug, Deserialize)]
pub struct JobRequest {
    pub template_id: Option<Uuid>,
    pub template_path: Option<String>,
    pub template_url: Option<String>,
    pub template_width: u32,
    pub template_height: u32,
    pub fields: Vec<TemplateField>,
    #[serde(default)]
    pub mapping: FieldMapping,
    pub rows: Vec<DataRow>,
}

/// POST /api/template/upload - Upload a template image (multipart).
pub async fn upload_template(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut image_data: Option<Vec<u8>> = None;
    let mut filename = String::from("unknown");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "template" {
            filename = field.file_name().unwrap_or("unknown").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                (StatusCode::BAD_REQUEST, format!("Failed to read upload: {}", e))
            })?;
            image_data = Some(bytes.to_vec());
            break;
        }
    }

    let image_bytes =
        image_data.ok_or((StatusCode::BAD_REQUEST, "No template field found".to_string()))?;
    let image = image::load_from_memory(&image_bytes)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to decode image: {}", e)))?;

    let width = image.width();
    let height = image.height();
    let session_id = Uuid::new_v4();
    {
        let mut templates = state.templates.write().await;
        templates.insert(session_id, TemplateSession::new(image));
    }

    Ok(Json(UploadResponse {
        id: session_id.to_string(),
        filename,
        width,
        height,
    }))
}

/// POST /api/jobs - Register a generation job and return its id immediately.
///
/// The job runs in the background; clients poll GET /api/jobs/:id for
/// pending/processing/completed/failed status.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JobRequest>,
) -> Json<serde_json::Value> {
    let job_id = Uuid::new_v4();
    state.jobs.write().await.insert(job_id, JobStatus::Pending);

    tokio::spawn(run_job(state.clone(), job_id, request));

    Json(serde_json::json!({ "job_id": job_id }))
}

/// GET /api/jobs/:id - Current job status.
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, (StatusCode, String)> {
    let job_id = Uuid::parse_str(&id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid job ID".to_string()))?;
    let jobs = state.jobs.read().await;
    let status = jobs
        .get(&job_id)
        .ok_or((StatusCode::NOT_FOUND, "Job not found".to_string()))?;
    Ok(Json(status.clone()))
}

/// GET /api/jobs/:id/badges/:index - One finished badge as PNG.
///
/// Available only for completed jobs; failed jobs serve no partial results.
pub async fn badge(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let job_id = Uuid::parse_str(&id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid job ID".to_string()))?;
    let badges = state.badges.read().await;
    let job_badges = badges.get(&job_id).ok_or((
        StatusCode::NOT_FOUND,
        "No badges for this job (unknown or not completed)".to_string(),
    ))?;
    let png = job_badges.get(index).ok_or((
        StatusCode::NOT_FOUND,
        format!("Badge index {} out of range", index),
    ))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png.clone()))
}

/// Drive one job to completion and record its final status.
async fn run_job(state: Arc<AppState>, job_id: Uuid, request: JobRequest) {
    match execute_job(&state, job_id, request).await {
        Ok(badge_count) => {
            println!("[job {}] completed ({} badges)", job_id, badge_count);
            let mut jobs = state.jobs.write().await;
            jobs.insert(job_id, JobStatus::Completed { badge_count });
        }
        Err(e) => {
            eprintln!("[job {}] failed: {}", job_id, e);
            let mut jobs = state.jobs.write().await;
            jobs.insert(job_id, JobStatus::Failed { error: e.to_string() });
        }
    }
}

/// Resolve the template, run generation on the blocking pool, and forward
/// progress ticks from the worker into the shared job map.
async fn execute_job(
    state: &Arc<AppState>,
    job_id: Uuid,
    request: JobRequest,
) -> Result<usize, LanyardError> {
    let template = resolve_template(state, &request).await?;

    // Progress channel: the synchronous worker sends (current, total) ticks,
    // the listener translates them into Processing status updates.
    let (progress_tx, mut progress_rx) = mpsc::channel::<(usize, usize)>(100);
    let listener_state = state.clone();
    let listener = tokio::spawn(async move {
        while let Some((current, total)) = progress_rx.recv().await {
            let mut jobs = listener_state.jobs.write().await;
            jobs.insert(job_id, JobStatus::Processing { current, total });
        }
    });

    let JobRequest {
        template_width,
        template_height,
        fields,
        mapping,
        rows,
        ..
    } = request;

    let result = tokio::task::spawn_blocking(move || {
        let registry = FontRegistry::global()?;
        generate_badges(
            &template,
            template_width,
            template_height,
            &fields,
            &mapping,
            &rows,
            registry,
            |current, total| {
                let _ = progress_tx.blocking_send((current, total));
            },
        )
    })
    .await;

    // The worker dropped its sender, whatever the outcome; drain the last
    // ticks before returning so neither Completed nor Failed races behind
    // a stale Processing update.
    let _ = listener.await;

    let badges = result.map_err(|e| LanyardError::Server(format!("Job task error: {}", e)))??;

    let badge_count = badges.len();
    state.badges.write().await.insert(job_id, badges);
    Ok(badge_count)
}

async fn resolve_template(
    state: &Arc<AppState>,
    request: &JobRequest,
) -> Result<DynamicImage, LanyardError> {
    if let Some(id) = request.template_id {
        let mut templates = state.templates.write().await;
        let session = templates.get_mut(&id).ok_or_else(|| {
            LanyardError::Template(format!("unknown template session {}", id))
        })?;
        session.touch();
        return Ok(session.image.clone());
    }
    if let Some(url) = &request.template_url {
        return fetch_template(url).await;
    }
    if let Some(path) = &request.template_path {
        let path = PathBuf::from(path);
        return tokio::task::spawn_blocking(move || load_template(&path))
            .await
            .map_err(|e| LanyardError::Server(format!("Template load task error: {}", e)))?;
    }
    Err(LanyardError::Template(
        "job request needs one of template_id, template_path, template_url".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::state::ServerConfig;
    use image::RgbaImage;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(ServerConfig {
            listen_addr: String::new(),
        }))
    }

    fn white_template() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            100,
            50,
            image::Rgba([255, 255, 255, 255]),
        ))
    }

    fn request(template_id: Option<Uuid>) -> JobRequest {
        JobRequest {
            template_id,
            template_path: None,
            template_url: None,
            template_width: 100,
            template_height: 50,
            fields: Vec::new(),
            mapping: FieldMapping::new(),
            rows: vec![DataRow::new(), DataRow::new()],
        }
    }

    #[tokio::test]
    async fn test_job_completes_against_uploaded_template() {
        let state = test_state();
        let template_id = Uuid::new_v4();
        state
            .templates
            .write()
            .await
            .insert(template_id, TemplateSession::new(white_template()));

        let job_id = Uuid::new_v4();
        state.jobs.write().await.insert(job_id, JobStatus::Pending);
        run_job(state.clone(), job_id, request(Some(template_id))).await;

        let jobs = state.jobs.read().await;
        match jobs.get(&job_id) {
            Some(JobStatus::Completed { badge_count }) => assert_eq!(*badge_count, 2),
            other => panic!("expected completed, got {:?}", other),
        }
        let badges = state.badges.read().await;
        assert_eq!(badges.get(&job_id).map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_job_fails_for_unknown_template_session() {
        let state = test_state();
        let job_id = Uuid::new_v4();
        state.jobs.write().await.insert(job_id, JobStatus::Pending);
        run_job(state.clone(), job_id, request(Some(Uuid::new_v4()))).await;

        let jobs = state.jobs.read().await;
        match jobs.get(&job_id) {
            Some(JobStatus::Failed { error }) => {
                assert!(error.contains("unknown template session"));
            }
            other => panic!("expected failed, got {:?}", other),
        }
        // Failed jobs serve no partial results.
        assert!(state.badges.read().await.get(&job_id).is_none());
    }

    #[tokio::test]
    async fn test_failed_job_status_is_never_overwritten() {
        let state = test_state();
        let template_id = Uuid::new_v4();
        state
            .templates
            .write()
            .await
            .insert(template_id, TemplateSession::new(white_template()));

        // Zero width makes the worker fail after the progress channel and
        // its listener are already running.
        let mut request = request(Some(template_id));
        request.template_width = 0;

        let job_id = Uuid::new_v4();
        state.jobs.write().await.insert(job_id, JobStatus::Pending);
        run_job(state.clone(), job_id, request).await;

        // Give any straggling listener writes a chance to land, then
        // confirm the terminal status stuck.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let jobs = state.jobs.read().await;
        match jobs.get(&job_id) {
            Some(JobStatus::Failed { error }) => {
                assert!(error.contains("invalid badge dimensions"));
            }
            other => panic!("expected failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_job_request_needs_a_template_source() {
        let state = test_state();
        let err = resolve_template(&state, &request(None)).await.unwrap_err();
        assert!(matches!(err, LanyardError::Template(_)));
    }
}
