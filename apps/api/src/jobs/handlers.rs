use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::export::{export_response, SAVED_JOBS_FILE};
use crate::jobs::saved::SavedJobSet;
use crate::jobs::{
    delete_job_cascade, find_job, load_applications, load_applications_for_job, load_jobs,
    load_jobs_by_ids, post_job,
};
use crate::models::{Application, Job, NewJob, RecordId};
use crate::session::SessionContext;
use crate::state::AppState;
use crate::views::applications::posted_label;
use crate::views::jobs::{
    count_applications_by_job, filter_jobs, group_saved_jobs_by_company, resolve_saved_jobs,
    CompanyGroup,
};
use crate::views::SortOrder;

#[derive(Deserialize, Default)]
pub struct JobListQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Serialize)]
pub struct JobListItem {
    #[serde(flatten)]
    pub job: Job,
    pub applications_count: usize,
    pub saved: bool,
}

#[derive(Serialize)]
pub struct JobListResponse {
    pub total: usize,
    pub jobs: Vec<JobListItem>,
}

#[derive(Serialize)]
pub struct JobDetailResponse {
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_label: Option<String>,
    pub saved: bool,
    /// Admin only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<Application>>,
}

#[derive(Serialize)]
pub struct DeleteJobResponse {
    pub job_id: RecordId,
    pub deleted_applications: u64,
}

#[derive(Deserialize, Default)]
pub struct SavedQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Serialize)]
pub struct SavedJobsResponse {
    pub total: usize,
    pub groups: Vec<CompanyGroup>,
}

#[derive(Serialize)]
pub struct ToggleSavedResponse {
    pub job_id: RecordId,
    pub saved: bool,
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    session: SessionContext,
    Query(params): Query<JobListQuery>,
) -> Json<JobListResponse> {
    let jobs = load_jobs(state.store.as_ref()).await;
    let applications = load_applications(state.store.as_ref(), false).await;
    let counts = count_applications_by_job(&applications);
    let saved = SavedJobSet::load(&session.prefs).await;

    let items: Vec<JobListItem> = filter_jobs(&jobs, &params.title, &params.location)
        .into_iter()
        .map(|job| JobListItem {
            applications_count: counts.get(&job.id).copied().unwrap_or(0),
            saved: saved.contains(&job.id),
            job: job.clone(),
        })
        .collect();

    Json(JobListResponse {
        total: items.len(),
        jobs: items,
    })
}

/// POST /api/v1/jobs
pub async fn handle_post_job(
    State(state): State<AppState>,
    session: SessionContext,
    Json(new_job): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    session.require_admin()?;
    let job = post_job(state.store.as_ref(), &new_job).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
) -> Result<Json<JobDetailResponse>, AppError> {
    let job_id = RecordId::from(id);
    let job = find_job(state.store.as_ref(), &job_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let applications = if session.is_admin {
        Some(load_applications_for_job(state.store.as_ref(), &job_id).await)
    } else {
        None
    };
    let saved = SavedJobSet::load(&session.prefs).await.contains(&job_id);

    Ok(Json(JobDetailResponse {
        posted_label: posted_label(job.created_at, Utc::now()),
        saved,
        applications,
        job,
    }))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
) -> Result<Json<DeleteJobResponse>, AppError> {
    session.require_admin()?;
    let job_id = RecordId::from(id);
    let deleted_applications = delete_job_cascade(state.store.as_ref(), &job_id).await?;
    Ok(Json(DeleteJobResponse {
        job_id,
        deleted_applications,
    }))
}

async fn saved_jobs_in_order(state: &AppState, saved: &SavedJobSet) -> Vec<Job> {
    let fetched = load_jobs_by_ids(state.store.as_ref(), saved.ids()).await;
    resolve_saved_jobs(saved.ids(), &fetched)
}

/// GET /api/v1/saved
pub async fn handle_list_saved(
    State(state): State<AppState>,
    session: SessionContext,
    Query(params): Query<SavedQuery>,
) -> Json<SavedJobsResponse> {
    let saved = SavedJobSet::load(&session.prefs).await;
    let jobs = saved_jobs_in_order(&state, &saved).await;
    let groups = group_saved_jobs_by_company(&jobs, &params.q, params.sort);

    Json(SavedJobsResponse {
        total: groups.iter().map(|g| g.jobs.len()).sum(),
        groups,
    })
}

/// POST /api/v1/saved/:id/toggle
pub async fn handle_toggle_saved(
    session: SessionContext,
    Path(id): Path<String>,
) -> Result<Json<ToggleSavedResponse>, AppError> {
    let job_id = RecordId::from(id);
    if job_id.is_empty() {
        return Err(AppError::Validation("Job id is required".to_string()));
    }
    let mut saved = SavedJobSet::load(&session.prefs).await;
    let now_saved = saved.toggle(job_id.clone());
    saved.persist(&session.prefs).await;

    Ok(Json(ToggleSavedResponse {
        job_id,
        saved: now_saved,
    }))
}

/// DELETE /api/v1/saved/:id
pub async fn handle_remove_saved(session: SessionContext, Path(id): Path<String>) -> StatusCode {
    let job_id = RecordId::from(id);
    let mut saved = SavedJobSet::load(&session.prefs).await;
    if saved.remove(&job_id) {
        saved.persist(&session.prefs).await;
    }
    StatusCode::NO_CONTENT
}

/// DELETE /api/v1/saved
pub async fn handle_clear_saved(session: SessionContext) -> StatusCode {
    SavedJobSet::clear(&session.prefs).await;
    info!("Cleared saved jobs for session {}", session.session_id);
    StatusCode::NO_CONTENT
}

/// GET /api/v1/saved/export
pub async fn handle_export_saved(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Response, AppError> {
    let saved = SavedJobSet::load(&session.prefs).await;
    let jobs = saved_jobs_in_order(&state, &saved).await;
    export_response(&jobs, "saved jobs", SAVED_JOBS_FILE)
}
