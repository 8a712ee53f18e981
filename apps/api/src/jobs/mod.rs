// Job postings: admin post/delete, reads for the list and detail views,
// and the per-session saved-jobs set.

pub mod handlers;
pub mod saved;

use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{Application, Job, NewJob, RecordId};
use crate::store::{
    select_one_as, select_or_empty, Collection, Filter, OrderBy, RecordStore, SelectQuery,
};

/// Validates and inserts a posting. Every field is required.
pub async fn post_job(store: &dyn RecordStore, new_job: &NewJob) -> Result<Job, AppError> {
    if !new_job.is_complete() {
        return Err(AppError::Validation("Please fill all fields".to_string()));
    }
    let record = NewJob {
        title: new_job.title.trim().to_string(),
        company: new_job.company.trim().to_string(),
        location: new_job.location.trim().to_string(),
        job_type: new_job.job_type.trim().to_string(),
        description: new_job.description.trim().to_string(),
    };
    let row = serde_json::to_value(&record).map_err(|e| AppError::Internal(e.into()))?;
    let stored = store.insert(Collection::Jobs, row).await?;
    let job: Job = serde_json::from_value(stored).map_err(|e| AppError::Internal(e.into()))?;
    info!("Posted job {} ({} at {})", job.id, job.title, job.company);
    Ok(job)
}

/// Deletes a job and its applications in two steps: applications first,
/// then the job. The steps are not atomic; if the second fails the
/// applications are already gone and the job remains. An unknown job is
/// reported before anything is deleted.
pub async fn delete_job_cascade(store: &dyn RecordStore, job_id: &RecordId) -> Result<u64, AppError> {
    let existing: Option<Job> =
        select_one_as(store, Collection::Jobs, &Filter::new().eq("id", job_id)).await?;
    if existing.is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let removed = store
        .delete(Collection::Applications, &Filter::new().eq("job_id", job_id))
        .await?;
    info!("Deleted {removed} applications for job {job_id}");

    let deleted = store
        .delete(Collection::Jobs, &Filter::new().eq("id", job_id))
        .await
        .map_err(|e| {
            error!("Job {job_id} not deleted after its applications were removed: {e}");
            e
        })?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    info!("Deleted job {job_id}");
    Ok(removed)
}

/// All jobs, newest first. A failed read yields an empty list.
pub async fn load_jobs(store: &dyn RecordStore) -> Vec<Job> {
    select_or_empty(
        store,
        Collection::Jobs,
        &SelectQuery::new().order_by(OrderBy::desc("created_at")),
    )
    .await
}

pub async fn load_jobs_by_ids(store: &dyn RecordStore, ids: &[RecordId]) -> Vec<Job> {
    if ids.is_empty() {
        return Vec::new();
    }
    select_or_empty(
        store,
        Collection::Jobs,
        &SelectQuery::new().filter(Filter::new().is_in("id", ids)),
    )
    .await
}

/// All applications, newest first, optionally with their job joined in.
pub async fn load_applications(store: &dyn RecordStore, with_job: bool) -> Vec<Application> {
    let mut query = SelectQuery::new().order_by(OrderBy::desc("created_at"));
    if with_job {
        query = query.with_job();
    }
    select_or_empty(store, Collection::Applications, &query).await
}

pub async fn load_applications_for_job(store: &dyn RecordStore, job_id: &RecordId) -> Vec<Application> {
    select_or_empty(
        store,
        Collection::Applications,
        &SelectQuery::new()
            .filter(Filter::new().eq("job_id", job_id))
            .order_by(OrderBy::desc("created_at")),
    )
    .await
}

/// Single job lookup. A store failure is logged and reads as not found.
pub async fn find_job(store: &dyn RecordStore, job_id: &RecordId) -> Option<Job> {
    match select_one_as(store, Collection::Jobs, &Filter::new().eq("id", job_id)).await {
        Ok(job) => job,
        Err(e) => {
            warn!("Error loading job {job_id}: {e}");
            None
        }
    }
}
