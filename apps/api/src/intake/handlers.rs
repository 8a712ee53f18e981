use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::intake::drafts::{
    application_summary_text, apply_profile, clear_draft, initial_form, load_profile, save_draft,
    save_profile, ApplicantProfile, InitialForm, INTRO_TEMPLATES,
};
use crate::intake::submit::{
    ApplicationIntake, IntakeOutcome, RejectReason, SubmittedApplication,
};
use crate::intake::validation::{validate_application, ApplicationForm, FieldErrors};
use crate::jobs::{find_job, load_applications_for_job};
use crate::models::{Job, RecordId};
use crate::session::SessionContext;
use crate::state::AppState;
use crate::views::applications::form_progress;

#[derive(Deserialize, Default)]
pub struct ApplyPageQuery {
    /// Prefill from the saved applicant profile.
    #[serde(default)]
    pub use_profile: bool,
}

#[derive(Serialize)]
pub struct ApplyPageResponse {
    pub job: Job,
    #[serde(flatten)]
    pub initial: InitialForm,
    pub progress: u8,
    pub applications_count: usize,
    pub summary: String,
    pub intro_templates: &'static [&'static str],
}

#[derive(Serialize)]
pub struct DraftResponse {
    pub saved: bool,
    pub progress: u8,
    pub errors: FieldErrors,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub profile: Option<ApplicantProfile>,
    pub intro_templates: &'static [&'static str],
}

/// GET /api/v1/jobs/:id/apply
pub async fn handle_apply_page(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
    Query(params): Query<ApplyPageQuery>,
) -> Result<Json<ApplyPageResponse>, AppError> {
    let job_id = RecordId::from(id);
    let job = find_job(state.store.as_ref(), &job_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let mut initial = initial_form(&session.prefs, &job_id).await;
    if params.use_profile {
        if let Some(profile) = load_profile(&session.prefs).await {
            initial.form = apply_profile(&initial.form, &profile);
        }
    }
    let applications_count = load_applications_for_job(state.store.as_ref(), &job_id)
        .await
        .len();

    Ok(Json(ApplyPageResponse {
        progress: form_progress(&initial.form, &state.intake_rules()),
        summary: application_summary_text(Some(&job), &initial.form),
        applications_count,
        intro_templates: INTRO_TEMPLATES,
        initial,
        job,
    }))
}

/// PUT /api/v1/jobs/:id/draft
///
/// Stores the form as typed and reports live validation without rejecting.
pub async fn handle_save_draft(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
    Json(form): Json<ApplicationForm>,
) -> Json<DraftResponse> {
    let job_id = RecordId::from(id);
    let rules = state.intake_rules();
    let saved = save_draft(&session.prefs, &job_id, &form).await;

    Json(DraftResponse {
        saved,
        progress: form_progress(&form, &rules),
        errors: validate_application(&form, &rules),
    })
}

/// DELETE /api/v1/jobs/:id/draft
pub async fn handle_clear_draft(session: SessionContext, Path(id): Path<String>) -> StatusCode {
    clear_draft(&session.prefs, &RecordId::from(id)).await;
    StatusCode::NO_CONTENT
}

/// POST /api/v1/jobs/:id/applications
pub async fn handle_submit_application(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<String>,
    Json(form): Json<ApplicationForm>,
) -> Result<(StatusCode, Json<SubmittedApplication>), AppError> {
    let job_id = RecordId::from(id);
    let mut intake = ApplicationIntake::new(state.store.as_ref(), &session.prefs, state.intake_rules());
    let outcome = intake.submit(&job_id, &form).await;
    debug!(
        "Intake for job {job_id} in session {} ended in {:?}",
        session.session_id,
        intake.state()
    );

    match outcome {
        IntakeOutcome::Success(submitted) => Ok((StatusCode::CREATED, Json(submitted))),
        IntakeOutcome::Rejected(RejectReason::Invalid { errors, primary }) => {
            info!("Application for job {job_id} rejected, first invalid field {primary:?}");
            Err(AppError::FieldValidation(errors))
        }
        IntakeOutcome::Rejected(RejectReason::AlreadyApplied) => Err(AppError::DuplicateApplication),
        IntakeOutcome::Rejected(RejectReason::JobClosed) => Err(AppError::JobClosed),
        IntakeOutcome::Rejected(RejectReason::JobNotFound) => {
            Err(AppError::NotFound(format!("Job {job_id} not found")))
        }
        IntakeOutcome::Failed(message) => Err(AppError::SubmissionFailed(message)),
    }
}

/// GET /api/v1/profile
pub async fn handle_get_profile(session: SessionContext) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        profile: load_profile(&session.prefs).await,
        intro_templates: INTRO_TEMPLATES,
    })
}

/// PUT /api/v1/profile
pub async fn handle_put_profile(
    session: SessionContext,
    Json(form): Json<ApplicationForm>,
) -> Result<Json<ApplicantProfile>, AppError> {
    let profile = save_profile(&session.prefs, &form).await?;
    info!("Saved applicant profile for session {}", session.session_id);
    Ok(Json(profile))
}
