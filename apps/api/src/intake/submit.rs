// Application submission: `Idle → Validating → CheckingDuplicate →
// Submitting → {Success | Rejected | Failed}`.
//
// Store reads on the way in (job lookup, duplicate check) fail open: when
// they error the submission proceeds. The `(job_id, email)` unique index
// on the store is the backstop for anything the read missed.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::intake::drafts::{clear_draft, remember_applicant};
use crate::intake::validation::{
    validate_application, ApplicationForm, FieldErrors, FormField, IntakeRules,
};
use crate::models::{Application, Job, NewApplication, RecordId};
use crate::prefs::Prefs;
use crate::store::{select_one_as, Collection, Filter, RecordStore, SelectQuery, StoreError};

pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit application. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeState {
    Idle,
    Validating,
    CheckingDuplicate,
    Submitting,
    Success,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    Invalid {
        errors: FieldErrors,
        primary: FormField,
    },
    AlreadyApplied,
    JobNotFound,
    JobClosed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmittedApplication {
    pub job_title: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<Application>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntakeOutcome {
    Success(SubmittedApplication),
    Rejected(RejectReason),
    /// Store write failed. The draft is left in place so the user can retry.
    Failed(String),
}

/// One submission attempt against a store and a session's prefs.
pub struct ApplicationIntake<'a> {
    store: &'a dyn RecordStore,
    prefs: &'a Prefs,
    rules: IntakeRules,
    state: IntakeState,
}

impl<'a> ApplicationIntake<'a> {
    pub fn new(store: &'a dyn RecordStore, prefs: &'a Prefs, rules: IntakeRules) -> Self {
        Self {
            store,
            prefs,
            rules,
            state: IntakeState::Idle,
        }
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    fn transition(&mut self, next: IntakeState) {
        debug!("intake: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn reject(&mut self, reason: RejectReason) -> IntakeOutcome {
        self.transition(IntakeState::Rejected);
        IntakeOutcome::Rejected(reason)
    }

    pub async fn submit(&mut self, job_id: &RecordId, form: &ApplicationForm) -> IntakeOutcome {
        self.transition(IntakeState::Validating);

        let errors = validate_application(form, &self.rules);
        if let Some(primary) = errors.primary() {
            return self.reject(RejectReason::Invalid { errors, primary });
        }
        let form = form.trimmed();

        let job = match self.load_job(job_id).await {
            Ok(Some(job)) if job.is_closed() => return self.reject(RejectReason::JobClosed),
            Ok(Some(job)) => Some(job),
            Ok(None) => return self.reject(RejectReason::JobNotFound),
            Err(e) => {
                warn!("Error loading job {job_id} before submit, continuing: {e}");
                None
            }
        };

        self.transition(IntakeState::CheckingDuplicate);
        if self.already_applied(job_id, &form.email).await {
            info!("Duplicate application blocked for job {job_id}");
            return self.reject(RejectReason::AlreadyApplied);
        }

        self.transition(IntakeState::Submitting);
        let record = NewApplication {
            job_id: job_id.clone(),
            name: form.name.clone(),
            email: form.email.clone(),
            resume_url: form.resume_url.clone(),
            intro: form.intro.clone(),
        };
        let row = match serde_json::to_value(&record) {
            Ok(row) => row,
            Err(e) => {
                error!("Could not encode application: {e}");
                self.transition(IntakeState::Failed);
                return IntakeOutcome::Failed(SUBMIT_FAILED_MESSAGE.to_string());
            }
        };

        match self.store.insert(Collection::Applications, row).await {
            Ok(stored) => {
                remember_applicant(self.prefs, &form.name, &form.email).await;
                clear_draft(self.prefs, job_id).await;
                self.transition(IntakeState::Success);
                info!("Application submitted for job {job_id}");

                IntakeOutcome::Success(SubmittedApplication {
                    job_title: job
                        .map(|j| j.title)
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| "this job".to_string()),
                    email: form.email,
                    application: decode_stored(stored),
                })
            }
            Err(StoreError::UniqueViolation(_)) => {
                info!("Store rejected duplicate application for job {job_id}");
                self.reject(RejectReason::AlreadyApplied)
            }
            Err(e) => {
                error!("Error submitting application: {e}");
                self.transition(IntakeState::Failed);
                IntakeOutcome::Failed(SUBMIT_FAILED_MESSAGE.to_string())
            }
        }
    }

    async fn load_job(&self, job_id: &RecordId) -> Result<Option<Job>, StoreError> {
        select_one_as(self.store, Collection::Jobs, &Filter::new().eq("id", job_id)).await
    }

    async fn already_applied(&self, job_id: &RecordId, email: &str) -> bool {
        let query = SelectQuery::new()
            .filter(Filter::new().eq("job_id", job_id).eq("email", email))
            .limit(1);
        match self.store.select(Collection::Applications, &query).await {
            Ok(rows) => !rows.is_empty(),
            Err(e) => {
                warn!("Error checking existing application, proceeding: {e}");
                false
            }
        }
    }
}

fn decode_stored(row: Value) -> Option<Application> {
    serde_json::from_value(row)
        .map_err(|e| warn!("Stored application did not decode: {e}"))
        .ok()
}
