// Per-session form persistence: drafts, last-used identity, applicant profile.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::intake::validation::{ApplicationDraft, ApplicationForm};
use crate::models::{Job, RecordId};
use crate::prefs::{keys, Prefs};

pub const INTRO_TEMPLATES: &[&str] = &[
    "I have strong experience with the required technologies and I'm confident I can quickly start contributing to your team.",
    "I'm excited about this role because it perfectly matches my skills and long-term career goals.",
    "I've previously worked on similar projects and would love to bring that experience to your organisation.",
];

/// Reusable applicant details, independent of any job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub resume_url: String,
    #[serde(default)]
    pub intro_template: String,
}

/// What the apply page starts with.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InitialForm {
    pub form: ApplicationForm,
    pub draft_loaded: bool,
    pub has_profile: bool,
}

pub async fn load_draft(prefs: &Prefs, job_id: &RecordId) -> Option<ApplicationDraft> {
    prefs.get_json(&keys::draft(job_id)).await
}

/// Overwrites the stored draft, or removes it once every field is blank.
/// Returns whether a draft is stored afterwards.
pub async fn save_draft(prefs: &Prefs, job_id: &RecordId, form: &ApplicationForm) -> bool {
    let key = keys::draft(job_id);
    if form.is_blank() {
        prefs.remove(&key).await;
        return false;
    }
    prefs.set_json(&key, form).await;
    true
}

pub async fn clear_draft(prefs: &Prefs, job_id: &RecordId) {
    debug!("Clearing draft for job {job_id}");
    prefs.remove(&keys::draft(job_id)).await;
}

pub async fn remember_applicant(prefs: &Prefs, name: &str, email: &str) {
    prefs.set(keys::LAST_APPLICANT_NAME, name).await;
    prefs.set(keys::LAST_APPLICANT_EMAIL, email).await;
}

/// A stored draft wins; otherwise only last-used name and email prefill.
pub async fn initial_form(prefs: &Prefs, job_id: &RecordId) -> InitialForm {
    let has_profile = prefs.get(keys::APPLICANT_PROFILE).await.is_some();

    if let Some(draft) = load_draft(prefs, job_id).await {
        return InitialForm {
            form: draft,
            draft_loaded: true,
            has_profile,
        };
    }

    let form = ApplicationForm {
        name: prefs
            .get(keys::LAST_APPLICANT_NAME)
            .await
            .unwrap_or_default(),
        email: prefs
            .get(keys::LAST_APPLICANT_EMAIL)
            .await
            .unwrap_or_default(),
        ..ApplicationForm::default()
    };

    InitialForm {
        form,
        draft_loaded: false,
        has_profile,
    }
}

pub async fn save_profile(prefs: &Prefs, form: &ApplicationForm) -> Result<ApplicantProfile, AppError> {
    let form = form.trimmed();
    if form.name.is_empty() || form.email.is_empty() || form.resume_url.is_empty() {
        return Err(AppError::Validation(
            "Please fill at least name, email and resume link before saving profile.".to_string(),
        ));
    }

    let profile = ApplicantProfile {
        name: form.name,
        email: form.email,
        resume_url: form.resume_url,
        intro_template: form.intro,
    };
    prefs.set_json(keys::APPLICANT_PROFILE, &profile).await;
    Ok(profile)
}

pub async fn load_profile(prefs: &Prefs) -> Option<ApplicantProfile> {
    prefs.get_json(keys::APPLICANT_PROFILE).await
}

/// Fills the form from a profile. The intro template only lands in an
/// empty intro; anything the applicant already wrote is kept.
pub fn apply_profile(form: &ApplicationForm, profile: &ApplicantProfile) -> ApplicationForm {
    let pick = |current: &str, stored: &str| {
        if stored.is_empty() {
            current.to_string()
        } else {
            stored.to_string()
        }
    };

    ApplicationForm {
        name: pick(&form.name, &profile.name),
        email: pick(&form.email, &profile.email),
        resume_url: pick(&form.resume_url, &profile.resume_url),
        intro: if form.intro.trim().is_empty() && !profile.intro_template.is_empty() {
            profile.intro_template.clone()
        } else {
            form.intro.clone()
        },
    }
}

/// Plain-text summary for the "copy summary" action.
pub fn application_summary_text(job: Option<&Job>, form: &ApplicationForm) -> String {
    let or_placeholder = |v: &str, placeholder: &str| {
        let v = v.trim();
        if v.is_empty() {
            placeholder.to_string()
        } else {
            v.to_string()
        }
    };

    [
        format!("Job: {}", job.map(|j| j.title.as_str()).unwrap_or("Unknown")),
        format!("Company: {}", job.map(|j| j.company.as_str()).unwrap_or("")),
        String::new(),
        format!("Name: {}", or_placeholder(&form.name, "(not filled)")),
        format!("Email: {}", or_placeholder(&form.email, "(not filled)")),
        format!("Resume: {}", or_placeholder(&form.resume_url, "(not filled)")),
        String::new(),
        "Intro:".to_string(),
        or_placeholder(&form.intro, "(no intro written)"),
    ]
    .join("\n")
}
