use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::intake::validation::{
    email_looks_valid, intro_long_enough, resume_looks_valid, ApplicationForm, IntakeRules,
};
use crate::models::{Application, RecordId};
use crate::views::{contains_ci, sort_by_created, SortOrder};

pub const UNTITLED_JOB: &str = "Untitled job";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobOption {
    pub id: RecordId,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicationSummary {
    pub total_applications: usize,
    pub jobs_with_applications: usize,
    pub unique_applicants: usize,
}

/// Admin applications list: optional job filter, search on joined job title
/// OR applicant name, then sort by creation time.
pub fn filter_applications(
    applications: &[Application],
    job_filter: Option<&RecordId>,
    search_term: &str,
    sort_order: SortOrder,
) -> Vec<Application> {
    let term = search_term.trim().to_lowercase();
    let mut visible: Vec<Application> = applications
        .iter()
        .filter(|a| job_filter.map_or(true, |id| a.job_ref() == Some(id)))
        .filter(|a| {
            if term.is_empty() {
                return true;
            }
            let job_title = a.job.as_ref().map(|j| j.title.as_str()).unwrap_or("");
            contains_ci(job_title, &term) || contains_ci(&a.name, &term)
        })
        .cloned()
        .collect();
    sort_by_created(&mut visible, sort_order, |a| a.created_at);
    visible
}

/// Distinct jobs that have applications, for the job filter dropdown.
pub fn application_job_options(applications: &[Application]) -> Vec<JobOption> {
    let mut options: Vec<JobOption> = Vec::new();
    for app in applications {
        let Some(job_id) = app.job_ref() else { continue };
        if options.iter().any(|o| &o.id == job_id) {
            continue;
        }
        let title = app
            .job
            .as_ref()
            .map(|j| j.title.trim())
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED_JOB);
        options.push(JobOption {
            id: job_id.clone(),
            title: title.to_string(),
        });
    }
    options
}

pub fn summarize_applications(applications: &[Application]) -> ApplicationSummary {
    let jobs_with_applications = applications
        .iter()
        .filter_map(Application::job_ref)
        .collect::<HashSet<_>>()
        .len();
    let unique_applicants = applications
        .iter()
        .map(|a| a.email.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect::<HashSet<_>>()
        .len();

    ApplicationSummary {
        total_applications: applications.len(),
        jobs_with_applications,
        unique_applicants,
    }
}

/// "Posted today" / "Posted 1 day ago" / "Posted N days ago".
pub fn posted_label(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<String> {
    let days = (now - created_at?).num_days();
    Some(match days {
        d if d <= 0 => "Posted today".to_string(),
        1 => "Posted 1 day ago".to_string(),
        d => format!("Posted {d} days ago"),
    })
}

/// Share of the four intake fields that currently validate, as a percentage.
pub fn form_progress(form: &ApplicationForm, rules: &IntakeRules) -> u8 {
    let completed = [
        !form.name.trim().is_empty(),
        email_looks_valid(&form.email),
        resume_looks_valid(&form.resume_url),
        intro_long_enough(&form.intro, rules.min_intro_length),
    ]
    .iter()
    .filter(|done| **done)
    .count();
    (completed * 25) as u8
}
