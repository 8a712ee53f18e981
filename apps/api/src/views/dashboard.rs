use std::collections::HashMap;
use std::collections::HashSet;

use serde::Serialize;

use crate::models::{Application, Job, RecordId};
use crate::views::{sort_by_created, SortOrder};

pub const RECENT_JOBS_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostAppliedJob {
    #[serde(flatten)]
    pub job: Job,
    pub applications: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_jobs: usize,
    pub total_applications: usize,
    pub average_per_job: f64,
    pub unique_company_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_applied_job: Option<MostAppliedJob>,
}

/// Headline numbers for the home dashboard.
///
/// `most_applied_job` ties go to the job id seen first while walking
/// `applications` in the order given.
pub fn compute_dashboard_stats(jobs: &[Job], applications: &[Application]) -> DashboardStats {
    let total_jobs = jobs.len();
    let total_applications = applications.len();

    let average_per_job = if total_jobs == 0 {
        0.0
    } else {
        round_one_decimal(total_applications as f64 / total_jobs as f64)
    };

    let unique_company_count = jobs
        .iter()
        .map(|j| j.company.trim())
        .filter(|c| !c.is_empty())
        .collect::<HashSet<_>>()
        .len();

    DashboardStats {
        total_jobs,
        total_applications,
        average_per_job,
        unique_company_count,
        most_applied_job: most_applied_job(jobs, applications),
    }
}

fn most_applied_job(jobs: &[Job], applications: &[Application]) -> Option<MostAppliedJob> {
    let mut counts: HashMap<&RecordId, usize> = HashMap::new();
    let mut first_seen: Vec<&RecordId> = Vec::new();
    for job_id in applications.iter().filter_map(Application::job_ref) {
        let count = counts.entry(job_id).or_insert(0);
        if *count == 0 {
            first_seen.push(job_id);
        }
        *count += 1;
    }

    let mut best: Option<(&RecordId, usize)> = None;
    for job_id in first_seen {
        let count = counts[job_id];
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((job_id, count));
        }
    }

    let (job_id, applications) = best?;
    let job = jobs.iter().find(|j| &j.id == job_id)?;
    Some(MostAppliedJob {
        job: job.clone(),
        applications,
    })
}

/// The newest `limit` jobs.
pub fn recent_jobs(jobs: &[Job], limit: usize) -> Vec<Job> {
    let mut sorted = jobs.to_vec();
    sort_by_created(&mut sorted, SortOrder::Newest, |j| j.created_at);
    sorted.truncate(limit);
    sorted
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
