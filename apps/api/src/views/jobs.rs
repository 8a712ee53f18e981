use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Application, Job, RecordId};
use crate::views::{contains_ci, sort_by_created, SortOrder};

pub const OTHER_COMPANY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyGroup {
    pub company: String,
    pub jobs: Vec<Job>,
}

/// Case-insensitive substring match on title AND location.
pub fn filter_jobs<'a>(jobs: &'a [Job], title_query: &str, location_query: &str) -> Vec<&'a Job> {
    let title_query = title_query.to_lowercase();
    let location_query = location_query.to_lowercase();
    jobs.iter()
        .filter(|j| contains_ci(&j.title, &title_query) && contains_ci(&j.location, &location_query))
        .collect()
}

pub fn count_applications_by_job(applications: &[Application]) -> HashMap<RecordId, usize> {
    let mut counts = HashMap::new();
    for job_id in applications.iter().filter_map(Application::job_ref) {
        *counts.entry(job_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// Search (title OR company OR location), sort by creation time, then bucket
/// by company. Groups appear in the order their first job appears after
/// sorting; blank companies land in `"Other"`.
pub fn group_saved_jobs_by_company(
    jobs: &[Job],
    search_term: &str,
    sort_order: SortOrder,
) -> Vec<CompanyGroup> {
    let term = search_term.trim().to_lowercase();
    let mut filtered: Vec<Job> = jobs
        .iter()
        .filter(|j| {
            term.is_empty()
                || contains_ci(&j.title, &term)
                || contains_ci(&j.company, &term)
                || contains_ci(&j.location, &term)
        })
        .cloned()
        .collect();

    sort_by_created(&mut filtered, sort_order, |j| j.created_at);

    let mut groups: Vec<CompanyGroup> = Vec::new();
    for job in filtered {
        let company = if job.company.trim().is_empty() {
            OTHER_COMPANY.to_string()
        } else {
            job.company.clone()
        };
        match groups.iter_mut().find(|g| g.company == company) {
            Some(group) => group.jobs.push(job),
            None => groups.push(CompanyGroup {
                company,
                jobs: vec![job],
            }),
        }
    }
    groups
}

/// Re-orders fetched jobs to match the saved order. Ids with no fetched job
/// (deleted since saving) are dropped.
pub fn resolve_saved_jobs(saved_ids: &[RecordId], fetched_jobs: &[Job]) -> Vec<Job> {
    saved_ids
        .iter()
        .filter_map(|id| fetched_jobs.iter().find(|j| &j.id == id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn job(id: &str, title: &str, company: &str, location: &str, day: Option<u32>) -> Job {
        Job {
            id: RecordId::from(id),
            title: title.into(),
            company: company.into(),
            location: location.into(),
            created_at: day.map(|d| Utc.with_ymd_and_hms(2024, 6, d, 12, 0, 0).unwrap()),
            ..Job::default()
        }
    }

    fn sample() -> Vec<Job> {
        vec![
            job("1", "Frontend Developer", "Google", "Bangalore, India", Some(3)),
            job("2", "Backend Engineer", "Amazon", "Hyderabad, India", Some(1)),
            job("3", "Data Analyst", "Google", "Remote", None),
            job("4", "Rust Engineer", "", "Berlin", Some(2)),
        ]
    }

    #[test]
    fn test_filter_jobs_empty_queries_match_all() {
        let jobs = sample();
        assert_eq!(filter_jobs(&jobs, "", "").len(), jobs.len());
    }

    #[test]
    fn test_filter_jobs_is_and_case_insensitive() {
        let jobs = sample();
        let hits = filter_jobs(&jobs, "ENGINEER", "india");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, RecordId::from("2"));
        assert!(filter_jobs(&jobs, "engineer", "remote").is_empty());
    }

    #[test]
    fn test_filter_jobs_missing_fields_only_match_empty_query() {
        let jobs = vec![Job::default()];
        assert_eq!(filter_jobs(&jobs, "", "").len(), 1);
        assert!(filter_jobs(&jobs, "x", "").is_empty());
    }

    #[test]
    fn test_count_applications_skips_missing_job_reference() {
        let apps = vec![
            Application { job_id: Some("1".into()), ..Application::default() },
            Application { job_id: Some(RecordId::from(1)), ..Application::default() },
            Application { job_id: None, ..Application::default() },
            Application { job_id: Some("2".into()), ..Application::default() },
        ];
        let counts = count_applications_by_job(&apps);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&RecordId::from(1)], 2);
        assert_eq!(counts[&RecordId::from(2)], 1);
    }

    #[test]
    fn test_group_newest_first_with_other_bucket() {
        let groups = group_saved_jobs_by_company(&sample(), "", SortOrder::Newest);
        let companies: Vec<_> = groups.iter().map(|g| g.company.as_str()).collect();
        assert_eq!(companies, vec!["Google", "Other", "Amazon"]);
        let google: Vec<_> = groups[0].jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(google, vec!["1", "3"]);
    }

    #[test]
    fn test_group_oldest_puts_untimed_first() {
        let groups = group_saved_jobs_by_company(&sample(), "", SortOrder::Oldest);
        assert_eq!(groups[0].company, "Google");
        assert_eq!(groups[0].jobs[0].id, RecordId::from("3"));
        assert_eq!(groups[0].jobs[1].id, RecordId::from("1"));
    }

    #[test]
    fn test_group_search_matches_any_field() {
        let by_company = group_saved_jobs_by_company(&sample(), "amazon", SortOrder::Newest);
        assert_eq!(by_company.len(), 1);
        let by_location = group_saved_jobs_by_company(&sample(), "  BERLIN ", SortOrder::Newest);
        assert_eq!(by_location[0].company, OTHER_COMPANY);
        assert!(group_saved_jobs_by_company(&sample(), "cobol", SortOrder::Newest).is_empty());
    }

    #[test]
    fn test_resolve_preserves_saved_order_and_drops_missing() {
        let fetched = vec![
            job("a", "", "", "", None),
            job("b", "", "", "", None),
            job("c", "", "", "", None),
        ];
        let saved = vec![RecordId::from("b"), RecordId::from("a")];
        let ids: Vec<_> = resolve_saved_jobs(&saved, &fetched)
            .into_iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(ids, vec![RecordId::from("b"), RecordId::from("a")]);

        let saved = vec![RecordId::from("zz"), RecordId::from("c")];
        assert_eq!(resolve_saved_jobs(&saved, &fetched).len(), 1);
    }
}
