use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::export::{export_response, APPLICATIONS_FILE};
use crate::jobs::{load_applications, load_jobs};
use crate::models::{Application, Job, RecordId};
use crate::session::SessionContext;
use crate::state::AppState;
use crate::views::applications::{
    application_job_options, filter_applications, summarize_applications, ApplicationSummary,
    JobOption,
};
use crate::views::dashboard::{compute_dashboard_stats, recent_jobs, DashboardStats, RECENT_JOBS_LIMIT};
use crate::views::SortOrder;

#[derive(Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_jobs: Vec<Job>,
}

#[derive(Deserialize, Default)]
pub struct ApplicationsQuery {
    pub job_id: Option<String>,
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Serialize)]
pub struct ApplicationsResponse {
    pub summary: ApplicationSummary,
    pub job_options: Vec<JobOption>,
    pub applications: Vec<Application>,
}

/// GET /api/v1/dashboard
pub async fn handle_dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let jobs = load_jobs(state.store.as_ref()).await;
    let applications = load_applications(state.store.as_ref(), false).await;

    Json(DashboardResponse {
        stats: compute_dashboard_stats(&jobs, &applications),
        recent_jobs: recent_jobs(&jobs, RECENT_JOBS_LIMIT),
    })
}

/// GET /api/v1/applications
///
/// Summary and job options cover every application; the list honours the
/// job filter, search and sort.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    session: SessionContext,
    Query(params): Query<ApplicationsQuery>,
) -> Result<Json<ApplicationsResponse>, AppError> {
    session.require_admin()?;
    let all = load_applications(state.store.as_ref(), true).await;

    Ok(Json(ApplicationsResponse {
        summary: summarize_applications(&all),
        job_options: application_job_options(&all),
        applications: visible_applications(&all, &params),
    }))
}

/// GET /api/v1/applications/export
///
/// Exports what the list shows for the same query.
pub async fn handle_export_applications(
    State(state): State<AppState>,
    session: SessionContext,
    Query(params): Query<ApplicationsQuery>,
) -> Result<Response, AppError> {
    session.require_admin()?;
    let all = load_applications(state.store.as_ref(), true).await;
    export_response(&visible_applications(&all, &params), "applications", APPLICATIONS_FILE)
}

fn visible_applications(all: &[Application], params: &ApplicationsQuery) -> Vec<Application> {
    let job_filter = params
        .job_id
        .as_deref()
        .map(RecordId::from)
        .filter(|id| !id.is_empty());
    filter_applications(all, job_filter.as_ref(), &params.q, params.sort)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::prefs::memory::MemoryKeyValueStore;
    use crate::prefs::Prefs;
    use crate::redis_conn::SharedRedis;
    use crate::store::memory::MemoryRecordStore;

    fn state() -> AppState {
        let store = MemoryRecordStore::with_records(
            vec![
                json!({"id": 1, "title": "Backend Engineer", "company": "Acme"}),
                json!({"id": 2, "title": "Designer", "company": "Globex"}),
            ],
            vec![
                json!({"id": 10, "job_id": 1, "name": "Ada", "email": "ada@x.io", "created_at": "2024-01-01T00:00:00Z"}),
                json!({"id": 11, "job_id": 2, "name": "Grace", "email": "grace@x.io", "created_at": "2024-01-02T00:00:00Z"}),
                json!({"id": 12, "job_id": 1, "name": "Linus", "email": "linus@x.io", "created_at": "2024-01-03T00:00:00Z"}),
            ],
        );
        AppState {
            store: Arc::new(store),
            redis: SharedRedis::new(redis::Client::open("redis://127.0.0.1:6379").unwrap()),
            config: Config::for_tests("pw"),
        }
    }

    fn admin() -> SessionContext {
        SessionContext {
            session_id: "admin-tab".into(),
            is_admin: true,
            prefs: Prefs::new(Arc::new(MemoryKeyValueStore::new())),
        }
    }

    fn query(job_id: Option<&str>, q: &str, sort: SortOrder) -> ApplicationsQuery {
        ApplicationsQuery {
            job_id: job_id.map(str::to_string),
            q: q.to_string(),
            sort,
        }
    }

    async fn export_text(params: ApplicationsQuery) -> (StatusCode, String) {
        let response = handle_export_applications(State(state()), admin(), Query(params))
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_export_honours_job_filter_and_sort() {
        let (status, csv) = export_text(query(Some("1"), "", SortOrder::Oldest)).await;
        assert_eq!(status, StatusCode::OK);

        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("\"Ada\""));
        assert!(rows[1].contains("\"Linus\""));
        assert!(rows.iter().all(|r| r.starts_with("\"Backend Engineer\"")));
        assert!(!csv.contains("Grace"));
    }

    #[tokio::test]
    async fn test_export_honours_search() {
        let (_, csv) = export_text(query(None, "designer", SortOrder::Newest)).await;
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("\"Grace\""));
    }

    #[tokio::test]
    async fn test_export_with_no_matches_is_no_content() {
        let (status, body) = export_text(query(Some("2"), "ada", SortOrder::Newest)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_export_requires_admin() {
        let mut session = admin();
        session.is_admin = false;
        let err = handle_export_applications(
            State(state()),
            session,
            Query(query(None, "", SortOrder::Newest)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
