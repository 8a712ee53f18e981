pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::intake::handlers as intake;
use crate::jobs::handlers as jobs;
use crate::session::handlers as session;
use crate::state::AppState;
use crate::views::handlers as views;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/dashboard", get(views::handle_dashboard))
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_post_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job).delete(jobs::handle_delete_job),
        )
        // Intake
        .route("/api/v1/jobs/:id/apply", get(intake::handle_apply_page))
        .route(
            "/api/v1/jobs/:id/draft",
            put(intake::handle_save_draft).delete(intake::handle_clear_draft),
        )
        .route(
            "/api/v1/jobs/:id/applications",
            post(intake::handle_submit_application),
        )
        .route(
            "/api/v1/profile",
            get(intake::handle_get_profile).put(intake::handle_put_profile),
        )
        // Admin applications view
        .route("/api/v1/applications", get(views::handle_list_applications))
        .route(
            "/api/v1/applications/export",
            get(views::handle_export_applications),
        )
        // Saved jobs
        .route(
            "/api/v1/saved",
            get(jobs::handle_list_saved).delete(jobs::handle_clear_saved),
        )
        .route("/api/v1/saved/export", get(jobs::handle_export_saved))
        .route("/api/v1/saved/:id", delete(jobs::handle_remove_saved))
        .route("/api/v1/saved/:id/toggle", post(jobs::handle_toggle_saved))
        // Session
        .route(
            "/api/v1/session/theme",
            get(session::handle_get_theme).put(session::handle_put_theme),
        )
        .route("/api/v1/admin/login", post(session::handle_admin_login))
        .route("/api/v1/admin/logout", post(session::handle_admin_logout))
        .with_state(state)
}
