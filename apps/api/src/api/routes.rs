use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    analytics, auth, categories, departments, grievances, users,
};
use crate::state::AppState;

/// Builds the application router with tracing and CORS layers
pub fn router(state: AppState) -> Router {
    let app: Router<AppState> = Router::new()
        // Health check
        .route("/health", get(auth::health_check))
        .route("/health/db", get(auth::db_health_check))
        // Auth routes
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/token", post(auth::token))
        .route("/api/auth/token/refresh", post(auth::refresh))
        .route("/api/auth/me", get(auth::me).patch(auth::update_me))
        // Admin user management
        .route(
            "/api/admin/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/api/admin/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/admin/user-status", get(users::user_status))
        .route("/api/admin/change-logs", get(users::recent_change_logs))
        // Catalog
        .route(
            "/api/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/api/departments/:id",
            get(departments::get_department)
                .put(departments::replace_department)
                .patch(departments::update_department)
                .delete(departments::delete_department),
        )
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/categories/:id",
            get(categories::get_category)
                .put(categories::replace_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        // Grievances
        .route(
            "/api/grievances",
            get(grievances::list_grievances).post(grievances::create_grievance),
        )
        .route(
            "/api/grievances/track/:tracking_id",
            get(grievances::track_grievance),
        )
        .route(
            "/api/grievances/:id",
            get(grievances::get_grievance)
                .patch(grievances::update_grievance)
                .delete(grievances::delete_grievance),
        )
        .route(
            "/api/grievances/:id/assign",
            post(grievances::assign_grievance),
        )
        .route(
            "/api/grievances/:id/remarks",
            get(grievances::list_remarks).post(grievances::add_remark),
        )
        .route(
            "/api/grievances/:id/feedback",
            post(grievances::submit_feedback),
        )
        .route(
            "/api/grievances/:id/history",
            get(grievances::grievance_history),
        )
        // Analytics
        .route("/api/admin/analytics", get(analytics::admin_analytics))
        .route("/api/officer/dashboard", get(analytics::officer_dashboard))
        .layer(TraceLayer::new_for_http());

    let app = if state.config.cors_allow_any {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    };

    app.with_state(state)
}
