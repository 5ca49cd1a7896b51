// ============================
// crates/backend-lib/src/routes.rs
// ============================
//! HTTP router assembly.
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{auth, finance, matches, notifications, social, stats, users};
use crate::{ws_router, AppState};

/// Build the complete application router
pub fn app(state: Arc<AppState>) -> Router {
    // credential endpoints get the per-client request budget
    let auth_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit,
        ));

    let api = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/users/me", put(users::update_profile))
        .route("/api/users/{id}/role", put(users::set_role))
        .route("/api/users/{id}/plan", put(users::set_plan))
        .route("/api/users/{id}/stats", get(users::user_stats))
        .route("/api/users/{id}/rate", post(stats::rate_player))
        .route("/api/user/plan-limits", get(users::plan_limits))
        .route("/api/user/payments", get(users::my_payments))
        .route(
            "/api/matches",
            get(matches::list_matches).post(matches::create_match),
        )
        .route("/api/matches/join-by-code", post(matches::join_by_code))
        .route(
            "/api/matches/{id}",
            get(matches::get_match)
                .put(matches::update_match)
                .delete(matches::delete_match),
        )
        .route(
            "/api/matches/{id}/confirm",
            post(matches::confirm).delete(matches::cancel_confirmation),
        )
        .route(
            "/api/matches/{id}/confirmations",
            get(matches::list_confirmations),
        )
        .route("/api/matches/{id}/participants", get(matches::participants))
        .route(
            "/api/matches/{id}/participants/{user_id}",
            put(matches::review_participant),
        )
        .route(
            "/api/matches/{id}/attendance/{user_id}",
            put(matches::set_attendance),
        )
        .route(
            "/api/matches/{id}/invitations",
            get(matches::list_invitations).post(matches::invite),
        )
        .route("/api/invitations/{id}", put(matches::respond_invitation))
        .route(
            "/api/matches/{id}/statistics",
            get(stats::list_statistics).post(stats::record_statistics),
        )
        .route("/api/statistics/{id}", put(stats::review_statistics))
        .route(
            "/api/matches/{id}/finances",
            get(finance::list_finances).post(finance::add_finance),
        )
        .route(
            "/api/matches/{id}/financial-report",
            get(finance::financial_report),
        )
        .route("/api/matches/{id}/payments", post(finance::request_payment))
        .route("/api/payments/{id}", put(finance::update_payment))
        .route(
            "/api/posts",
            get(social::list_posts).post(social::create_post),
        )
        .route("/api/posts/{id}/like", post(social::toggle_like))
        .route(
            "/api/posts/{id}/comments",
            get(social::list_comments).post(social::add_comment),
        )
        .route(
            "/api/friends",
            get(social::friends).post(social::send_friend_request),
        )
        .route(
            "/api/friend-requests",
            get(social::friend_requests).post(social::send_friend_request),
        )
        .route(
            "/api/friend-requests/{id}",
            put(social::respond_friend_request),
        )
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/{id}/read", put(notifications::mark_read))
        .route("/ws", get(ws_router::ws_handler));

    Router::new()
        .merge(auth_routes)
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
