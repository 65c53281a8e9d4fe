//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Statement imports are the largest bodies the API accepts.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

fn portfolio_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/clients",
            get(handlers::list_clients).post(handlers::create_client),
        )
        .route(
            "/clients/{id}",
            get(handlers::get_client)
                .put(handlers::update_client)
                .delete(handlers::delete_client),
        )
        .route(
            "/policies",
            get(handlers::list_policies).post(handlers::create_policy),
        )
        .route("/policies/kpis", get(handlers::policy_kpis))
        .route("/policies/{id}", get(handlers::get_policy))
        .route("/policies/{id}/activate", post(handlers::activate_policy))
}

fn finance_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(handlers::list_transactions))
        .route(
            "/ledger/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route("/ledger/balances", get(handlers::account_balances))
        .route(
            "/ledger/movements",
            get(handlers::recent_movements).post(handlers::create_movement),
        )
        .route("/ledger/movements/{id}/void", post(handlers::void_movement))
        .route("/ledger/movements/{id}/settle", post(handlers::settle_movement))
        .route("/ledger/summary", get(handlers::financial_summary))
        .route("/reconciliation/import", post(handlers::import_statement))
        .route(
            "/reconciliation/suggestions",
            get(handlers::reconciliation_suggestions),
        )
        .route("/reconciliation/reconcile", post(handlers::reconcile))
}

fn operations_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/claims",
            get(handlers::list_claims).post(handlers::create_claim),
        )
        .route("/claims/{id}/status", post(handlers::change_claim_status))
        .route("/claims/{id}/activities", get(handlers::claim_activities))
        .route("/appointments", post(handlers::create_appointment))
        .route("/appointments/focus", get(handlers::appointment_focus))
        .route("/crm/pipeline", get(handlers::pipeline))
        .route("/crm/deals", post(handlers::create_deal))
        .route("/crm/deals/{id}/move", post(handlers::move_deal))
        .route("/dashboard", get(handlers::dashboard))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in", post(handlers::sign_in))
        .route("/auth/sign-up", post(handlers::sign_up))
        .route("/auth/sign-out", post(handlers::sign_out))
        .route("/auth/reset-password", post(handlers::reset_password))
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS; the frontend is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .merge(portfolio_routes())
        .merge(finance_routes())
        .merge(operations_routes())
        .merge(auth_routes());

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(all(test, feature = "local-repo"))]
mod tests {
    use super::*;
    use crate::auth::LocalAuthProvider;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let state = AppState::new(repo, Arc::new(LocalAuthProvider::new()));
        let _router = create_router(state);
    }
}
