pub mod documents;
pub mod exam;
pub mod health;
pub mod users;

use crate::middleware::auth::require_identity;
use crate::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/profile", get(users::get_profile))
        .layer(from_fn_with_state(state.clone(), require_identity));

    Router::new()
        .route("/health", get(health::health))
        .route("/quota", get(health::quota))
        .route("/summarize-pdf", post(documents::summarize_pdf))
        .route("/askQuestion", post(documents::ask_question))
        .route("/analyze", post(exam::analyze))
        .route("/saveUser", post(users::save_user))
        .merge(protected)
        .with_state(state)
}
