use crate::dto::user_dto::{MessageResponse, SaveUserPayload};
use crate::error::Result;
use crate::models::user::UserProfile;
use crate::services::identity_service::IdentityClaims;
use crate::AppState;
use axum::{extract::State, Extension, Json};
use validator::Validate;

pub async fn save_user(
    State(state): State<AppState>,
    Json(payload): Json<SaveUserPayload>,
) -> Result<Json<MessageResponse>> {
    payload.validate()?;
    let claims = state.identity.verify(&payload.id_token).await?;
    let outcome = state.user_service.save_profile(&claims).await?;
    Ok(Json(MessageResponse {
        message: outcome.message().to_string(),
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<IdentityClaims>,
) -> Result<Json<UserProfile>> {
    let profile = state.user_service.get_by_google_id(&claims.sub).await?;
    Ok(Json(profile))
}
