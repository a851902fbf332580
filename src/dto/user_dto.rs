use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveUserPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "No ID token provided"))]
    pub id_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
