use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    /// Same text as `error.message`
    pub detail: String,
    pub error: ApiError,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: String) -> Self {
        Self {
            success: false,
            detail: message.clone(),
            error: ApiError {
                code: code.to_string(),
                message,
            },
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in partial-update payloads. Use with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
