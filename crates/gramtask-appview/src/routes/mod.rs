pub mod award;
pub mod follow;
pub mod health;
pub mod username;

use serde::Serialize;

/// Error body for non-2xx responses
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
