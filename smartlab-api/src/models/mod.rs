mod auth;
mod device;
mod log;

pub use auth::*;
pub use device::*;
pub use log::*;

use serde::{Deserialize, Serialize};

pub type Id = i64;

/// Generic acknowledgement body returned by most mutating endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body returned on non-success status codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
