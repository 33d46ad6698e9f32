use super::{AuthError, DeviceError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
