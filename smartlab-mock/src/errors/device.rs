use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("Invalid request")]
    InvalidRequest,

    #[error("Missing start or end time")]
    MissingScheduleTime,
}

impl DeviceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeviceError::DeviceNotFound => StatusCode::NOT_FOUND,
            DeviceError::InvalidRequest => StatusCode::BAD_REQUEST,
            DeviceError::MissingScheduleTime => StatusCode::BAD_REQUEST,
        }
    }
}
