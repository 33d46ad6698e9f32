use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure: connection refused, DNS, broken body
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend answered with a non-success status
    #[error("Request to {endpoint} failed with {status}: {message}")]
    Http {
        status: StatusCode,
        endpoint: String,
        message: String,
    },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// Refresh failed after an authorization failure; the session is gone
    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("An action on {target} is already in progress")]
    Busy { target: String },

    #[error("Action on {target} was cancelled")]
    Cancelled { target: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Session storage error: {message}")]
    Storage { message: String },

    /// Reading the prompt or writing output failed
    #[error("Terminal error: {message}")]
    Terminal { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn network_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn http<E: Into<String>, M: Into<String>>(status: StatusCode, endpoint: E, message: M) -> Self {
        Self::Http {
            status,
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn timeout<E: Into<String>>(endpoint: E) -> Self {
        Self::Timeout {
            endpoint: endpoint.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn busy<S: Into<String>>(target: S) -> Self {
        Self::Busy {
            target: target.into(),
        }
    }

    pub fn cancelled<S: Into<String>>(target: S) -> Self {
        Self::Cancelled {
            target: target.into(),
        }
    }

    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn terminal<E: std::fmt::Display>(err: E) -> Self {
        Self::Terminal {
            message: err.to_string(),
        }
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|url| url.path().to_string())
            .unwrap_or_default();

        if err.is_timeout() {
            Error::timeout(endpoint)
        } else if err.is_decode() {
            Error::serialization(err.to_string())
        } else {
            let mut message = format!("HTTP request to {endpoint} failed: {err}");
            let mut cause = std::error::Error::source(&err);
            while let Some(inner) = cause {
                message.push_str(&format!(": {inner}"));
                cause = inner.source();
            }

            Error::network_with_source(message, Box::new(err))
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transport_failure_names_endpoint_and_cause() {
        let err: Error = reqwest::Client::new()
            .get("http://127.0.0.1:1/devices")
            .send()
            .await
            .unwrap_err()
            .into();

        let message = err.to_string();
        assert!(matches!(err, Error::Network { .. }));
        assert!(message.starts_with("Network error: HTTP request to /devices failed: "));
        assert!(message.len() > "Network error: HTTP request to /devices failed: ".len());
    }

    #[test]
    fn test_terminal_error_message() {
        let err = Error::terminal(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"));

        assert_eq!(err.to_string(), "Terminal error: pipe closed");
    }
}
