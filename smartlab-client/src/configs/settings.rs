use std::env;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Api {
    pub base_url: String,
    /// Whole-request timeout in seconds
    pub timeout: u64,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// File holding the session, defaults to one in the temp dir
    pub path: Option<String>,
    /// Keep the session in memory only; it dies with the process
    pub in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api: Api,
    pub logger: Logger,
    pub session: Session,
}

impl Settings {
    /// Layers built-in defaults, `configs/default`, `configs/{RUN_MODE}` and
    /// `SMARTLAB__SECTION__KEY` environment variables, in that order.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("api.timeout", 10)?
            .set_default("api.connect_timeout", 5)?
            .set_default("logger.level", "info")?
            .set_default("session.in_memory", false)?
            .add_source(File::with_name("configs/default").required(false))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(
                Environment::with_prefix("SMARTLAB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout)
    }

    pub fn session_path(&self) -> PathBuf {
        self.session
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("smartlab-session.json"))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: Api {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: 10,
                connect_timeout: 5,
            },
            logger: Logger {
                level: "info".to_string(),
            },
            session: Session {
                path: None,
                in_memory: true,
            },
        }
    }
}
