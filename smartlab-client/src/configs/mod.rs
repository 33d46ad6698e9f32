mod settings;

pub use settings::{Api, Logger, Session, Settings};
