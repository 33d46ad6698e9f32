mod auth_service;
mod lab_service;
mod token_service;

pub use auth_service::*;
pub use lab_service::*;
pub use token_service::*;
