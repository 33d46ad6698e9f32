mod auth_handle;
mod device_handle;
mod log_handle;
mod user_handle;

pub use auth_handle::*;
pub use device_handle::*;
pub use log_handle::*;
pub use user_handle::*;
