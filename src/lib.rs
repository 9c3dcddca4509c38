pub mod cgi;
pub mod config;
pub mod error;

pub use cgi::{CameraClient, CommandResult, Endpoint, Params, ResultCode};
pub use error::{AppError, Result};
