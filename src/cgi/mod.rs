//! Foscam CGIProxy command protocol.
//!
//! Commands are HTTP(S) GET requests to `/cgi-bin/CGIProxy.fcgi` carrying the
//! credentials and command name as query parameters. Replies are a flat XML
//! envelope whose `result` element holds the status code.
//!
//! # Example
//!
//! ```ignore
//! use foscam_cgi::cgi::{CameraClient, Endpoint, Params};
//!
//! let endpoint = Endpoint::new("192.168.1.20", 88, "admin", "secret")?;
//! let client = CameraClient::new(endpoint)?;
//!
//! let result = client.execute("getDevState", Params::new()).await;
//! if result.is_success() {
//!     println!("{:?}", result.fields());
//! }
//! ```

mod client;
mod code;
mod commands;
mod composite;
mod endpoint;
mod map;
mod request;
mod response;
mod transport;

#[cfg(test)]
mod tests;

pub use client::{CallState, Callback, CameraClient, DetachedCall, Execution};
pub use code::ResultCode;
pub use commands::PtzDirection;
pub use composite::{ConfigSection, MOTION_ENABLE_FIELD};
pub use endpoint::{Endpoint, EndpointBuilder, HTTPS_PORT, REQUEST_TIMEOUT};
pub use map::{Fields, OrderedMap, Params};
pub use request::{CGI_PATH, CommandRequest, build_url, redacted_url};
pub use response::{CommandResult, DecodeError, ENVELOPE_TAG, Payload, RESULT_TAG, decode, parse_reply};
pub use transport::{HttpTransport, Transport, TransportError};
