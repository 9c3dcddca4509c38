//! Command URL construction.

use url::form_urlencoded;

use super::endpoint::Endpoint;
use super::map::Params;

/// Path of the CGI dispatcher on the camera.
pub const CGI_PATH: &str = "/cgi-bin/CGIProxy.fcgi";

/// One command to send. Built per call and not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub name: String,
    pub params: Params,
    /// Return the body untouched instead of decoding XML (e.g. JPEG snapshots).
    pub raw: bool,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
            raw: false,
        }
    }

    pub fn with_params(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
            raw: false,
        }
    }

    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    pub fn url(&self, endpoint: &Endpoint) -> String {
        build_url(endpoint, &self.name, &self.params)
    }
}

/// Build the full command URL.
///
/// Query order is fixed: `usr`, `pwd`, `cmd`, then the caller's parameters in
/// insertion order. All values are form-urlencoded.
pub fn build_url(endpoint: &Endpoint, cmd: &str, params: &Params) -> String {
    build_with_password(endpoint, cmd, params, endpoint.password())
}

/// Same URL as [`build_url`] with the password masked, for log output.
pub fn redacted_url(endpoint: &Endpoint, cmd: &str, params: &Params) -> String {
    build_with_password(endpoint, cmd, params, "***")
}

fn build_with_password(endpoint: &Endpoint, cmd: &str, params: &Params, password: &str) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("usr", endpoint.username())
        .append_pair("pwd", password)
        .append_pair("cmd", cmd);
    for (key, value) in params.iter() {
        query.append_pair(key, value);
    }

    format!(
        "{scheme}://{authority}{CGI_PATH}?{query}",
        scheme = endpoint.scheme(),
        authority = endpoint.authority(),
        query = query.finish()
    )
}
