//! Connection settings for a single camera.

use std::net::Ipv6Addr;
use std::time::Duration;

use url::Host;

use crate::error::{AppError, Result};

/// Well-known HTTPS port. An endpoint on this port uses TLS unless told otherwise.
pub const HTTPS_PORT: u16 = 443;

/// Per-request timeout applied by the transport.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How to reach and authenticate to one camera.
///
/// Immutable once built; construct a new endpoint to change any setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    addr: Host<String>,
    port: u16,
    username: String,
    password: String,
    use_tls: bool,
    verbose: bool,
    detached: bool,
    accept_invalid_certs: bool,
}

impl Endpoint {
    /// Build an endpoint with default settings.
    ///
    /// # Errors
    /// Returns `AppError::InvalidEndpoint` if the host is empty or malformed,
    /// the port is zero, or the username is empty.
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> Result<Self> {
        Self::builder(host, port, username, password).build()
    }

    pub fn builder(host: &str, port: u16, username: &str, password: &str) -> EndpointBuilder {
        EndpointBuilder {
            host: host.trim().to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
            tls: None,
            verbose: false,
            detached: false,
            accept_invalid_certs: true,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn use_tls(&self) -> bool {
        self.use_tls
    }

    /// Log every command URL and decoded reply at info level.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Dispatch commands on a background task instead of awaiting them.
    pub fn detached(&self) -> bool {
        self.detached
    }

    /// Skip certificate and hostname validation on TLS connections.
    ///
    /// Defaults to `true` because cameras ship self-signed certificates.
    /// This is a deliberate security weakening; turn it off for cameras with
    /// a trusted certificate.
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_tls { "https" } else { "http" }
    }

    /// `host:port` form used in URLs and log lines. IPv6 addresses are bracketed.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

/// Builder for [`Endpoint`].
#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    host: String,
    port: u16,
    username: String,
    password: String,
    tls: Option<bool>,
    verbose: bool,
    detached: bool,
    accept_invalid_certs: bool,
}

impl EndpointBuilder {
    /// Force TLS on or off. Without an override, TLS is used only on port 443.
    pub fn tls(mut self, enabled: bool) -> Self {
        self.tls = Some(enabled);
        self
    }

    pub fn tls_override(mut self, tls: Option<bool>) -> Self {
        self.tls = tls;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<Endpoint> {
        if self.host.is_empty() {
            return Err(AppError::invalid_endpoint("host cannot be empty"));
        }
        let addr = parse_host(&self.host).ok_or_else(|| {
            AppError::invalid_endpoint(format!(
                "host must be a bare hostname or address without port, got '{}'",
                self.host
            ))
        })?;
        if self.port == 0 {
            return Err(AppError::invalid_endpoint("port must be greater than 0"));
        }
        if self.username.is_empty() {
            return Err(AppError::invalid_endpoint("username cannot be empty"));
        }

        let use_tls = self.tls.unwrap_or(self.port == HTTPS_PORT);

        Ok(Endpoint {
            host: self.host,
            addr,
            port: self.port,
            username: self.username,
            password: self.password,
            use_tls,
            verbose: self.verbose,
            detached: self.detached,
            accept_invalid_certs: self.accept_invalid_certs,
        })
    }
}

/// Accepts hostnames, IPv4 and IPv6 addresses (bracketed or not).
/// Anything carrying a scheme, port, path or whitespace is rejected.
fn parse_host(host: &str) -> Option<Host<String>> {
    if let Ok(ip) = host.parse::<Ipv6Addr>() {
        return Some(Host::Ipv6(ip));
    }
    Host::parse(host).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_default_on_https_port() {
        let endpoint = Endpoint::new("192.168.1.20", 443, "admin", "secret").unwrap();
        assert!(endpoint.use_tls());
        assert_eq!(endpoint.scheme(), "https");
    }

    #[test]
    fn test_tls_default_off_elsewhere() {
        for port in [80, 88, 8443] {
            let endpoint = Endpoint::new("cam.local", port, "admin", "").unwrap();
            assert!(!endpoint.use_tls(), "port {port} should default to plaintext");
        }
    }

    #[test]
    fn test_tls_override() {
        let on = Endpoint::builder("cam.local", 88, "admin", "").tls(true).build().unwrap();
        assert!(on.use_tls());

        let off = Endpoint::builder("cam.local", 443, "admin", "").tls(false).build().unwrap();
        assert!(!off.use_tls());
    }

    #[test]
    fn test_defaults() {
        let endpoint = Endpoint::new("cam.local", 88, "admin", "pw").unwrap();
        assert!(!endpoint.verbose());
        assert!(!endpoint.detached());
        assert!(endpoint.accept_invalid_certs());
        assert_eq!(endpoint.authority(), "cam.local:88");
    }

    #[test]
    fn test_ipv6_authority_is_bracketed() {
        for host in ["fe80::1", "[fe80::1]"] {
            let endpoint = Endpoint::new(host, 88, "admin", "").unwrap();
            assert_eq!(endpoint.authority(), "[fe80::1]:88", "host {host}");
        }
        let ipv4 = Endpoint::new("192.168.1.20", 88, "admin", "").unwrap();
        assert_eq!(ipv4.authority(), "192.168.1.20:88");
    }

    #[test]
    fn test_rejects_invalid_fields() {
        assert!(Endpoint::new("", 88, "admin", "").is_err());
        assert!(Endpoint::new("   ", 88, "admin", "").is_err());
        assert!(Endpoint::new("http://cam.local", 88, "admin", "").is_err());
        assert!(Endpoint::new("cam.local/path", 88, "admin", "").is_err());
        assert!(Endpoint::new("cam.local:88", 88, "admin", "").is_err());
        assert!(Endpoint::new("192.168.1.20:88", 88, "admin", "").is_err());
        assert!(Endpoint::new("[fe80::1]:88", 88, "admin", "").is_err());
        assert!(Endpoint::new("cam local", 88, "admin", "").is_err());
        assert!(Endpoint::new("cam.local", 0, "admin", "").is_err());
        assert!(Endpoint::new("cam.local", 88, "", "").is_err());
    }
}
