//! Command execution against one camera.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::endpoint::Endpoint;
use super::map::Params;
use super::request::{CommandRequest, build_url, redacted_url};
use super::response::{CommandResult, decode};
use super::transport::{HttpTransport, Transport};
use crate::error::Result;

/// Completion callback registered when a command is submitted.
pub type Callback = Box<dyn FnOnce(&CommandResult) + Send + 'static>;

/// Progress of a single call. Every call is single-shot, there are no retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Sending,
    Decoding,
    Completed,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Sending => "sending",
            Self::Decoding => "decoding",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// What [`CameraClient::execute_command`] hands back.
#[derive(Debug)]
pub enum Execution {
    /// The call ran to completion before returning.
    Completed(CommandResult),
    /// The call runs on a background task.
    Detached(DetachedCall),
}

impl Execution {
    /// Result of a completed call, `None` for a detached one.
    pub fn completed(self) -> Option<CommandResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Detached(_) => None,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Detached(_))
    }
}

/// Handle to a command running in the background.
///
/// Dropping the handle does not cancel the call; it always runs to
/// completion or failure and fires its callback.
#[derive(Debug)]
pub struct DetachedCall {
    handle: JoinHandle<CommandResult>,
}

impl DetachedCall {
    /// Wait for the call to finish.
    ///
    /// Returns `None` only if the background task panicked (e.g. inside the callback).
    pub async fn join(self) -> Option<CommandResult> {
        match self.handle.await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Detached command task failed: {e}");
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Client for the CGIProxy command interface of one camera.
///
/// Cheap to clone; clones share the endpoint and transport. The endpoint is
/// read-only, so a client can be used from many tasks at once.
pub struct CameraClient<T = HttpTransport> {
    endpoint: Arc<Endpoint>,
    transport: Arc<T>,
    detached_limit: Option<Arc<Semaphore>>,
}

impl<T> Clone for CameraClient<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: Arc::clone(&self.endpoint),
            transport: Arc::clone(&self.transport),
            detached_limit: self.detached_limit.clone(),
        }
    }
}

impl CameraClient<HttpTransport> {
    /// Create a client talking HTTP(S) to the endpoint.
    ///
    /// # Errors
    /// Returns `AppError::Http` if the HTTP client cannot be built.
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let transport = HttpTransport::new(&endpoint)?;
        Ok(Self::with_transport(endpoint, transport))
    }
}

impl<T: Transport> CameraClient<T> {
    pub fn with_transport(endpoint: Endpoint, transport: T) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            transport: Arc::new(transport),
            detached_limit: None,
        }
    }

    /// Cap the number of detached calls in flight at once.
    ///
    /// Submission never waits; extra calls queue inside their background task.
    pub fn with_detached_limit(mut self, limit: usize) -> Self {
        self.detached_limit = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Command URL for logging and diagnostics, with the password masked.
    pub fn command_url(&self, cmd: &str, params: &Params) -> String {
        redacted_url(&self.endpoint, cmd, params)
    }

    /// Send a command and decode the reply, always awaiting completion.
    ///
    /// Transport and decode failures come back as `ResultCode::Unavailable`.
    pub async fn send_command(&self, request: &CommandRequest) -> CommandResult {
        run(&self.endpoint, self.transport.as_ref(), request).await
    }

    /// Shorthand for [`send_command`](Self::send_command) with a command name and parameters.
    pub async fn execute(&self, cmd: &str, params: Params) -> CommandResult {
        self.send_command(&CommandRequest::with_params(cmd, params)).await
    }
}

impl<T: Transport + 'static> CameraClient<T> {
    /// Run a command the way the endpoint is configured.
    ///
    /// On a non-detached endpoint the call is awaited and its result returned;
    /// the callback, if any, is invoked first. On a detached endpoint the call
    /// is spawned onto the Tokio runtime and this returns immediately. Detached
    /// calls run independently, so callbacks may fire out of submission order.
    pub async fn execute_command(&self, request: CommandRequest, callback: Option<Callback>) -> Execution {
        if self.endpoint.detached() {
            Execution::Detached(self.spawn_command(request, callback))
        } else {
            let result = self.send_command(&request).await;
            if let Some(callback) = callback {
                callback(&result);
            }
            Execution::Completed(result)
        }
    }

    /// Dispatch a command on a background task regardless of the endpoint mode.
    pub fn spawn_command(&self, request: CommandRequest, callback: Option<Callback>) -> DetachedCall {
        let endpoint = Arc::clone(&self.endpoint);
        let transport = Arc::clone(&self.transport);
        let limit = self.detached_limit.clone();

        debug!("Dispatching detached command {}", request.name);

        let handle = tokio::spawn(async move {
            // Held until the callback returns; the semaphore is never closed.
            let _permit = match limit {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            let result = run(&endpoint, transport.as_ref(), &request).await;
            if let Some(callback) = callback {
                callback(&result);
            }
            result
        });

        DetachedCall { handle }
    }
}

async fn run<T: Transport>(endpoint: &Endpoint, transport: &T, request: &CommandRequest) -> CommandResult {
    let cmd = request.name.as_str();
    let mut state = CallState::Idle;
    let url = build_url(endpoint, cmd, &request.params);

    if endpoint.verbose() {
        info!("Send Foscam command: {}", redacted_url(endpoint, cmd, &request.params));
    }

    advance(&mut state, CallState::Sending, cmd);
    let body = match transport.send(&url).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Command {cmd} to {} failed: {e}", endpoint.authority());
            advance(&mut state, CallState::Completed, cmd);
            return CommandResult::unavailable();
        }
    };

    advance(&mut state, CallState::Decoding, cmd);
    let result = decode(&body, request.raw);

    if endpoint.verbose() {
        match result.raw_bytes() {
            Some(bytes) => info!("Returning raw Foscam response: len={}", bytes.len()),
            None => info!("Received Foscam response: {}, {:?}", result.code, result.fields()),
        }
    }

    advance(&mut state, CallState::Completed, cmd);
    result
}

fn advance(state: &mut CallState, next: CallState, cmd: &str) {
    debug!("{cmd}: {state} -> {next}");
    *state = next;
}
