//! Result codes reported by the CGI interface.

use std::fmt;

/// Outcome of a CGI command.
///
/// Codes `-1..=-7` come from the camera and are passed through verbatim.
/// [`ResultCode::Unavailable`] is produced by this crate for every transport
/// or decode failure. Values outside the documented set (including the
/// reserved `-6`) are kept as [`ResultCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Command accepted and executed (0).
    Success,
    /// Malformed request (-1).
    Format,
    /// Wrong username or password (-2).
    Auth,
    /// Access denied, command may be unsupported (-3).
    CommandDenied,
    /// CGI execution failed on the device (-4).
    ExecutionFailed,
    /// Device-side timeout (-5).
    Timeout,
    /// Unclassified device error, or no `result` element in the reply (-7).
    Unknown,
    /// Camera disconnected or reply not understood (-8).
    Unavailable,
    /// Any other value the device reported.
    Other(i32),
}

impl ResultCode {
    pub fn from_i32(code: i32) -> Self {
        match code {
            0 => Self::Success,
            -1 => Self::Format,
            -2 => Self::Auth,
            -3 => Self::CommandDenied,
            -4 => Self::ExecutionFailed,
            -5 => Self::Timeout,
            -7 => Self::Unknown,
            -8 => Self::Unavailable,
            other => Self::Other(other),
        }
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Format => -1,
            Self::Auth => -2,
            Self::CommandDenied => -3,
            Self::ExecutionFailed => -4,
            Self::Timeout => -5,
            Self::Unknown => -7,
            Self::Unavailable => -8,
            Self::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Short human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Format => "malformed request",
            Self::Auth => "authentication failed",
            Self::CommandDenied => "command denied",
            Self::ExecutionFailed => "execution failed",
            Self::Timeout => "device timeout",
            Self::Unknown => "unknown error",
            Self::Unavailable => "camera unavailable",
            Self::Other(_) => "unrecognized code",
        }
    }
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        Self::from_i32(code)
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.as_i32()
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_i32(), self.description())
    }
}
