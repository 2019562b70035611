//! Crate-wide result and error handling.
//!
//! Mirrors the shape of the teacher's `utils::kerror` module — an
//! enum-of-variants with a hand-rolled `Display` and a `SimResult<T>` alias —
//! but collapsed to the three error kinds the simulator actually has instead
//! of the teacher's syscall-errno surface.

use std::fmt::{self, Display, Formatter};

/// Crate-wide result type.
pub type SimResult<T> = Result<T, SimError>;

/// The three error kinds a simulation run can fail with.
#[derive(Debug, Clone)]
pub enum SimError {
    /// Malformed input file: bad record count, out-of-range niceness,
    /// non-positive burst, duplicate pid, and so on. Reported with line
    /// context where available; not recoverable.
    Input { message: String, line: Option<usize> },
    /// Allocation or other host-resource failure. Fatal.
    Resource { message: String },
    /// An internal assertion failed — a bug in the engine, not in the input.
    Invariant { message: String },
}

impl SimError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input { message: message.into(), line: None }
    }

    pub fn input_at(message: impl Into<String>, line: usize) -> Self {
        Self::Input { message: message.into(), line: Some(line) }
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource { message: message.into() }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant { message: message.into() }
    }

    /// The exit code this error should produce at the CLI boundary.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Input { .. } => 1,
            Self::Resource { .. } | Self::Invariant { .. } => 2,
        }
    }
}

impl Display for SimError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input { message, line: Some(line) } => {
                write!(f, "input error at line {}: {}", line, message)
            }
            Self::Input { message, line: None } => write!(f, "input error: {}", message),
            Self::Resource { message } => write!(f, "resource error: {}", message),
            Self::Invariant { message } => write!(f, "invariant violation: {}", message),
        }
    }
}

impl std::error::Error for SimError {}

/// Return early with an `Invariant` error if `cond` is false.
#[macro_export]
macro_rules! ensure_invariant {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::SimError::invariant(format!($($arg)*)));
        }
    };
}
