//! Result and error taxonomy shared by every fallible core operation.
//!
//! # Responsibility
//! - Define the closed failure kinds for remote (network) and local (disk)
//!   work, plus their tagged union.
//! - Provide chaining hooks over `Result` used by repository callers.
//!
//! # Invariants
//! - The taxonomy is closed: new failure modes map onto an existing `Unknown`
//!   variant instead of growing the enums ad hoc.
//! - Operations that can only fail remotely return `RemoteError`, operations
//!   that can only fail locally return `LocalError`. `DataError` is reserved
//!   for operations that touch both.
//! - Task cancellation is never represented here.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result with no success payload.
pub type EmptyResult<E> = Result<(), E>;

/// Failure kinds produced by the remote book API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteError {
    /// Transport timeout or HTTP 408.
    RequestTimeout,
    /// HTTP 429.
    TooManyRequests,
    /// Host name could not be resolved.
    NoInternet,
    /// HTTP 5xx.
    Server,
    /// Body did not match the expected schema.
    Serialization,
    Unknown,
}

impl RemoteError {
    /// Stable snake_case code used in log events.
    pub fn code(self) -> &'static str {
        match self {
            Self::RequestTimeout => "request_timeout",
            Self::TooManyRequests => "too_many_requests",
            Self::NoInternet => "no_internet",
            Self::Server => "server",
            Self::Serialization => "serialization",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestTimeout => write!(f, "remote request timed out"),
            Self::TooManyRequests => write!(f, "remote rejected request: too many requests"),
            Self::NoInternet => write!(f, "remote host could not be resolved"),
            Self::Server => write!(f, "remote server error"),
            Self::Serialization => write!(f, "remote response did not match expected schema"),
            Self::Unknown => write!(f, "unknown remote error"),
        }
    }
}

impl Error for RemoteError {}

/// Failure kinds produced by the local favorites store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalError {
    /// Write failed because storage is exhausted.
    DiskFull,
    /// Any other storage failure.
    Unknown,
}

impl LocalError {
    /// Stable snake_case code used in log events.
    pub fn code(self) -> &'static str {
        match self {
            Self::DiskFull => "disk_full",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for LocalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiskFull => write!(f, "local storage is full"),
            Self::Unknown => write!(f, "unknown local storage error"),
        }
    }
}

impl Error for LocalError {}

/// Union of remote and local failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataError {
    Remote(RemoteError),
    Local(LocalError),
}

impl DataError {
    pub fn code(self) -> &'static str {
        match self {
            Self::Remote(err) => err.code(),
            Self::Local(err) => err.code(),
        }
    }
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(err) => write!(f, "{err}"),
            Self::Local(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Remote(err) => Some(err),
            Self::Local(err) => Some(err),
        }
    }
}

impl From<RemoteError> for DataError {
    fn from(value: RemoteError) -> Self {
        Self::Remote(value)
    }
}

impl From<LocalError> for DataError {
    fn from(value: LocalError) -> Self {
        Self::Local(value)
    }
}

/// Side-effecting hooks over `Result` that hand the result back for chaining.
pub trait ResultExt<T, E>: Sized {
    /// Runs `action` with the success payload, if any.
    fn on_success(self, action: impl FnOnce(&T)) -> Self;

    /// Runs `action` with the error, if any.
    fn on_error(self, action: impl FnOnce(&E)) -> Self;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn on_success(self, action: impl FnOnce(&T)) -> Self {
        if let Ok(value) = &self {
            action(value);
        }
        self
    }

    fn on_error(self, action: impl FnOnce(&E)) -> Self {
        if let Err(err) = &self {
            action(err);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{DataError, LocalError, RemoteError, ResultExt};
    use std::cell::Cell;
    use std::error::Error;

    #[test]
    fn map_transforms_success_and_passes_error_through() {
        let ok: Result<u32, RemoteError> = Ok(2);
        assert_eq!(ok.map(|value| value * 10), Ok(20));

        let err: Result<u32, RemoteError> = Err(RemoteError::Server);
        assert_eq!(err.map(|value| value * 10), Err(RemoteError::Server));
    }

    #[test]
    fn hooks_fire_only_for_matching_variant() {
        let successes = Cell::new(0);
        let errors = Cell::new(0);

        let ok: Result<&str, LocalError> = Ok("done");
        let returned = ok
            .on_success(|_| successes.set(successes.get() + 1))
            .on_error(|_| errors.set(errors.get() + 1));
        assert_eq!(returned, Ok("done"));

        let err: Result<&str, LocalError> = Err(LocalError::DiskFull);
        let returned = err
            .on_success(|_| successes.set(successes.get() + 1))
            .on_error(|_| errors.set(errors.get() + 1));
        assert_eq!(returned, Err(LocalError::DiskFull));

        assert_eq!(successes.get(), 1);
        assert_eq!(errors.get(), 1);
    }

    #[test]
    fn data_error_wraps_both_localities() {
        let remote: DataError = RemoteError::TooManyRequests.into();
        let local: DataError = LocalError::DiskFull.into();

        assert_eq!(remote, DataError::Remote(RemoteError::TooManyRequests));
        assert_eq!(local.code(), "disk_full");
        assert!(remote.source().is_some());
        assert_eq!(remote.to_string(), RemoteError::TooManyRequests.to_string());
    }
}
