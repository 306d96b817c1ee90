//! User-facing message values.
//!
//! Controllers never hand raw errors to the display layer; they convert them
//! into `UiText` first. `MessageKey` stays stable so a presentation layer can
//! localize by key and fall back to `as_str`.

use crate::error::{DataError, LocalError, RemoteError};
use std::fmt::{Display, Formatter};

/// Localizable message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    ErrorRequestTimeout,
    ErrorTooManyRequests,
    ErrorNoInternet,
    ErrorServer,
    ErrorSerialization,
    ErrorUnknown,
    ErrorDiskFull,
}

impl MessageKey {
    /// English default text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ErrorRequestTimeout => "The request timed out",
            Self::ErrorTooManyRequests => "Oops, it seems like your quota is exceeded",
            Self::ErrorNoInternet => "Couldn't reach server, please check your internet connection",
            Self::ErrorServer => "Something went wrong with the server",
            Self::ErrorSerialization => "Couldn't parse data",
            Self::ErrorUnknown => "Oops, something went wrong",
            Self::ErrorDiskFull => "It looks like your disk is full",
        }
    }
}

/// Message shown to the user: either literal text or a localizable key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiText {
    Dynamic(String),
    Resource(MessageKey),
}

impl UiText {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Dynamic(text) => text,
            Self::Resource(key) => key.as_str(),
        }
    }
}

impl Display for UiText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RemoteError> for UiText {
    fn from(value: RemoteError) -> Self {
        Self::Resource(match value {
            RemoteError::RequestTimeout => MessageKey::ErrorRequestTimeout,
            RemoteError::TooManyRequests => MessageKey::ErrorTooManyRequests,
            RemoteError::NoInternet => MessageKey::ErrorNoInternet,
            RemoteError::Server => MessageKey::ErrorServer,
            RemoteError::Serialization => MessageKey::ErrorSerialization,
            RemoteError::Unknown => MessageKey::ErrorUnknown,
        })
    }
}

impl From<LocalError> for UiText {
    fn from(value: LocalError) -> Self {
        Self::Resource(match value {
            LocalError::DiskFull => MessageKey::ErrorDiskFull,
            LocalError::Unknown => MessageKey::ErrorUnknown,
        })
    }
}

impl From<DataError> for UiText {
    fn from(value: DataError) -> Self {
        match value {
            DataError::Remote(err) => err.into(),
            DataError::Local(err) => err.into(),
        }
    }
}
