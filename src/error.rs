#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the stats engine."]
// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free while still
//! exposing a thoroughly documented error surface for library consumers.

use std::path::{Path, PathBuf};

/// Unified error type returned by the stats engine and CLI.
///
/// Transport failures from the query client are fatal for the whole run;
/// recoverable anomalies (malformed records, rate limiting) never surface
/// through this type — they degrade to partial metrics inside the engine.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Failure while talking to the remote code-hosting service.
    #[error("transport error: {message}")]
    Transport {
        /// Human readable message describing the transport failure.
        message: String
    },
    /// Wraps I/O errors raised while reading or writing the counters store.
    #[error("failed to access counters store at {path:?}: {source}")]
    Store {
        /// Location of the persisted counters file.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Wraps serialization errors for store contents and JSON output.
    #[error("failed to serialize: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Returned when configuration values violate invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a transport error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the transport failure.
    pub fn transport<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Transport {
            message: message.into()
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// This method is primarily intended for CLI contexts where the variant
    /// name does not add value to end users. The returned string matches the
    /// [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

impl From<masterror::AppError> for Error {
    fn from(error: masterror::AppError) -> Self {
        Self::Transport {
            message: error.to_string()
        }
    }
}

/// Creates an [`Error::Store`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the counters store that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn store_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Store {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn validation_constructor_populates_message() {
        let error = Error::validation("something went wrong");
        match error {
            Error::Validation {
                ref message
            } => {
                assert_eq!(message, "something went wrong");
            }
            other => panic!("expected validation error, got {other:?}")
        }
    }

    #[test]
    fn transport_constructor_populates_message() {
        let error = Error::transport("api unreachable");
        match error {
            Error::Transport {
                ref message
            } => {
                assert_eq!(message, "api unreachable");
            }
            other => panic!("expected transport error, got {other:?}")
        }
    }

    #[test]
    fn to_display_string_matches_display() {
        let error = Error::validation("display me");
        assert_eq!(error.to_string(), error.to_display_string());
    }

    #[test]
    fn store_io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/counters.json");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::store_io_error(path, io_error);

        match error {
            Error::Store {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected store error, got {other:?}")
        }
    }

    #[test]
    fn serde_json_conversion_maps_to_serialize_variant() {
        let invalid = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let mapped: Error = invalid.into();
        assert!(matches!(mapped, Error::Serialize { .. }));
    }

    #[test]
    fn app_error_conversion_maps_to_transport_variant() {
        let app_error = masterror::AppError::service("backend down");
        let mapped: Error = app_error.into();
        assert!(matches!(mapped, Error::Transport { .. }));
    }
}
