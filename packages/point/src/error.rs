//! Error types for settings points.
//!
//! Every error raised through a key-addressed operation carries the name of
//! the field it concerns, so callers can report it without extra context.

use std::time::Duration;

/// Boxed error returned by action callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A candidate value was rejected by a point's validator.
///
/// Validators only describe what is wrong with the value. The field name is
/// attached when the rejection is turned into an [`Error::Validation`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by points and stores.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The key does not name a declared point.
    #[error("{name} - there is no settings point with this name")]
    UnknownField { name: String },

    /// The candidate value failed validation. The stored value is unchanged.
    #[error("invalid value for '{name}': {source}")]
    Validation {
        name: String,
        #[source]
        source: ValidationError,
    },

    /// The point's action callback failed.
    #[error("action of '{name}' failed: {source}")]
    Action {
        name: String,
        #[source]
        source: BoxError,
    },

    /// The point's lock could not be acquired within the configured timeout.
    #[error("timed out after {timeout:?} waiting for the lock of '{name}'")]
    LockTimeout { name: String, timeout: Duration },

    /// The point was used before a store wired it.
    #[error("point '{name}' is not attached to a store")]
    Unwired { name: String },

    /// A declaration cannot be wired (bad lock sharing, duplicate wiring).
    #[error("schema error at '{name}': {message}")]
    Schema { name: String, message: String },

    /// A typed read or write could not convert between `Value` and a Rust type.
    #[error("cannot convert '{name}': {message}")]
    Conversion { name: String, message: String },
}

/// Error categories, used to name which failures a caller wants to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownField,
    Validation,
    Action,
    LockTimeout,
    Unwired,
    Schema,
    Conversion,
}

impl Error {
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Error::UnknownField { name: name.into() }
    }

    pub fn validation(name: impl Into<String>, source: ValidationError) -> Self {
        Error::Validation {
            name: name.into(),
            source,
        }
    }

    pub fn action(name: impl Into<String>, source: BoxError) -> Self {
        Error::Action {
            name: name.into(),
            source,
        }
    }

    pub fn schema(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn conversion(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Conversion {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownField { .. } => ErrorKind::UnknownField,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Action { .. } => ErrorKind::Action,
            Error::LockTimeout { .. } => ErrorKind::LockTimeout,
            Error::Unwired { .. } => ErrorKind::Unwired,
            Error::Schema { .. } => ErrorKind::Schema,
            Error::Conversion { .. } => ErrorKind::Conversion,
        }
    }

    /// Name of the field the error concerns.
    pub fn field(&self) -> &str {
        match self {
            Error::UnknownField { name }
            | Error::Validation { name, .. }
            | Error::Action { name, .. }
            | Error::LockTimeout { name, .. }
            | Error::Unwired { name }
            | Error::Schema { name, .. }
            | Error::Conversion { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn unknown_field_display() {
        let e = Error::unknown_field("missing");
        assert_eq!(
            format!("{}", e),
            "missing - there is no settings point with this name"
        );
        assert_eq!(e.kind(), ErrorKind::UnknownField);
        assert_eq!(e.field(), "missing");
    }

    #[test]
    fn validation_display_and_source() {
        let e = Error::validation("count", ValidationError::new("expected integer, got string"));
        let display = format!("{}", e);
        assert!(display.contains("count"));
        assert!(display.contains("expected integer"));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn action_error_keeps_source() {
        let source: BoxError = "disk is full".into();
        let e = Error::action("started", source);
        assert_eq!(e.kind(), ErrorKind::Action);
        assert!(format!("{}", e).contains("disk is full"));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn lock_timeout_display() {
        let e = Error::LockTimeout {
            name: "level".to_string(),
            timeout: Duration::from_millis(50),
        };
        let display = format!("{}", e);
        assert!(display.contains("level"));
        assert!(display.contains("50ms"));
    }

    #[test]
    fn schema_error_has_no_source() {
        let e = Error::schema("a", "lock sharing cycle");
        assert!(StdError::source(&e).is_none());
        assert_eq!(e.field(), "a");
    }
}
