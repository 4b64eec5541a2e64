//! Failures an adapter reports back to the ticket engine.
//!
//! The engine only branches on [`Error::is_gone`]; every other failure is
//! logged and surfaces as a failed step.

use std::error::Error as StdError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An id from config or the engine is not valid on this platform.
    #[error("malformed {kind} id `{raw}`")]
    MalformedId { kind: &'static str, raw: String },

    /// The channel, message or user targeted by `action` was deleted.
    #[error("{action}: target no longer exists")]
    Gone { action: String },

    /// Staff lookup was requested but no staff role is configured.
    #[error("no staff role configured")]
    NoStaffRole,

    /// Any other rejected or failed request.
    #[error("{action} failed: {source}")]
    Request {
        action: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn malformed_id(kind: &'static str, raw: impl Into<String>) -> Self {
        Self::MalformedId {
            kind,
            raw: raw.into(),
        }
    }

    #[must_use]
    pub fn gone(action: impl Into<String>) -> Self {
        Self::Gone {
            action: action.into(),
        }
    }

    #[must_use]
    pub fn request(
        action: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Request {
            action: action.into(),
            source: source.into(),
        }
    }

    /// The target was removed on the platform side, so retrying is pointless.
    #[must_use]
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_keeps_source_text() {
        let err = Error::request("send message", "rate limited");
        assert_eq!(err.to_string(), "send message failed: rate limited");
        assert!(!err.is_gone());
    }

    #[test]
    fn gone_is_distinguishable() {
        let err = Error::gone("edit message");
        assert!(err.is_gone());
        assert_eq!(err.to_string(), "edit message: target no longer exists");
    }

    #[test]
    fn malformed_id_names_the_kind() {
        let err = Error::malformed_id("channel", "abc");
        assert_eq!(err.to_string(), "malformed channel id `abc`");
    }
}
