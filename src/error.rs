// Error type shared by every part of the client library. The binary wraps
// these in `anyhow` for reporting; the library keeps them typed so callers
// can tell a bad argument from a dead network from a malformed reply.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The caller broke a precondition. Raised before any network I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP client itself could not be set up (for example the TLS
    /// backend failed to initialize).
    #[error("cannot build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request never produced an HTTP response (DNS, refused
    /// connection, TLS failure, timeout).
    #[error("HTTP request to '{url}' failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The body claimed to be JSON but did not parse.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot decode {entity}: expected a JSON object")]
    NotAnObject { entity: &'static str },

    #[error("cannot decode {entity}: missing field '{field}'")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("cannot decode {entity}: field '{field}' is not {expected}")]
    WrongType {
        entity: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    /// The server answered, but not with the JSON body this operation needs.
    #[error("unexpected response: status {status}, content type {}", .content_type.as_deref().unwrap_or("<none>"))]
    UnexpectedResponse {
        status: u16,
        content_type: Option<String>,
    },

    #[error("cannot read '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// True for malformed JSON and for replies that do not fit an entity shape.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::Json(_)
                | Error::NotAnObject { .. }
                | Error::MissingField { .. }
                | Error::WrongType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_kinds_are_classified() {
        let missing = Error::MissingField { entity: "Mod", field: "name" };
        assert!(missing.is_decode());
        assert!(missing.to_string().contains("'name'"));

        let bad = Error::InvalidRequest("uri must not be empty".into());
        assert!(!bad.is_decode());
    }

    #[test]
    fn client_setup_failure_is_its_own_kind() {
        let source = reqwest::blocking::Client::builder()
            .user_agent("bad\nagent")
            .build()
            .unwrap_err();
        let err = Error::Client(source);
        assert!(!err.is_decode());
        assert_eq!(err.to_string(), "cannot build HTTP client");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn unexpected_response_mentions_content_type() {
        let err = Error::UnexpectedResponse {
            status: 404,
            content_type: Some("text/html".into()),
        };
        assert_eq!(err.to_string(), "unexpected response: status 404, content type text/html");

        let err = Error::UnexpectedResponse { status: 204, content_type: None };
        assert!(err.to_string().ends_with("<none>"));
    }
}
