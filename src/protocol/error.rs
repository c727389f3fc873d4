//! Protocol error types
//!
//! Errors raised while decoding a single request or serving it. None of these
//! end a session on their own; the dispatcher decides that.

use std::fmt;
use std::io;

use crate::validation::ValidationError;

/// Protocol error type
#[derive(Debug)]
pub enum ProtocolError {
	/// I/O error from the transport or the store
	Io(io::Error),
	/// JSON encoding or decoding error
	Json(String),
	/// Request params missing or invalid for the method
	InvalidParams(String),
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
			ProtocolError::Json(msg) => write!(f, "JSON error: {}", msg),
			ProtocolError::InvalidParams(msg) => write!(f, "Invalid params: {}", msg),
		}
	}
}

impl std::error::Error for ProtocolError {}

impl From<io::Error> for ProtocolError {
	fn from(e: io::Error) -> Self {
		ProtocolError::Io(e)
	}
}

impl From<serde_json::Error> for ProtocolError {
	fn from(e: serde_json::Error) -> Self {
		ProtocolError::Json(e.to_string())
	}
}

impl From<ValidationError> for ProtocolError {
	fn from(e: ValidationError) -> Self {
		ProtocolError::InvalidParams(e.to_string())
	}
}


// vim: ts=4
