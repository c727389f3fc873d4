//! Validation of client- and operator-supplied identifiers
//!
//! - Object ids (must be safe to use as shard directory names)
//! - Repository paths (must stay beneath the storage root)

use std::error::Error;
use std::fmt;

pub mod oid;
pub mod path;

pub use oid::*;
pub use path::*;

/// Generic validation error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
	/// Invalid object id
	OidError(String),
	/// Invalid path
	PathError(String),
}

impl fmt::Display for ValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ValidationError::OidError(msg) => write!(f, "Invalid oid: {}", msg),
			ValidationError::PathError(msg) => write!(f, "Invalid path: {}", msg),
		}
	}
}

impl Error for ValidationError {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validation_error_display() {
		let err = ValidationError::OidError("too short".to_string());
		assert_eq!(err.to_string(), "Invalid oid: too short");
	}

	#[test]
	fn test_validation_error_equality() {
		let err1 = ValidationError::PathError("test".to_string());
		let err2 = ValidationError::PathError("test".to_string());
		assert_eq!(err1, err2);
	}
}

// vim: ts=4
