//! Error types for lfs-serve
//!
//! Session-fatal errors and startup errors both map onto a process exit
//! status, which is how the invoking SSH layer learns why a session ended.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that end a serving session
#[derive(Debug)]
pub enum ServeError {
	/// Reading the next frame from the client failed
	TransportRead(io::Error),

	/// A frame could not be decoded as a request
	MalformedFrame { frame: String, message: String },

	/// Writing a response frame back to the client failed
	ResponseWrite(io::Error),

	/// A byte-stream method failed and there is no JSON channel left to report it
	StreamIntegrity { message: String },
}

impl ServeError {
	/// Process exit status reported to the invoking layer
	pub fn exit_code(&self) -> i32 {
		match self {
			ServeError::TransportRead(_) => 21,
			ServeError::MalformedFrame { .. } => 22,
			ServeError::ResponseWrite(_) => 23,
			ServeError::StreamIntegrity { .. } => 33,
		}
	}
}

impl fmt::Display for ServeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ServeError::TransportRead(e) => write!(f, "Unable to read from client: {}", e),
			ServeError::MalformedFrame { frame, message } => {
				write!(f, "Unable to decode request JSON: {}: {}", frame, message)
			}
			ServeError::ResponseWrite(e) => write!(f, "Unable to send response: {}", e),
			ServeError::StreamIntegrity { message } => write!(f, "{}", message),
		}
	}
}

impl Error for ServeError {}

/// Errors detected before a session starts
#[derive(Debug)]
pub enum StartupError {
	/// Config file could not be read or parsed
	Config { path: PathBuf, message: String },

	/// No base path configured
	MissingBasePath,

	/// Base path missing or not a directory
	InvalidBasePath { path: PathBuf },

	/// Delta cache directory could not be provisioned
	DeltaCache { path: PathBuf, source: io::Error },

	/// Repository path argument missing or rejected
	InvalidRepoPath { message: String },
}

impl StartupError {
	pub fn exit_code(&self) -> i32 {
		match self {
			StartupError::Config { .. } => 10,
			StartupError::MissingBasePath => 12,
			StartupError::InvalidBasePath { .. } => 14,
			StartupError::DeltaCache { .. } => 16,
			StartupError::InvalidRepoPath { .. } => 18,
		}
	}
}

impl fmt::Display for StartupError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StartupError::Config { path, message } => {
				write!(f, "Invalid config file {}: {}", path.display(), message)
			}
			StartupError::MissingBasePath => {
				write!(f, "Missing required configuration setting: base-path")
			}
			StartupError::InvalidBasePath { path } => {
				write!(f, "Invalid value for base-path: {}. Directory must exist.", path.display())
			}
			StartupError::DeltaCache { path, source } => {
				write!(f, "Error creating delta cache path {}: {}", path.display(), source)
			}
			StartupError::InvalidRepoPath { message } => write!(f, "{}", message),
		}
	}
}

impl Error for StartupError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			StartupError::DeltaCache { source, .. } => Some(source),
			_ => None,
		}
	}
}


// vim: ts=4
