//! Logging prelude module for convenient access to tracing macros.
//!
//! stdout carries the protocol and stderr is shown to the SSH client, so log
//! output only ever goes to the configured log file. Without one, no
//! subscriber is installed and events are dropped.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("This is an info message");
//! debug!("Debug information");
//! ```

pub use tracing::{debug, error, info, warn};

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use crate::config::Config;

/// Initialize the tracing subscriber writing to `config.log_file`.
///
/// Logs at INFO level, or DEBUG when `debug-log` is set. `RUST_LOG` takes
/// precedence when present:
///
/// ```bash
/// RUST_LOG=lfs_serve::protocol=trace git-lfs-serve team/repo
/// ```
///
/// Returns whether a subscriber was installed. Several server processes may
/// append to the same file, so it is created world-writable.
pub fn init_tracing(config: &Config) -> io::Result<bool> {
	let path = match &config.log_file {
		Some(p) => p,
		None => return Ok(false),
	};

	let mut options = OpenOptions::new();
	options.create(true).append(true);
	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;
		options.mode(0o666);
	}
	let file = options.open(path)?;

	let default_level = if config.debug_log { "debug" } else { "info" };
	let installed = tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
		)
		.with_writer(Mutex::new(file))
		.with_ansi(false)
		.try_init()
		.is_ok();
	Ok(installed)
}


// vim: ts=4
