//! # lfs-serve - git-lfs object server over SSH stdio
//!
//! Serves large objects to one client per process over an already open byte
//! stream, normally the stdin/stdout of an SSH-invoked command. Objects are
//! kept in a content-addressable store under a configured storage root,
//! scoped per repository.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lfs_serve::config::Config;
//! use lfs_serve::serve;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let session = serve::prepare_session(&config, Some("team/repo")).await?;
//!     serve::serve_stdio(session).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod serve;
pub mod store;
pub mod types;
pub mod validation;

// Re-export commonly used types and functions
pub use config::Config;
pub use error::{ServeError, StartupError};
pub use protocol::{LfsServer, Session};
pub use store::ContentStore;
pub use types::Oid;

// vim: ts=4
