//! Object transfer protocol
//!
//! NUL-terminated JSON requests and responses, interleaved with raw object
//! bytes during Upload and Download, all on one bidirectional stream.
//!
//! # Example Usage
//!
//! ```ignore
//! use lfs_serve::protocol::{LfsServer, Session};
//! use lfs_serve::store::ContentStore;
//!
//! let session = Session::new(ContentStore::new("/srv/lfs", "team/repo"));
//! let reader = tokio::io::BufReader::new(tokio::io::stdin());
//! LfsServer::new(reader, tokio::io::stdout(), session).run().await?;
//! ```

pub mod error;
pub mod handlers;
pub mod server;
pub mod transport;
pub mod types;

// Re-export public API
pub use error::ProtocolError;
pub use handlers::HandlerOutcome;
pub use server::{LfsServer, Session};
pub use transport::{Transport, FRAME_TERMINATOR};
pub use types::{
	BatchAction, BatchRequest, BatchResponse, BatchResult, DownloadCheckRequest,
	DownloadCheckResponse, DownloadRequest, Method, ObjectDescriptor, Request, Response,
	UploadCompleteResponse, UploadRequest, UploadResponse, ABSENT_SIZE,
};

// vim: ts=4
