//! Method handlers
//!
//! Each handler serves one request against the session's content store and
//! returns a `HandlerOutcome`. Upload and Download also move raw bytes over
//! the transport themselves, at the fixed points of their exchanges.

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info, warn};

use super::error::ProtocolError;
use super::server::Session;
use super::transport::Transport;
use super::types::*;
use crate::types::Oid;

/// What a handler wants the dispatcher to do next
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
	/// Send as the `result` of the response
	Result(Value),
	/// Recoverable; send as the `error` of the response
	Error(String),
	/// The session cannot continue
	Fatal(String),
	/// Nothing more to send for this request
	Done,
}

impl HandlerOutcome {
	fn from_result<T: Serialize>(result: Result<T, ProtocolError>) -> HandlerOutcome {
		match result.and_then(|value| Ok(serde_json::to_value(value)?)) {
			Ok(value) => HandlerOutcome::Result(value),
			Err(e) => HandlerOutcome::Error(e.to_string()),
		}
	}
}

/// Validate a client-declared size
fn declared_size(size: i64) -> Result<u64, ProtocolError> {
	if size < 0 {
		return Err(ProtocolError::InvalidParams(format!("size must not be negative, got {}", size)));
	}
	Ok(size as u64)
}

fn upload_params(req: &Request) -> Result<(Oid, u64), ProtocolError> {
	let params: UploadRequest = req.params()?;
	let oid = Oid::parse(&params.oid)?;
	Ok((oid, declared_size(params.size)?))
}

/////////////////
// UploadCheck //
/////////////////

async fn check_upload(req: &Request, session: &Session) -> Result<UploadResponse, ProtocolError> {
	let (oid, _) = upload_params(req)?;
	let present = session.store.contains(&oid).await?;
	Ok(UploadResponse { ok_to_send: !present })
}

pub async fn upload_check(req: &Request, session: &Session) -> HandlerOutcome {
	HandlerOutcome::from_result(check_upload(req, session).await)
}

////////////
// Upload //
////////////

/// Two-phase upload
///
/// Phase 1 answers `okToSend` in its own response frame. Only if that was
/// true does the client follow with exactly `size` raw bytes, which land in a
/// private temp file and are published by rename once complete.
pub async fn upload<R, W>(
	req: &Request,
	transport: &mut Transport<R, W>,
	session: &Session,
) -> HandlerOutcome
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let (oid, size) = match upload_params(req) {
		Ok(p) => p,
		Err(e) => return HandlerOutcome::Error(e.to_string()),
	};

	let present = match session.store.contains(&oid).await {
		Ok(present) => present,
		Err(e) => return HandlerOutcome::Error(format!("Error checking {}: {}", oid, e)),
	};

	// Opened before answering so a storage failure can still be reported in-band
	let pending = if present {
		None
	} else {
		match session.store.begin_upload(&oid).await {
			Ok(p) => Some(p),
			Err(e) => {
				return HandlerOutcome::Error(format!("Error opening media file buffer: {}", e))
			}
		}
	};

	let start = match Response::success(req.id, &UploadResponse { ok_to_send: pending.is_some() }) {
		Ok(r) => r,
		Err(e) => return HandlerOutcome::Error(e.to_string()),
	};
	if let Err(e) = transport.write_frame(&start).await {
		return HandlerOutcome::Error(format!("Unable to send upload start response: {}", e));
	}

	let mut pending = match pending {
		Some(p) => p,
		None => {
			debug!("Upload {}: already stored, nothing to receive", oid);
			return HandlerOutcome::Done;
		}
	};

	let received = match pending.file() {
		Ok(file) => transport.read_raw(size, file).await,
		Err(e) => Err(e),
	};
	match received {
		Err(e) => return HandlerOutcome::Error(format!("Problem uploading data: {}", e)),
		Ok(n) if n != size => {
			warn!("Upload {}: received {} of {} bytes", oid, n, size);
			return HandlerOutcome::Error(format!(
				"Received wrong number of bytes {} (expected {})",
				n, size
			));
		}
		Ok(_) => {}
	}

	if session.verify_content {
		match pending.matches_oid().await {
			Ok(true) => {}
			Ok(false) => {
				warn!("Upload {}: content does not hash to oid, discarded", oid);
				return HandlerOutcome::Error(format!("Received content does not match oid {}", oid));
			}
			Err(e) => {
				return HandlerOutcome::Error(format!("Unable to verify uploaded content: {}", e))
			}
		}
	}

	match pending.publish().await {
		Ok(_) => {
			info!("Upload {}: stored {} bytes", oid, size);
			HandlerOutcome::from_result(Ok(UploadCompleteResponse { received_ok: true }))
		}
		Err(e) => HandlerOutcome::Error(format!("Problem storing {}: {}", oid, e)),
	}
}

///////////////////
// DownloadCheck //
///////////////////

async fn check_download(
	req: &Request,
	session: &Session,
) -> Result<DownloadCheckResponse, ProtocolError> {
	let params: DownloadCheckRequest = req.params()?;
	let oid = Oid::parse(&params.oid)?;
	let size = match session.store.stat(&oid).await? {
		Some(size) => size as i64,
		None => ABSENT_SIZE,
	};
	Ok(DownloadCheckResponse { size })
}

pub async fn download_check(req: &Request, session: &Session) -> HandlerOutcome {
	HandlerOutcome::from_result(check_download(req, session).await)
}

//////////////
// Download //
//////////////

/// Stream a stored object
///
/// Success is the raw content and nothing else. Errors before the first byte
/// are returned as `Error`; the dispatcher still cannot send them as JSON
/// because the client is waiting for bytes.
pub async fn download<R, W>(
	req: &Request,
	transport: &mut Transport<R, W>,
	session: &Session,
) -> HandlerOutcome
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let (oid, declared) = match req
		.params::<DownloadRequest>()
		.and_then(|p| Ok((Oid::parse(&p.oid)?, p.size)))
	{
		Ok(p) => p,
		Err(e) => return HandlerOutcome::Error(e.to_string()),
	};

	let size = match session.store.stat(&oid).await {
		Ok(Some(size)) => size,
		Ok(None) => return HandlerOutcome::Error(format!("File doesn't exist: {}", oid)),
		Err(e) => return HandlerOutcome::Error(format!("Problem reading {}: {}", oid, e)),
	};
	if declared < 0 || declared as u64 != size {
		return HandlerOutcome::Error(format!(
			"File sizes disagree (client: {} server: {})",
			declared, size
		));
	}

	let mut file = match session.store.open(&oid).await {
		Ok(f) => f,
		Err(e) => return HandlerOutcome::Error(format!("Problem opening {}: {}", oid, e)),
	};

	match transport.write_raw(&mut file).await {
		Err(e) => HandlerOutcome::Fatal(format!("Error copying data to output: {}", e)),
		Ok(n) if n != size => HandlerOutcome::Fatal(format!(
			"Amount of data copied disagrees (expected: {} actual: {})",
			size, n
		)),
		Ok(_) => {
			info!("Download {}: sent {} bytes", oid, size);
			HandlerOutcome::Done
		}
	}
}

///////////
// Batch //
///////////

async fn run_batch(req: &Request, session: &Session) -> Result<BatchResponse, ProtocolError> {
	let params: BatchRequest = req.params()?;

	// Validate everything first so one bad entry fails the whole call
	let mut objects = Vec::with_capacity(params.objects.len());
	for object in &params.objects {
		objects.push((Oid::parse(&object.oid)?, object));
	}

	let mut results = Vec::with_capacity(objects.len());
	for (oid, requested) in objects {
		let result = match session.store.stat(&oid).await? {
			Some(size) => BatchResult {
				oid: requested.oid.clone(),
				action: BatchAction::Download,
				size: size as i64,
			},
			None => BatchResult {
				oid: requested.oid.clone(),
				action: BatchAction::Upload,
				size: requested.size,
			},
		};
		results.push(result);
	}
	debug!("Batch: resolved {} objects", results.len());
	Ok(BatchResponse { results })
}

pub async fn batch(req: &Request, session: &Session) -> HandlerOutcome {
	HandlerOutcome::from_result(run_batch(req, session).await)
}


// vim: ts=4
