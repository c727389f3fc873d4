//! Request dispatcher
//!
//! Reads one frame at a time, decodes it into a request, runs the handler for
//! its method and writes the response. Requests are served strictly in order;
//! a handler owns the transport until it returns.

use std::io;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::handlers::{self, HandlerOutcome};
use super::transport::Transport;
use super::types::{Method, Request, Response};
use crate::error::ServeError;
use crate::store::ContentStore;

/// Per-connection context handed to every handler
#[derive(Debug, Clone)]
pub struct Session {
	pub store: ContentStore,
	/// Hash uploads against their oid before publishing
	pub verify_content: bool,
}

impl Session {
	pub fn new(store: ContentStore) -> Self {
		Self { store, verify_content: false }
	}

	pub fn verify_content(mut self, verify: bool) -> Self {
		self.verify_content = verify;
		self
	}
}

/// Object transfer server for a single client connection
pub struct LfsServer<R, W> {
	transport: Transport<R, W>,
	session: Session,
}

impl<R, W> LfsServer<R, W>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	pub fn new(reader: R, writer: W, session: Session) -> Self {
		Self { transport: Transport::new(reader, writer), session }
	}

	/// Serve requests until the client exits or closes the stream
	///
	/// `Ok` means a normal end of session. Errors are fatal to the session and
	/// have already been logged; the caller reports them out of band.
	pub async fn run(mut self) -> Result<(), ServeError> {
		let span = info_span!(
			"session",
			pid = std::process::id(),
			repo = %self.session.store.repo_scope().display()
		);
		let result = self.serve().instrument(span.clone()).await;
		if let Err(e) = &result {
			span.in_scope(|| error!("Session ended with status {}: {}", e.exit_code(), e));
		}
		result
	}

	async fn serve(&mut self) -> Result<(), ServeError> {
		info!("Client started session");

		loop {
			let frame = match self.transport.next_frame().await {
				Ok(Some(frame)) => frame,
				Ok(None) => {
					info!("Client closed the stream");
					return Ok(());
				}
				Err(e) => return Err(ServeError::TransportRead(e)),
			};
			debug!("Request JSON: {}", String::from_utf8_lossy(&frame));

			let request: Request = serde_json::from_slice(&frame).map_err(|e| {
				ServeError::MalformedFrame {
					frame: String::from_utf8_lossy(&frame).into_owned(),
					message: e.to_string(),
				}
			})?;

			let method = match Method::from_name(&request.method) {
				Some(method) => method,
				None => {
					warn!("Request: {} Unknown method: {}", request.id, request.method);
					let response =
						Response::error(request.id, format!("Unknown method {}", request.method));
					self.send(&response).await?;
					continue;
				}
			};
			info!("Request: {} Method: {}", request.id, method);

			let outcome = match method {
				Method::Exit => {
					info!("Client exited");
					return Ok(());
				}
				Method::Batch => handlers::batch(&request, &self.session).await,
				Method::UploadCheck => handlers::upload_check(&request, &self.session).await,
				Method::Upload => {
					handlers::upload(&request, &mut self.transport, &self.session).await
				}
				Method::DownloadCheck => handlers::download_check(&request, &self.session).await,
				Method::Download => {
					handlers::download(&request, &mut self.transport, &self.session).await
				}
			};

			self.finish(method, request.id, outcome).await?;
		}
	}

	/// Apply a handler outcome, honouring the byte-stream discipline
	async fn finish(
		&mut self,
		method: Method,
		id: i64,
		outcome: HandlerOutcome,
	) -> Result<(), ServeError> {
		match outcome {
			HandlerOutcome::Done => Ok(()),
			HandlerOutcome::Fatal(message) => Err(ServeError::StreamIntegrity { message }),
			// The client expects raw bytes, a JSON error would be read as content
			HandlerOutcome::Error(message) if method.streams_response() => {
				Err(ServeError::StreamIntegrity { message })
			}
			HandlerOutcome::Error(message) => {
				warn!("Request: {} {} failed: {}", id, method, message);
				self.send(&Response::error(id, message)).await
			}
			HandlerOutcome::Result(value) => {
				self.send(&Response { id, result: Some(value), error: None }).await
			}
		}
	}

	async fn send(&mut self, response: &Response) -> Result<(), ServeError> {
		let json = serde_json::to_string(response)
			.map_err(|e| ServeError::ResponseWrite(io::Error::from(e)))?;
		debug!("Response JSON: {}", json);
		self.transport.write_encoded(json.as_bytes()).await.map_err(ServeError::ResponseWrite)?;
		debug!("Response {}: Sent", response.id);
		Ok(())
	}
}


// vim: ts=4
