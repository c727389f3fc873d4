//! NUL-delimited JSON framing over one buffered byte stream
//!
//! Frames and raw payloads share the same reader, so bytes already buffered
//! after a frame are handed to `read_raw` instead of being lost. Which of the
//! two comes next is never signalled on the wire; the method being handled
//! decides.

use serde::Serialize;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// Byte terminating every JSON frame; never valid inside JSON text
pub const FRAME_TERMINATOR: u8 = 0;

/// Both directions of a client connection
pub struct Transport<R, W> {
	reader: R,
	writer: W,
}

impl<R, W> Transport<R, W>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	pub fn new(reader: R, writer: W) -> Self {
		Self { reader, writer }
	}

	/// Read the next frame, without its terminator
	///
	/// Returns `None` at end of stream. Trailing bytes with no terminator are
	/// discarded; a client that disconnects mid-frame is treated like one that
	/// disconnected between frames.
	pub async fn next_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
		let mut frame = Vec::new();
		let n = self.reader.read_until(FRAME_TERMINATOR, &mut frame).await?;
		if n == 0 {
			return Ok(None);
		}
		if frame.last() != Some(&FRAME_TERMINATOR) {
			warn!("Discarding {} unterminated bytes at end of stream", frame.len());
			return Ok(None);
		}
		frame.pop();
		Ok(Some(frame))
	}

	/// Encode `message` as JSON and send it as one frame
	pub async fn write_frame<T: Serialize>(&mut self, message: &T) -> io::Result<()> {
		let json = serde_json::to_vec(message)?;
		self.write_encoded(&json).await
	}

	/// Send already encoded JSON as one frame
	pub async fn write_encoded(&mut self, json: &[u8]) -> io::Result<()> {
		let mut bytes = Vec::with_capacity(json.len() + 1);
		bytes.extend_from_slice(json);
		bytes.push(FRAME_TERMINATOR);
		self.writer.write_all(&bytes).await?;
		self.writer.flush().await
	}

	/// Copy up to `n` raw bytes from the client into `sink`
	///
	/// Returns the number of bytes copied, which is less than `n` only if the
	/// stream ended first.
	pub async fn read_raw<S>(&mut self, n: u64, sink: &mut S) -> io::Result<u64>
	where
		S: AsyncWrite + Unpin + ?Sized,
	{
		let mut limited = (&mut self.reader).take(n);
		tokio::io::copy(&mut limited, sink).await
	}

	/// Copy all of `source` to the client as raw bytes
	pub async fn write_raw<S>(&mut self, source: &mut S) -> io::Result<u64>
	where
		S: AsyncRead + Unpin + ?Sized,
	{
		let n = tokio::io::copy(source, &mut self.writer).await?;
		self.writer.flush().await?;
		Ok(n)
	}

	pub fn into_inner(self) -> (R, W) {
		(self.reader, self.writer)
	}
}


// vim: ts=4
