// SPDX-License-Identifier: MIT

//! The codec under the protocol: plain JSON payloads (no length prefix of
//! their own) carried over the stream as 4-byte big-endian length-prefixed
//! frames.

use super::{Request, Response, TailFrame};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A frame longer than this is refused rather than read into memory,
/// guarding against a misbehaving peer claiming an enormous length prefix.
pub const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame of {actual} bytes exceeds the {max} byte limit")]
    FrameTooLarge { max: u32, actual: u32 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Serialize `value` to its wire representation: plain JSON, no length
/// prefix (the prefix is added by [`write_message`] when it's actually put
/// on the stream).
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write `data` prefixed with its length as 4 big-endian bytes.
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, data: &[u8]) -> Result<(), ProtocolError> {
    let len = u32::try_from(data.len()).map_err(|_| ProtocolError::FrameTooLarge { max: MAX_FRAME_BYTES, actual: u32::MAX })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame, rejecting anything over
/// [`MAX_FRAME_BYTES`] before allocating a buffer for it.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge { max: MAX_FRAME_BYTES, actual: len });
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_request<W: AsyncWrite + Unpin>(writer: &mut W, request: &Request) -> Result<(), ProtocolError> {
    write_message(writer, &encode(request)?).await
}

pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Request, ProtocolError> {
    decode(&read_message(reader).await?)
}

pub async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> Result<(), ProtocolError> {
    write_message(writer, &encode(response)?).await
}

pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Response, ProtocolError> {
    decode(&read_message(reader).await?)
}

pub async fn write_tail_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &TailFrame) -> Result<(), ProtocolError> {
    write_message(writer, &encode(frame)?).await
}

pub async fn read_tail_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<TailFrame, ProtocolError> {
    decode(&read_message(reader).await?)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
