//! Byte-level encoding of requests and statuses.
//!
//! # Wire format
//!
//! ```text
//! client -> server   name      up to 49 bytes, then 0x00
//!                    surname   up to 49 bytes, then 0x00
//!                    selector  i32 little-endian, 1..=4
//!                    target    i32 little-endian, 1..=3   (only if selector == 4)
//! server -> client   status    i32 little-endian, +1 or -1
//! ```
//!
//! Integers are fixed at 32 bits little-endian. That is the native layout
//! of the x86 hosts the protocol was first deployed on, written down so that
//! peers on other architectures agree on it.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::message::{CANCEL_SELECTOR, Frame, Request, Status};
use crate::error::ProtocolError;

/// Maximum number of content bytes in a string field, terminator excluded.
pub const MAX_FIELD_LEN: usize = 49;

/// Reads the raw fields of one request from `reader`.
///
/// Reads are issued byte-by-byte for the string fields; wrap raw sockets in
/// a [`tokio::io::BufReader`]. The selector is not validated here, except
/// that [`CANCEL_SELECTOR`] makes the target field mandatory.
///
/// # Errors
///
/// - [`ProtocolError::ConnectionClosed`] if the stream ends early.
/// - [`ProtocolError::FieldTooLong`] if a string has no terminator within
///   [`MAX_FIELD_LEN`] bytes.
/// - [`ProtocolError::Io`] on any other transport failure.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let name = read_field(reader, "name").await?;
    let surname = read_field(reader, "surname").await?;
    let selector = reader.read_i32_le().await?;
    let target = if selector == CANCEL_SELECTOR {
        Some(reader.read_i32_le().await?)
    } else {
        None
    };

    Ok(Frame {
        name,
        surname,
        selector,
        target,
    })
}

/// Reads one request from `reader`.
///
/// # Errors
///
/// Returns the errors of [`read_frame`], plus
/// [`ProtocolError::InvalidSelector`] for a selector outside `1..=4` and
/// [`ProtocolError::InvalidCancelTarget`] for a cancel target outside
/// `1..=3`.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let frame = read_frame(reader).await?;
    Request::try_from(frame)
}

/// Encodes `request` into its wire bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::FieldTooLong`] or
/// [`ProtocolError::FieldContainsNul`] if a string field cannot be framed.
pub fn encode_request(request: &Request) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::with_capacity(2 * (MAX_FIELD_LEN + 1) + 8);
    push_field(&mut buf, "name", request.name())?;
    push_field(&mut buf, "surname", request.surname())?;
    buf.extend_from_slice(&request.selector().to_le_bytes());
    if let Request::Cancel { pool, .. } = request {
        buf.extend_from_slice(&pool.code().to_le_bytes());
    }
    Ok(buf)
}

/// Encodes and writes `request`, then flushes.
///
/// # Errors
///
/// Returns the framing errors of [`encode_request`], or
/// [`ProtocolError::Io`] if the write fails.
pub async fn write_request<W>(writer: &mut W, request: &Request) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let buf = encode_request(request)?;
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one status code from `reader`.
///
/// # Errors
///
/// - [`ProtocolError::ConnectionClosed`] if the stream ends before four bytes
///   arrive.
/// - [`ProtocolError::InvalidStatus`] for any code other than `+1`/`-1`.
pub async fn read_status<R>(reader: &mut R) -> Result<Status, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let code = reader.read_i32_le().await?;
    Status::try_from(code)
}

/// Writes `status` and flushes.
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] if the write fails.
pub async fn write_status<W>(writer: &mut W, status: Status) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_i32_le(status.code()).await?;
    writer.flush().await?;
    Ok(())
}

/// Truncates `value` to at most [`MAX_FIELD_LEN`] bytes on a char boundary.
#[must_use]
pub fn truncate_field(value: &str) -> &str {
    if value.len() <= MAX_FIELD_LEN {
        return value;
    }
    let mut end = MAX_FIELD_LEN;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value.get(..end).unwrap_or_default()
}

async fn read_field<R>(reader: &mut R, field: &'static str) -> Result<String, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::with_capacity(MAX_FIELD_LEN);
    loop {
        let byte = reader.read_u8().await?;
        if byte == 0 {
            break;
        }
        if bytes.len() == MAX_FIELD_LEN {
            return Err(ProtocolError::FieldTooLong {
                field,
                max: MAX_FIELD_LEN,
            });
        }
        bytes.push(byte);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn push_field(buf: &mut Vec<u8>, field: &'static str, value: &str) -> Result<(), ProtocolError> {
    if value.len() > MAX_FIELD_LEN {
        return Err(ProtocolError::FieldTooLong {
            field,
            max: MAX_FIELD_LEN,
        });
    }
    if value.as_bytes().contains(&0) {
        return Err(ProtocolError::FieldContainsNul { field });
    }
    buf.extend_from_slice(value.as_bytes());
    buf.push(0);
    Ok(())
}
