//! Bounded file copy with a reusable buffer.
//!
//! Member sizes declared in archive headers are not trusted: the byte
//! ceiling is enforced on the bytes actually produced by the decoder, so a
//! compressed member that inflates past its declared size still trips the
//! limit mid-stream.

use std::io::Read;
use std::io::Write;
use std::io::{self};

use crate::ExtractionError;
use crate::QuotaResource;

/// Buffer size for I/O operations (64KB).
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Heap buffer reused across every member of one extraction.
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Box<[u8]>,
}

impl CopyBuffer {
    /// Creates a new zeroed copy buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; COPY_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies `reader` into `writer`, failing once the running total would
/// exceed `max_total`.
///
/// `already_written` is the number of bytes other members have written so
/// far; the returned count covers only this copy.
///
/// # Errors
///
/// Returns [`ExtractionError::TooLarge`] as soon as `already_written` plus
/// the copied bytes passes `max_total`. A failing reader means the member
/// data is corrupt and yields [`ExtractionError::BadArchive`]; a failing
/// writer yields [`ExtractionError::Io`]. Bytes past the limit are never
/// written.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use tmpweb_core::copy::CopyBuffer;
/// use tmpweb_core::copy::copy_with_limit;
///
/// let mut buffer = CopyBuffer::new();
/// let mut out = Vec::new();
///
/// let n = copy_with_limit(&mut Cursor::new(b"hello"), &mut out, &mut buffer, 0, 5).unwrap();
/// assert_eq!(n, 5);
///
/// let err = copy_with_limit(&mut Cursor::new(b"hello"), &mut Vec::new(), &mut buffer, 1, 5);
/// assert!(err.is_err());
/// ```
pub fn copy_with_limit<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
    already_written: u64,
    max_total: u64,
) -> Result<u64, ExtractionError> {
    let mut copied: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(ExtractionError::BadArchive(format!(
                    "failed to read member data: {e}"
                )));
            }
        };

        let total = already_written
            .checked_add(copied)
            .and_then(|t| t.checked_add(bytes_read as u64))
            .ok_or(ExtractionError::TooLarge {
                resource: QuotaResource::IntegerOverflow,
            })?;

        if total > max_total {
            return Err(ExtractionError::TooLarge {
                resource: QuotaResource::TotalSize {
                    current: total,
                    max: max_total,
                },
            });
        }

        writer.write_all(&buffer.buf[..bytes_read])?;
        copied += bytes_read as u64;
    }

    Ok(copied)
}
