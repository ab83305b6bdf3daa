//! Minimal `multipart/form-data` unwrapping.
//!
//! Browsers posting an upload form wrap the file in a multipart body. Only
//! the first part is of interest and its headers are ignored:
//!
//! ```text
//! --boundary\r\n
//! Content-Disposition: form-data; name="file"; filename="site.zip"\r\n
//! \r\n
//! <payload>\r\n
//! --boundary--\r\n
//! ```

use crate::MultipartError;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Returns the payload of the first part of a multipart body.
///
/// The boundary is taken from the first line. The payload starts after the
/// first blank line and ends at the CRLF preceding the next boundary.
///
/// # Errors
///
/// Returns a [`MultipartError`] when the body has no boundary line, no
/// header terminator, or no closing boundary after the payload.
///
/// # Examples
///
/// ```
/// use tmpweb_core::multipart::unwrap_multipart;
///
/// let body = b"--xyz\r\nContent-Type: text/html\r\n\r\n<p>hi</p>\r\n--xyz--\r\n";
/// assert_eq!(unwrap_multipart(body).unwrap(), b"<p>hi</p>");
/// ```
pub fn unwrap_multipart(body: &[u8]) -> Result<&[u8], MultipartError> {
    let boundary_len = find(body, CRLF, 0).ok_or(MultipartError::MissingBoundary)?;
    if boundary_len == 0 {
        return Err(MultipartError::MissingBoundary);
    }
    let boundary = &body[..boundary_len];

    let start = find(body, HEADER_END, 0).ok_or(MultipartError::MissingHeaders)? + HEADER_END.len();
    let end = find(body, boundary, start)
        .and_then(|at| at.checked_sub(CRLF.len()))
        .filter(|&end| end >= start)
        .ok_or(MultipartError::Unterminated)?;

    tracing::debug!(start, end, "unwrapped multipart payload");
    Ok(&body[start..end])
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|at| at + from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(payload: &[u8]) -> Vec<u8> {
        let mut body = b"------WebKitFormBoundary7MA4YWxk\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"site.zip\"\r\n\
Content-Type: application/zip\r\n\r\n"
            .to_vec();
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n------WebKitFormBoundary7MA4YWxk--\r\n");
        body
    }

    #[test]
    fn test_extracts_first_part() {
        let body = form(b"PK\x03\x04binary\r\nwith crlf");
        assert_eq!(unwrap_multipart(&body).unwrap(), b"PK\x03\x04binary\r\nwith crlf");
    }

    #[test]
    fn test_only_first_part_used() {
        let body = b"--b\r\n\r\nfirst\r\n--b\r\nX: y\r\n\r\nsecond\r\n--b--\r\n";
        assert_eq!(unwrap_multipart(body).unwrap(), b"first");
    }

    #[test]
    fn test_empty_payload() {
        let body = b"--b\r\n\r\n\r\n--b--\r\n";
        assert_eq!(unwrap_multipart(body).unwrap(), b"");
    }

    #[test]
    fn test_no_boundary_line() {
        assert_eq!(
            unwrap_multipart(b"no line breaks here"),
            Err(MultipartError::MissingBoundary)
        );
        assert_eq!(
            unwrap_multipart(b"\r\n\r\npayload"),
            Err(MultipartError::MissingBoundary)
        );
    }

    #[test]
    fn test_no_header_terminator() {
        assert_eq!(
            unwrap_multipart(b"--b\r\nContent-Type: x\r\npayload"),
            Err(MultipartError::MissingHeaders)
        );
    }

    #[test]
    fn test_unterminated_part() {
        assert_eq!(
            unwrap_multipart(b"--b\r\n\r\npayload without end"),
            Err(MultipartError::Unterminated)
        );
    }
}
