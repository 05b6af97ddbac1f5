use thiserror::Error;

/// An inclusive byte span resolved against a file of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the span, for `Content-Length`.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("Range header must be of the form bytes=<start>-[<end>]")]
    Malformed,
    #[error("Requested range is outside the file bounds")]
    Unsatisfiable,
}

/// Parse a `Range: bytes=<start>-[<end>]` header against a file size.
///
/// The start position is required; a missing end means the last byte of
/// the file, and an end past the file is clamped to it. Suffix ranges
/// (`bytes=-500`) and multipart ranges are not supported here.
pub fn parse_range(header: &str, file_size: u64) -> Result<ByteRange, RangeError> {
    let spec = header.strip_prefix("bytes=").ok_or(RangeError::Malformed)?;
    let (start_str, end_str) = spec.split_once('-').ok_or(RangeError::Malformed)?;

    let start: u64 = start_str
        .trim()
        .parse()
        .map_err(|_| RangeError::Malformed)?;

    let end: u64 = match end_str.trim() {
        "" => file_size.saturating_sub(1),
        s => s.parse().map_err(|_| RangeError::Malformed)?,
    };

    if file_size == 0 || start >= file_size || start > end {
        return Err(RangeError::Unsatisfiable);
    }

    Ok(ByteRange {
        start,
        end: end.min(file_size - 1),
    })
}
