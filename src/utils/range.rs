//! `Range` header parsing for single byte ranges.

use thiserror::Error;

/// Inclusive byte span within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` response header
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, file_size)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid Range header")]
    Malformed,

    #[error("multiple ranges not supported")]
    MultipleRanges,

    #[error("range not satisfiable")]
    Unsatisfiable,
}

/// Parses a `Range` header value against a file of `file_size` bytes.
///
/// Returns `Ok(None)` when the header asks for nothing usable (a zero length
/// suffix), in which case the full body is served.
pub fn parse_range(value: &str, file_size: u64) -> Result<Option<ByteRange>, RangeError> {
    let range = value
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Malformed)?;

    if range.contains(',') {
        return Err(RangeError::MultipleRanges);
    }

    let (start_part, end_part) = range.split_once('-').ok_or(RangeError::Malformed)?;
    let (start_part, end_part) = (start_part.trim(), end_part.trim());

    let (start, end) = if start_part.is_empty() {
        let suffix: u64 = end_part.parse().map_err(|_| RangeError::Malformed)?;
        if suffix == 0 {
            return Ok(None);
        }
        if file_size == 0 {
            return Err(RangeError::Unsatisfiable);
        }
        (file_size.saturating_sub(suffix), file_size - 1)
    } else {
        let start: u64 = start_part.parse().map_err(|_| RangeError::Malformed)?;
        let end: u64 = if end_part.is_empty() {
            file_size.saturating_sub(1)
        } else {
            end_part.parse().map_err(|_| RangeError::Malformed)?
        };
        (start, end)
    };

    if file_size == 0 || start > end || start >= file_size {
        return Err(RangeError::Unsatisfiable);
    }

    Ok(Some(ByteRange {
        start,
        end: end.min(file_size - 1),
    }))
}
