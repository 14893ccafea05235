//! HTTP Range request parsing module
//!
//! Byte range parsing for partial and multi-range downloads, compliant with RFC 7233.

use super::etag::trim_ows;

/// Range unit prefix accepted by this server
const BYTES_UNIT: &str = "bytes=";

/// A validated byte range, always inside `[0, size)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset
    pub start: u64,
    /// Number of bytes
    pub length: u64,
}

impl ByteRange {
    /// Offset of the last byte (inclusive)
    #[inline]
    pub const fn end(&self) -> u64 {
        self.start + self.length - 1
    }

    /// `Content-Range` header value for this range
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{size}", self.start, self.end())
    }
}

/// `Content-Range` value sent with a 416 response
pub fn unsatisfied_content_range(size: u64) -> String {
    format!("bytes */{size}")
}

/// Range header parse result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeParseResult {
    /// No usable Range header, serve the full content
    None,
    /// Syntactically invalid header
    Malformed,
    /// Every range started beyond the end of the content - should return 416
    NotSatisfiable,
    /// Ranges in request order, duplicates and overlaps preserved
    Valid(Vec<ByteRange>),
}

/// Parse HTTP Range header (bytes unit, one or more ranges)
///
/// Supported formats per range:
/// - `start-end` - Specific range, end clamped to the last byte
/// - `start-` - From start to end
/// - `-suffix` - Last suffix bytes
///
/// # Arguments
/// * `range_header` - Value of Range header
/// * `size` - Total content size
///
/// # Examples
/// ```
/// use range_fileserver::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=0-0,-2"), 10);
/// assert_eq!(
///     result,
///     RangeParseResult::Valid(vec![
///         ByteRange { start: 0, length: 1 },
///         ByteRange { start: 8, length: 2 },
///     ])
/// );
///
/// // No Range header
/// assert_eq!(parse_range_header(None, 1000), RangeParseResult::None);
/// ```
pub fn parse_range_header(range_header: Option<&str>, size: u64) -> RangeParseResult {
    let Some(header) = range_header.filter(|h| !h.is_empty()) else {
        return RangeParseResult::None;
    };

    let Some(range_set) = header.strip_prefix(BYTES_UNIT) else {
        return RangeParseResult::Malformed;
    };

    let mut ranges = Vec::new();
    let mut no_overlap = false;

    for part in range_set.split(',') {
        let part = trim_ows(part);
        if part.is_empty() {
            continue;
        }

        let Some((start_str, end_str)) = part.split_once('-') else {
            return RangeParseResult::Malformed;
        };
        let (start_str, end_str) = (trim_ows(start_str), trim_ows(end_str));

        let parsed = if start_str.is_empty() {
            parse_suffix_range(end_str, size)
        } else {
            parse_standard_range(start_str, end_str, size)
        };

        match parsed {
            Entry::Range(range) => ranges.push(range),
            Entry::NoOverlap => no_overlap = true,
            Entry::Invalid => return RangeParseResult::Malformed,
        }
    }

    if ranges.is_empty() {
        return match (no_overlap, size) {
            // Nothing to overlap with, send the empty body
            (true, 0) => RangeParseResult::None,
            (true, _) => RangeParseResult::NotSatisfiable,
            (false, _) => RangeParseResult::Malformed,
        };
    }

    // Overlapping ranges asking for more than the whole content: just send it once
    if sum_ranges_size(&ranges) > size {
        return RangeParseResult::None;
    }

    RangeParseResult::Valid(ranges)
}

/// Per-entry parse outcome
enum Entry {
    Range(ByteRange),
    NoOverlap,
    Invalid,
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, size: u64) -> Entry {
    if suffix_str.is_empty() || suffix_str.starts_with('-') {
        return Entry::Invalid;
    }
    let Some(suffix) = parse_offset(suffix_str) else {
        return Entry::Invalid;
    };

    // Suffix larger than the content selects all of it
    let length = suffix.min(size);
    if length == 0 {
        return Entry::NoOverlap;
    }

    Entry::Range(ByteRange {
        start: size - length,
        length,
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, size: u64) -> Entry {
    let Some(start) = parse_offset(start_str) else {
        return Entry::Invalid;
    };

    // Start beyond the content does not overlap, but later ranges may
    if start >= size {
        return Entry::NoOverlap;
    }

    if end_str.is_empty() {
        return Entry::Range(ByteRange {
            start,
            length: size - start,
        });
    }

    let Some(end) = parse_offset(end_str) else {
        return Entry::Invalid;
    };
    if start > end {
        return Entry::Invalid;
    }

    // Clamp end to size - 1
    let end = end.min(size - 1);
    Entry::Range(ByteRange {
        start,
        length: end - start + 1,
    })
}

/// Parse a decimal offset within the signed 64-bit range
fn parse_offset(s: &str) -> Option<u64> {
    s.parse::<i64>().ok().and_then(|v| u64::try_from(v).ok())
}

/// Total bytes selected by `ranges`
pub fn sum_ranges_size(ranges: &[ByteRange]) -> u64 {
    ranges
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.length))
}
