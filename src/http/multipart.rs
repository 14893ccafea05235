//! `multipart/byteranges` framing
//!
//! Produces the exact delimiter and part-header bytes of a multipart body so the total length
//! can be known before anything is sent.

use super::range::ByteRange;
use rand::Rng;

/// Framing for one multipart response
#[derive(Debug, Clone)]
pub struct ByteRangesFraming {
    boundary: String,
}

impl ByteRangesFraming {
    /// Framing with a fresh random boundary (60 hex characters)
    pub fn new() -> Self {
        let mut buf = [0u8; 30];
        rand::thread_rng().fill(&mut buf);
        let boundary = buf.iter().map(|b| format!("{b:02x}")).collect();
        Self { boundary }
    }

    /// Framing with a fixed boundary
    #[cfg(test)]
    pub(crate) fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value of the response `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/byteranges; boundary={}", self.boundary)
    }

    /// Delimiter and headers preceding the bytes of part number `index`
    pub fn part_header(
        &self,
        index: usize,
        range: &ByteRange,
        content_type: &str,
        size: u64,
    ) -> String {
        let lead = if index == 0 { "" } else { "\r\n" };
        format!(
            "{lead}--{}\r\nContent-Range: {}\r\nContent-Type: {content_type}\r\n\r\n",
            self.boundary,
            range.content_range(size)
        )
    }

    /// Closing delimiter after `parts` parts
    pub fn closing(&self, parts: usize) -> String {
        let lead = if parts == 0 { "" } else { "\r\n" };
        format!("{lead}--{}--\r\n", self.boundary)
    }

    /// Exact encoded body length, computed without touching the content
    pub fn encoded_len(&self, ranges: &[ByteRange], content_type: &str, size: u64) -> u64 {
        let framing: usize = ranges
            .iter()
            .enumerate()
            .map(|(i, range)| self.part_header(i, range, content_type, size).len())
            .sum::<usize>()
            + self.closing(ranges.len()).len();

        ranges
            .iter()
            .fold(framing as u64, |acc, range| acc + range.length)
    }
}

impl Default for ByteRangesFraming {
    fn default() -> Self {
        Self::new()
    }
}
