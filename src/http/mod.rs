//! HTTP protocol layer module
//!
//! Conditional request evaluation, byte range parsing and the body and framing types used to
//! deliver static content. Nothing here performs I/O.

pub mod body;
pub mod cache;
pub mod conditional;
pub mod date;
pub mod etag;
pub mod mime;
pub mod multipart;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::{pipe, DeliveryBody, PipeWriter};
pub use conditional::{Disposition, MethodKind, Outcome, Preconditions, Validators};
pub use range::{parse_range_header, ByteRange, RangeParseResult};
