//! Content delivery
//!
//! Drives one resource through conditional evaluation, range resolution and body production.
//! The body is copied from the byte source by a spawned task into a bounded pipe, so nothing
//! larger than one chunk per in-flight slot is ever held in memory.

use crate::error::{DeliveryError, ServeError};
use crate::fs::ByteSource;
use crate::http::conditional::{self, header_str, Disposition, MethodKind, Preconditions, Validators};
use crate::http::date::{format_http_date, known_time};
use crate::http::multipart::ByteRangesFraming;
use crate::http::range::{self, ByteRange, RangeParseResult};
use crate::http::response::{build_304_response, build_412_response, build_response, log_build_error};
use crate::http::{pipe, DeliveryBody, PipeWriter};
use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use hyper::header::{
    HeaderMap, HeaderValue, ACCEPT_RANGES, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, ETAG, LAST_MODIFIED,
};
use hyper::http::request::Parts;
use hyper::{Method, Response, StatusCode};
use std::borrow::Cow;
use std::io::{self, SeekFrom};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, warn};

/// Resource being delivered, fixed for the duration of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    /// `None` (or the Unix epoch) disables every time based condition
    pub modified: Option<DateTime<Utc>>,
    pub size: u64,
    /// Used when the caller did not set a `Content-Type` header
    pub content_type: String,
}

impl Resource {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            modified: None,
            size,
            content_type: String::new(),
        }
    }

    #[must_use]
    pub fn with_modified(mut self, modified: Option<DateTime<Utc>>) -> Self {
        self.modified = modified;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Tuning for body production
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Largest chunk read from the source at once
    pub chunk_size: usize,
    /// Chunks buffered between the producer task and the connection
    pub pipe_capacity: usize,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            pipe_capacity: 4,
        }
    }
}

/// How the content is sent once all conditions passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Full,
    Single(ByteRange),
    Multi(Vec<ByteRange>),
}

/// Serve `source` as the representation of `resource`
///
/// `headers` holds response headers chosen by the caller beforehand; `ETag` is taken from there
/// for matching, and a preset `Content-Type` or `Content-Encoding` is respected. Failures
/// before the body starts are returned together with the headers set so far so the caller can
/// render them.
pub async fn serve_content<S: ByteSource>(
    options: &DeliveryOptions,
    request: &Parts,
    mut headers: HeaderMap,
    resource: &Resource,
    mut source: S,
) -> Result<Response<DeliveryBody>, ServeError> {
    let modified = known_time(resource.modified);
    set_last_modified(&mut headers, modified);

    let method = MethodKind::from(&request.method);
    let conds = Preconditions::from_headers(&request.headers);
    let disposition = {
        let etag = header_str(&headers, &ETAG);
        let validators = Validators {
            etag: etag.as_deref(),
            modified,
        };
        conditional::evaluate(method, &conds, &validators)
    };
    let range_header = match disposition {
        Disposition::NotModified => return Ok(build_304_response(headers)),
        Disposition::PreconditionFailed => return Ok(build_412_response(headers)),
        Disposition::Proceed { range } => range,
    };

    let preset_type = header_str(&headers, &CONTENT_TYPE).map(Cow::into_owned);
    let content_type = match preset_type {
        Some(preset) => preset,
        None => {
            if !resource.content_type.is_empty() {
                insert_header(&mut headers, CONTENT_TYPE, &resource.content_type);
            }
            resource.content_type.clone()
        }
    };

    let size = match verify_size(&mut source, resource.size).await {
        Ok(size) => size,
        Err(e) => return Err(ServeError::new(e, headers)),
    };

    let delivery = match range::parse_range_header(range_header, size) {
        RangeParseResult::None => Delivery::Full,
        RangeParseResult::Valid(mut ranges) if ranges.len() == 1 => {
            Delivery::Single(ranges.remove(0))
        }
        RangeParseResult::Valid(ranges) => Delivery::Multi(ranges),
        RangeParseResult::Malformed => {
            return Err(ServeError::new(DeliveryError::MalformedRange, headers));
        }
        RangeParseResult::NotSatisfiable => {
            insert_header(
                &mut headers,
                CONTENT_RANGE,
                &range::unsatisfied_content_range(size),
            );
            return Err(ServeError::new(
                DeliveryError::UnsatisfiableRange { size },
                headers,
            ));
        }
    };

    let is_head = request.method == Method::HEAD;
    let ranged = delivery != Delivery::Full;
    let (status, send_size, producer) = match delivery {
        Delivery::Full => (StatusCode::OK, size, Producer::Slice { length: size }),
        Delivery::Single(range) => {
            if let Err(e) = source.seek(SeekFrom::Start(range.start)).await {
                return Err(ServeError::new(e.into(), headers));
            }
            insert_header(&mut headers, CONTENT_RANGE, &range.content_range(size));
            (
                StatusCode::PARTIAL_CONTENT,
                range.length,
                Producer::Slice {
                    length: range.length,
                },
            )
        }
        Delivery::Multi(ranges) => {
            let framing = ByteRangesFraming::new();
            let send_size = framing.encoded_len(&ranges, &content_type, size);
            insert_header(&mut headers, CONTENT_TYPE, &framing.content_type());
            (
                StatusCode::PARTIAL_CONTENT,
                send_size,
                Producer::ByteRanges {
                    framing,
                    ranges,
                    content_type,
                    size,
                },
            )
        }
    };

    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if ranged || !headers.contains_key(CONTENT_ENCODING) {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(send_size));
    }

    debug!(
        resource = %resource.name,
        status = status.as_u16(),
        send_size,
        "Delivering content"
    );

    let body = if is_head || send_size == 0 {
        DeliveryBody::empty()
    } else {
        producer.spawn(source, options)
    };
    Ok(build_response(status, headers, body))
}

/// Set `Last-Modified` unless the modification time is unknown
pub fn set_last_modified(headers: &mut HeaderMap, modified: Option<DateTime<Utc>>) {
    if let Some(time) = known_time(modified) {
        insert_header(headers, LAST_MODIFIED, &format_http_date(time));
    }
}

fn insert_header(headers: &mut HeaderMap, name: hyper::header::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => log_build_error(name.as_str(), &e),
    }
}

/// Check that the source holds at least the declared number of bytes, then rewind it
async fn verify_size<S: ByteSource>(source: &mut S, declared: u64) -> Result<u64, DeliveryError> {
    let actual = source.seek(SeekFrom::End(0)).await?;
    source.seek(SeekFrom::Start(0)).await?;
    if actual < declared {
        return Err(DeliveryError::SizeMismatch { declared, actual });
    }
    Ok(declared)
}

/// Body production plan, run on its own task
enum Producer {
    /// Copy `length` bytes from the current source position
    Slice { length: u64 },
    /// Write each range as a part of a `multipart/byteranges` body
    ByteRanges {
        framing: ByteRangesFraming,
        ranges: Vec<ByteRange>,
        content_type: String,
        size: u64,
    },
}

impl Producer {
    fn spawn<S: ByteSource>(self, mut source: S, options: &DeliveryOptions) -> DeliveryBody {
        let (writer, body) = pipe(options.pipe_capacity);
        let chunk_size = options.chunk_size.max(1);

        tokio::spawn(async move {
            let result = match &self {
                Self::Slice { length } => {
                    copy_slice(&mut source, &writer, *length, chunk_size).await
                }
                Self::ByteRanges {
                    framing,
                    ranges,
                    content_type,
                    size,
                } => {
                    write_byte_ranges(
                        &mut source,
                        &writer,
                        framing,
                        ranges,
                        content_type,
                        *size,
                        chunk_size,
                    )
                    .await
                }
            };

            match result {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("Client went away before the body was complete");
                }
                Err(e) => {
                    warn!("Aborting response body: {e}");
                    writer.fail(e).await;
                }
            }
        });

        body
    }
}

/// Copy exactly `length` bytes from `source` into the pipe
async fn copy_slice<S: ByteSource>(
    source: &mut S,
    writer: &PipeWriter,
    length: u64,
    chunk_size: usize,
) -> io::Result<()> {
    let mut remaining = length;
    let mut buf = vec![0u8; usize::try_from(length).map_or(chunk_size, |l| l.min(chunk_size))];

    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = source.read(&mut buf[..want]).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "content ended before the declared size",
            ));
        }
        writer.write(Bytes::copy_from_slice(&buf[..n])).await?;
        remaining -= n as u64;
    }

    Ok(())
}

/// Write every range as one part, then the closing delimiter
async fn write_byte_ranges<S: ByteSource>(
    source: &mut S,
    writer: &PipeWriter,
    framing: &ByteRangesFraming,
    ranges: &[ByteRange],
    content_type: &str,
    size: u64,
    chunk_size: usize,
) -> io::Result<()> {
    for (index, range) in ranges.iter().enumerate() {
        let header = framing.part_header(index, range, content_type, size);
        writer.write(Bytes::from(header)).await?;

        source.seek(SeekFrom::Start(range.start)).await?;
        copy_slice(source, writer, range.length, chunk_size).await?;
    }

    writer
        .write(Bytes::from(framing.closing(ranges.len())))
        .await
}
