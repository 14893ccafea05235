//! Validator generation
//!
//! The delivery layer only compares entity tags; this module derives one for files that have
//! no stored tag, from the metadata that changes whenever the content does.

use crate::fs::Metadata;
use chrono::{DateTime, Utc};

/// Weak `ETag` built from modification time and length
///
/// Weak because two writes within the same timestamp resolution with equal length are not
/// told apart.
///
/// # Examples
/// ```
/// use range_fileserver::fs::Metadata;
/// use range_fileserver::http::cache::metadata_etag;
///
/// let meta = Metadata { name: "a.txt".into(), is_dir: false, len: 255, modified: None };
/// assert_eq!(metadata_etag(&meta), r#"W/"0-ff""#);
/// ```
pub fn metadata_etag(meta: &Metadata) -> String {
    let (secs, nanos) = meta.modified.map_or((0, 0), split_time);
    if nanos == 0 {
        format!("W/\"{secs:x}-{:x}\"", meta.len)
    } else {
        format!("W/\"{secs:x}.{nanos:x}-{:x}\"", meta.len)
    }
}

fn split_time(time: DateTime<Utc>) -> (i64, u32) {
    (time.timestamp(), time.timestamp_subsec_nanos())
}
