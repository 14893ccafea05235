//! HTTP-date handling
//!
//! Formats `Last-Modified` values and parses the three date forms a client may send.

use chrono::{DateTime, NaiveDateTime, Utc};

/// IMF-fixdate, the preferred format (RFC 7231 §7.1.1.1)
const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// Obsolete RFC 850 format
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
/// ANSI C `asctime()` format
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Format a timestamp as an HTTP-date in UTC with second precision
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use range_fileserver::http::date::format_http_date;
///
/// let t = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
/// assert_eq!(format_http_date(t), "Sun, 06 Nov 1994 08:49:37 GMT");
/// ```
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format(IMF_FIXDATE).to_string()
}

/// Parse an HTTP-date in any of the accepted forms
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    [IMF_FIXDATE, RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Treat the zero time and the Unix epoch as "unknown"
///
/// Filesystems without modification times commonly report the epoch.
pub fn known_time(time: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    time.filter(|t| t.timestamp() != 0 || t.timestamp_subsec_nanos() != 0)
}
