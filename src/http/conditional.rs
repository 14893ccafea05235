//! Conditional request evaluation
//!
//! Applies `If-Match`, `If-Unmodified-Since`, `If-None-Match`, `If-Modified-Since` and
//! `If-Range` in RFC 7232 §6 order. Every check yields a tri-state [`Outcome`] so that an
//! absent header can fall through to the next one in precedence.

use super::date::{known_time, parse_http_date};
use super::etag::{self, ListMatch};
use chrono::{DateTime, Utc};
use hyper::header::{
    HeaderMap, HeaderName, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE,
    IF_UNMODIFIED_SINCE, RANGE,
};
use hyper::Method;
use std::borrow::Cow;

/// Result of a single conditional header check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Header missing, unparseable, or not applicable to the method
    Absent,
    Satisfied,
    NotSatisfied,
}

/// Method category relevant to conditional evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// GET and HEAD
    Safe,
    /// Every other method
    Unsafe,
}

impl From<&Method> for MethodKind {
    fn from(method: &Method) -> Self {
        if method == Method::GET || method == Method::HEAD {
            Self::Safe
        } else {
            Self::Unsafe
        }
    }
}

/// Raw conditional header values taken from a request
///
/// Empty header values are treated the same as missing ones. Bytes outside UTF-8
/// (`obs-text`) are kept as U+FFFD so the header still takes part in evaluation.
#[derive(Debug, Clone, Default)]
pub struct Preconditions<'a> {
    pub if_match: Option<Cow<'a, str>>,
    pub if_none_match: Option<Cow<'a, str>>,
    pub if_modified_since: Option<Cow<'a, str>>,
    pub if_unmodified_since: Option<Cow<'a, str>>,
    pub if_range: Option<Cow<'a, str>>,
    pub range: Option<Cow<'a, str>>,
}

impl<'a> Preconditions<'a> {
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        Self {
            if_match: header_str(headers, &IF_MATCH),
            if_none_match: header_str(headers, &IF_NONE_MATCH),
            if_modified_since: header_str(headers, &IF_MODIFIED_SINCE),
            if_unmodified_since: header_str(headers, &IF_UNMODIFIED_SINCE),
            if_range: header_str(headers, &IF_RANGE),
            range: header_str(headers, &RANGE),
        }
    }
}

/// First value of a header as text, `None` when missing or empty
///
/// Invalid UTF-8 is replaced rather than dropped: a present header must never read as absent.
pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .filter(|v| !v.is_empty())
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
}

/// Resource state the conditions are evaluated against
#[derive(Debug, Clone, Copy, Default)]
pub struct Validators<'a> {
    /// `ETag` response header already chosen by the caller
    pub etag: Option<&'a str>,
    pub modified: Option<DateTime<Utc>>,
}

impl Validators<'_> {
    fn etag(&self) -> &str {
        self.etag.unwrap_or_default()
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        known_time(self.modified)
    }
}

/// Combined decision for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition<'a> {
    /// Continue with delivery; `range` is the `Range` header that survived `If-Range`
    Proceed { range: Option<&'a str> },
    NotModified,
    PreconditionFailed,
}

/// Evaluate all conditional headers in precedence order
///
/// # Examples
/// ```
/// use range_fileserver::http::conditional::{
///     evaluate, Disposition, MethodKind, Preconditions, Validators,
/// };
///
/// let conds = Preconditions { if_none_match: Some(r#""v1""#.into()), ..Default::default() };
/// let validators = Validators { etag: Some(r#""v1""#), modified: None };
/// assert_eq!(evaluate(MethodKind::Safe, &conds, &validators), Disposition::NotModified);
/// ```
pub fn evaluate<'c>(
    method: MethodKind,
    conds: &'c Preconditions<'_>,
    validators: &Validators<'_>,
) -> Disposition<'c> {
    let mut outcome = check_if_match(conds.if_match.as_deref(), validators);
    if outcome == Outcome::Absent {
        outcome = check_if_unmodified_since(conds.if_unmodified_since.as_deref(), validators);
    }
    if outcome == Outcome::NotSatisfied {
        return Disposition::PreconditionFailed;
    }

    match check_if_none_match(conds.if_none_match.as_deref(), validators) {
        Outcome::NotSatisfied if method == MethodKind::Safe => return Disposition::NotModified,
        Outcome::Absent => {
            if check_if_modified_since(method, conds.if_modified_since.as_deref(), validators)
                == Outcome::NotSatisfied
            {
                return Disposition::NotModified;
            }
        }
        _ => {}
    }

    let range = conds.range.as_deref().filter(|_| {
        check_if_range(method, conds.if_range.as_deref(), validators) != Outcome::NotSatisfied
    });
    Disposition::Proceed { range }
}

/// `If-Match`: any listed tag must strongly match the current `ETag`
pub fn check_if_match(header: Option<&str>, validators: &Validators<'_>) -> Outcome {
    let Some(list) = header else {
        return Outcome::Absent;
    };

    match etag::match_list(list, validators.etag(), etag::strong_match) {
        ListMatch::Any | ListMatch::Matched => Outcome::Satisfied,
        ListMatch::NoMatch => Outcome::NotSatisfied,
    }
}

/// `If-None-Match`: a weakly matching tag or `*` blocks the request
pub fn check_if_none_match(header: Option<&str>, validators: &Validators<'_>) -> Outcome {
    let Some(list) = header else {
        return Outcome::Absent;
    };

    match etag::match_list(list, validators.etag(), etag::weak_match) {
        ListMatch::Any | ListMatch::Matched => Outcome::NotSatisfied,
        ListMatch::NoMatch => Outcome::Satisfied,
    }
}

/// `If-Unmodified-Since`, applicable to every method
pub fn check_if_unmodified_since(header: Option<&str>, validators: &Validators<'_>) -> Outcome {
    let Some((since, modified)) = time_condition(header, validators) else {
        return Outcome::Absent;
    };

    if modified.timestamp() <= since.timestamp() {
        Outcome::Satisfied
    } else {
        Outcome::NotSatisfied
    }
}

/// `If-Modified-Since`, GET and HEAD only
pub fn check_if_modified_since(
    method: MethodKind,
    header: Option<&str>,
    validators: &Validators<'_>,
) -> Outcome {
    if method != MethodKind::Safe {
        return Outcome::Absent;
    }
    let Some((since, modified)) = time_condition(header, validators) else {
        return Outcome::Absent;
    };

    if modified.timestamp() <= since.timestamp() {
        Outcome::NotSatisfied
    } else {
        Outcome::Satisfied
    }
}

/// `If-Range`: an entity tag needs a strong match, a date needs exact-second equality
pub fn check_if_range(
    method: MethodKind,
    header: Option<&str>,
    validators: &Validators<'_>,
) -> Outcome {
    if method != MethodKind::Safe {
        return Outcome::Absent;
    }
    let Some(value) = header else {
        return Outcome::Absent;
    };

    if let Some((tag, _)) = etag::scan(value) {
        return satisfied_if(etag::strong_match(tag.as_str(), validators.etag()));
    }

    let Some(modified) = validators.modified() else {
        return Outcome::NotSatisfied;
    };
    match parse_http_date(value) {
        Some(date) => satisfied_if(date.timestamp() == modified.timestamp()),
        None => Outcome::NotSatisfied,
    }
}

/// Header time and resource time, when both are usable
fn time_condition(
    header: Option<&str>,
    validators: &Validators<'_>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let modified = validators.modified()?;
    let since = parse_http_date(header?)?;
    Some((since, modified))
}

const fn satisfied_if(matched: bool) -> Outcome {
    if matched {
        Outcome::Satisfied
    } else {
        Outcome::NotSatisfied
    }
}
