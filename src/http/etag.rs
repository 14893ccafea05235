//! Entity tag parsing and comparison
//!
//! Implements the `ETag` grammar and the strong/weak comparison functions of RFC 7232.

/// Weak validator prefix
const WEAK_PREFIX: &str = "W/";

/// A syntactically valid entity tag borrowed from a header value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityTag<'a> {
    raw: &'a str,
}

impl<'a> EntityTag<'a> {
    /// Full tag text including quotes and any weak prefix
    pub const fn as_str(&self) -> &'a str {
        self.raw
    }

    pub fn is_weak(&self) -> bool {
        self.raw.starts_with(WEAK_PREFIX)
    }
}

/// Trim the optional whitespace allowed around list elements
pub(crate) fn trim_ows(s: &str) -> &str {
    s.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

/// Scan one entity tag from the head of `s`
///
/// Returns the tag and the unconsumed remainder, or `None` when the head of
/// the input is not a well-formed tag.
///
/// # Examples
/// ```
/// use range_fileserver::http::etag::scan;
///
/// let (tag, rest) = scan(r#"W/"v1", "v2""#).unwrap();
/// assert_eq!(tag.as_str(), r#"W/"v1""#);
/// assert!(tag.is_weak());
/// assert_eq!(rest, r#", "v2""#);
/// ```
pub fn scan(s: &str) -> Option<(EntityTag<'_>, &str)> {
    let s = trim_ows(s);
    let start = if s.starts_with(WEAK_PREFIX) {
        WEAK_PREFIX.len()
    } else {
        0
    };

    let bytes = s.as_bytes();
    if bytes.len() - start < 2 || bytes[start] != b'"' {
        return None;
    }

    for (i, &c) in bytes.iter().enumerate().skip(start + 1) {
        match c {
            // etagc = %x21 / %x23-7E / obs-text
            0x21 | 0x23..=0x7E | 0x80..=0xFF => {}
            b'"' => return Some((EntityTag { raw: &s[..=i] }, &s[i + 1..])),
            _ => return None,
        }
    }

    None
}

/// Strong comparison: both tags present, identical, and not weak
pub fn strong_match(a: &str, b: &str) -> bool {
    a == b && a.starts_with('"')
}

/// Weak comparison: tags equal once any weak prefix is removed
pub fn weak_match(a: &str, b: &str) -> bool {
    strip_weak(a) == strip_weak(b)
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix(WEAK_PREFIX).unwrap_or(tag)
}

/// Outcome of scanning a comma separated tag list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMatch {
    /// The list is the wildcard `*`
    Any,
    /// An element matched
    Matched,
    /// Nothing matched, or the list was malformed
    NoMatch,
}

/// Walk an `If-Match` / `If-None-Match` list, comparing each element with `current`
///
/// Parsing stops at the first malformed element; elements seen before it still count.
pub fn match_list(list: &str, current: &str, matches: fn(&str, &str) -> bool) -> ListMatch {
    let mut buf = list;
    loop {
        buf = trim_ows(buf);
        if buf.is_empty() {
            break;
        }
        if let Some(rest) = buf.strip_prefix(',') {
            buf = rest;
            continue;
        }
        if buf.starts_with('*') {
            return ListMatch::Any;
        }

        let Some((tag, rest)) = scan(buf) else {
            break;
        };
        if matches(tag.as_str(), current) {
            return ListMatch::Matched;
        }
        buf = rest;
    }

    ListMatch::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_strong() {
        let (tag, rest) = scan(r#"  "abc" , "def""#).unwrap();
        assert_eq!(tag.as_str(), r#""abc""#);
        assert!(!tag.is_weak());
        assert_eq!(rest, r#" , "def""#);
    }

    #[test]
    fn test_scan_rejects_malformed() {
        assert!(scan("abc").is_none());
        assert!(scan(r#"""#).is_none());
        assert!(scan(r#""unterminated"#).is_none());
        assert!(scan("W/").is_none());
        assert!(scan("\"a b\"").is_none());
        assert!(scan("").is_none());
    }

    #[test]
    fn test_scan_empty_tag() {
        let (tag, rest) = scan(r#""""#).unwrap();
        assert_eq!(tag.as_str(), r#""""#);
        assert_eq!(rest, "");
    }

    #[test]
    fn test_strong_match() {
        assert!(strong_match(r#""xyzzy""#, r#""xyzzy""#));
        assert!(!strong_match(r#"W/"xyzzy""#, r#"W/"xyzzy""#));
        assert!(!strong_match(r#"W/"xyzzy""#, r#""xyzzy""#));
        assert!(!strong_match(r#""xyzzy""#, r#""other""#));
        assert!(!strong_match("", ""));
    }

    #[test]
    fn test_weak_match() {
        assert!(weak_match(r#"W/"xyzzy""#, r#""xyzzy""#));
        assert!(weak_match(r#"W/"xyzzy""#, r#"W/"xyzzy""#));
        assert!(weak_match(r#""xyzzy""#, r#""xyzzy""#));
        assert!(!weak_match(r#"W/"xyzzy""#, r#""other""#));
    }

    #[test]
    fn test_match_list() {
        let current = r#""v2""#;
        assert_eq!(
            match_list(r#""v1", "v2""#, current, strong_match),
            ListMatch::Matched
        );
        assert_eq!(
            match_list(r#",, "v1" ,"v3""#, current, strong_match),
            ListMatch::NoMatch
        );
        assert_eq!(match_list(" * ", current, strong_match), ListMatch::Any);
        assert_eq!(
            match_list(r#"W/"v2""#, current, weak_match),
            ListMatch::Matched
        );
        // garbage stops the scan
        assert_eq!(
            match_list(r#"bogus, "v2""#, current, strong_match),
            ListMatch::NoMatch
        );
    }
}
