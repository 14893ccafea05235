//! Directory listing entries

use crate::fs::DirEntry;

/// One row of a directory listing, ready for a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Relative link target, percent-encoded
    pub url: String,
    /// Display name, HTML-escaped
    pub name: String,
}

/// Turn raw directory entries into listing rows sorted by name
///
/// Directories get a trailing `/` in both the link and the display name.
pub fn file_entries(mut entries: Vec<DirEntry>) -> Vec<FileEntry> {
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
        .into_iter()
        .map(|entry| {
            let mut name = entry.name;
            let mut url = urlencoding::encode(&name).into_owned();
            if entry.is_dir {
                name.push('/');
                url.push('/');
            }
            FileEntry {
                url,
                name: escape_html(&name),
            }
        })
        .collect()
}

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
