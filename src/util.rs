use anyhow::{Context, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::LazyLock;
use time::format_description::well_known::Rfc3339;
use unicode_normalization::UnicodeNormalization;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static regex"));

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Text after the last `.`, if any.
pub fn extension_of(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// Reduce an uploaded filename to something safe to join onto a directory.
///
/// Non-ASCII is decomposed and dropped, separators become word breaks, words are
/// joined with `_`, anything outside `[A-Za-z0-9_.-]` is removed and leading or
/// trailing `.`/`_` are trimmed. The result never contains a path separator and
/// may be empty.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name.nfkd().filter(|c| c.is_ascii()).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(&joined, "");
    cleaned
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Sanitized on-disk name for an upload whose extension already passed
/// validation. Falls back to `document.<ext>` when sanitizing ate the name or
/// its extension.
pub fn storage_filename(original: &str, ext: &str) -> String {
    let safe = secure_filename(original);
    match extension_of(&safe) {
        Some(e) if e.eq_ignore_ascii_case(ext) && safe.len() > e.len() + 1 => safe,
        _ => format!("document.{}", ext.to_ascii_lowercase()),
    }
}

/// `<stem>.pdf` for a sanitized filename.
pub fn pdf_download_name(safe_filename: &str) -> String {
    let stem = safe_filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(safe_filename);
    format!("{stem}.pdf")
}

/// Last `max_chars` characters of a process stream, lossily decoded.
pub fn tail_lossy(bytes: &[u8], max_chars: usize) -> String {
    let s = String::from_utf8_lossy(bytes);
    let s = s.trim();
    let count = s.chars().count();
    if count <= max_chars {
        return s.to_string();
    }
    s.chars().skip(count - max_chars).collect()
}
