//! Upload filename handling.
//!
//! Client-supplied filenames are never trusted: they are reduced to a safe
//! ASCII subset before any part of them reaches the upload directory, and
//! stored names are prefixed with the upload time.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Characters that survive sanitizing. Everything else is dropped.
static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"));

/// Timestamp prefix format for stored filenames (second resolution).
pub const STORED_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Reduce a client-supplied filename to a safe, flat ASCII name.
///
/// - accented letters are folded to their base letter (NFKD), any other
///   non-ASCII character is dropped
/// - path separators become whitespace, so directory parts cannot survive
/// - whitespace runs are joined with `_`
/// - any character outside `[A-Za-z0-9_.-]` is removed
/// - leading and trailing `.` / `_` are stripped
///
/// The result may be empty.
///
/// ```
/// use logbook_core::filename::secure_filename;
///
/// assert_eq!(secure_filename("My Photo.JPG"), "My_Photo.JPG");
/// assert_eq!(secure_filename("../../etc/passwd"), "etc_passwd");
/// ```
pub fn secure_filename(raw: &str) -> String {
    let ascii: String = raw
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    UNSAFE_CHARS_RE
        .replace_all(&joined, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Split a filename into `(base, extension)`, where the extension keeps its
/// leading dot. Leading dots never start an extension, so `.bashrc` has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if name[..idx].chars().any(|c| c != '.') => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Lowercased extension of `name` without the dot, or `None` if it has none.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = split_extension(name);
    ext.strip_prefix('.')
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Build the stored filename `{timestamp}_{base}{final_ext}`.
///
/// `final_ext` must include its leading dot.
pub fn stored_filename(uploaded_at: NaiveDateTime, base: &str, final_ext: &str) -> String {
    format!(
        "{}_{base}{final_ext}",
        uploaded_at.format(STORED_TIMESTAMP_FORMAT)
    )
}

/// Insert `_{suffix}` before the extension of `name`.
///
/// Used when the timestamped name is already taken on disk.
pub fn with_suffix(name: &str, suffix: &str) -> String {
    let (base, ext) = split_extension(name);
    format!("{base}_{suffix}{ext}")
}
