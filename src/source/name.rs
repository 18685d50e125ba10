//! Distribution name rules
//!
//! Names compare case-insensitively with runs of `-`, `_` and `.` treated as
//! equal, so `Pip_Test.Package` and `pip-test-package` name the same project.

/// Whether a string is a syntactically valid distribution name
pub fn is_valid(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Canonical form used for comparisons: lowercase, separators collapsed to `-`
pub fn canonicalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    out
}

/// Form used in installed-metadata directory names (`pip_test_package`)
pub fn dist_info_form(name: &str) -> String {
    canonicalize(name).replace('-', "_")
}

/// Whether two names refer to the same distribution
pub fn same(a: &str, b: &str) -> bool {
    canonicalize(a) == canonicalize(b)
}
