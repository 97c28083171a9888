//! Object key derivation.
//!
//! A file's object key is its id followed by the extension of the name it
//! was uploaded with, e.g. `aZ3k9QpX.png`. The key is the only link between
//! a file record and its blob, so both stores must agree on it.

/// Key of the blob holding a file's bytes.
pub fn object_key(id: &str, ext: &str) -> String {
    format!("{}{}", id, ext)
}

/// Extension of the final path element, including the leading dot.
///
/// Returns an empty string when the name has no dot.
pub fn file_extension(filename: &str) -> &str {
    let base_start = filename.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    let base = &filename[base_start..];

    match base.rfind('.') {
        Some(dot) => &base[dot..],
        None => "",
    }
}
