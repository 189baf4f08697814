//! Revision key canonicalization
//!
//! The Docs engine shards its cache by the `key` it receives. Keys sent to
//! it must be short and URL/filesystem safe, and the same input must always
//! map to the same key, whether it names a conversion or a thumbnail.

/// Longest key the engine is sent
pub const MAX_REVISION_KEY_LEN: usize = 20;

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '=')
}

/// Canonicalize a caller-supplied key into an engine revision key
///
/// Inputs longer than [`MAX_REVISION_KEY_LEN`] characters are replaced by
/// their 32-bit xxHash checksum in decimal. Any character outside
/// `[0-9A-Za-z_=.-]` becomes `_`, and the result is cut to the maximum
/// length. Canonical keys map to themselves.
///
/// # Example
///
/// ```rust
/// use docbridge::shared::revision::generate_revision_id;
///
/// assert_eq!(generate_revision_id("abc/def"), "abc_def");
/// ```
pub fn generate_revision_id(expected_key: &str) -> String {
    let source = if expected_key.chars().count() > MAX_REVISION_KEY_LEN {
        xxhash_rust::xxh32::xxh32(expected_key.as_bytes(), 0).to_string()
    } else {
        expected_key.to_string()
    };

    source
        .chars()
        .map(|c| if is_key_char(c) { c } else { '_' })
        .take(MAX_REVISION_KEY_LEN)
        .collect()
}
