//! Key path helpers for object store keys.
//!
//! Object keys are always POSIX-style, never start with a separator and never
//! end with one. Base paths and identifiers coming from storage configuration
//! and the file registry may carry stray separators on either side; they are
//! stripped here so the same logical file always maps to the same key.

use crate::constants::KEY_SEPARATOR;
use crate::error::KeyError;

/// Strip leading and trailing separators.
///
/// # Arguments
/// * `segment` - Path fragment to trim
///
/// # Returns
/// The fragment without surrounding `/` characters.
pub fn trim_separators(segment: &str) -> &str {
    segment.trim_matches(KEY_SEPARATOR)
}

/// Join an optional base path and an identifier into an object key.
///
/// `key = (base ? trim(base) + "/" : "") + trim(identifier)`
///
/// # Arguments
/// * `base_path` - Optional prefix configured for the storage
/// * `identifier` - File identifier, with or without a leading slash
///
/// # Errors
/// Returns error if the identifier is empty after trimming or contains a
/// `.` or `..` segment.
pub fn join_key(base_path: Option<&str>, identifier: &str) -> Result<String, KeyError> {
    let name: &str = trim_separators(identifier);
    if name.is_empty() {
        return Err(KeyError::EmptyIdentifier {
            identifier: identifier.to_string(),
        });
    }
    if name.split(KEY_SEPARATOR).any(|s| s == "." || s == "..") {
        return Err(KeyError::RelativeSegment {
            identifier: identifier.to_string(),
        });
    }

    let prefix: &str = base_path.map(trim_separators).unwrap_or_default();
    if prefix.is_empty() {
        Ok(name.to_string())
    } else {
        Ok(format!("{}{}{}", prefix, KEY_SEPARATOR, name))
    }
}

/// Lower-cased extension of the last path segment, if any.
///
/// Dot-files such as `.htaccess` have no extension.
///
/// # Arguments
/// * `path` - POSIX-style path
pub fn extension_of(path: &str) -> Option<String> {
    let file_name: &str = path.rsplit(KEY_SEPARATOR).next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == file_name.len() => None,
        Some(idx) => Some(file_name[idx + 1..].to_ascii_lowercase()),
    }
}
