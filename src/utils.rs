//! Utility functions shared across seedpath
//!
//! ## Categories of Utilities
//!
//! ### Path Manipulation
//! - Stripping a location prefix from a found file ([`make_relative`])
//! - Turning a torrent name into something safe for a directory prefix
//!   ([`sanitize_name`])
//!
//! ### Links
//! - Cross-platform symbolic link creation ([`create_symlink`])
//!
//! ### Display
//! - Human-readable byte counts ([`format_bytes`])
//! - I/O error descriptions for user-facing messages ([`io_reason`])
//!
//! All fallible functions return [`Result<T>`](crate::error::Result).

use crate::error::{Result, SeedpathError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Strip `base` from `path`
///
/// A lexical strip is tried first so that symbolic links inside a location
/// keep the name they were found under. When that fails both paths are
/// canonicalized and stripped again.
///
/// # Errors
///
/// - [`SeedpathError::Io`] if canonicalization fails
/// - [`SeedpathError::Internal`] if `path` is not below `base`
pub fn make_relative(path: &Path, base: &Path) -> Result<PathBuf> {
    if let Ok(relative) = path.strip_prefix(base) {
        return Ok(relative.to_path_buf());
    }

    let path_canon = path.canonicalize()?;
    let base_canon = base.canonicalize()?;

    path_canon
        .strip_prefix(&base_canon)
        .map(Path::to_path_buf)
        .map_err(|_| {
            SeedpathError::internal(format!(
                "Path {:?} is not relative to {:?}",
                path_canon, base_canon
            ))
        })
}

/// Replace characters that do not belong in a directory name
///
/// ASCII letters, digits, space and `'`, `,`, `.`, `-` are kept. Everything
/// else, including path separators and non-ASCII characters, becomes `_`.
///
/// ```rust
/// use seedpath::utils::sanitize_name;
///
/// assert_eq!(sanitize_name("Some.Show/S01 (2019)"), "Some.Show_S01 _2019_");
/// ```
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '\'' | ',' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Format bytes in human-readable form
///
/// Uses binary units. Values below 1024 are printed as whole bytes, larger
/// values with two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Describe an I/O error without the trailing "(os error N)"
pub fn io_reason(error: &io::Error) -> String {
    let message = error.to_string();
    match message.find(" (os error") {
        Some(end) => message[..end].to_string(),
        None => message,
    }
}

/// Create a symbolic link at `link` pointing to `target`
#[cfg(unix)]
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

/// Create a symbolic link at `link` pointing to `target`
#[cfg(windows)]
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    use std::os::windows::fs::{symlink_dir, symlink_file};

    if target.is_dir() {
        symlink_dir(target, link)?;
    } else {
        symlink_file(target, link)?;
    }
    Ok(())
}

/// Whether anything, including a dangling symbolic link, exists at `path`
pub fn path_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
