//! Locations file
//!
//! Potential download locations are usually kept in a plain text file, one
//! directory per line:
//!
//! ```text
//! # Finished downloads
//! /srv/torrents/complete
//! ~/Downloads
//!
//! # Every subdirectory of the media library
//! $MEDIA_ROOT/*
//! ```
//!
//! - Blank lines and lines starting with `#` are ignored.
//! - `~` at the start of a line is the home directory.
//! - `$NAME` is replaced with the environment variable `NAME`, which must be
//!   set and not empty.
//! - A line ending in `/*` stands for every subdirectory of the path before
//!   it, sorted by name. Entries that are not directories are skipped.
//! - A line naming an existing path that is not a directory is an error.
//!
//! Errors point at the offending line as `path@line: reason`.

use crate::error::{Result, SeedpathError};
use crate::utils::io_reason;
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::debug;

/// Directory below the user's config directory
pub const CONFIG_DIR_NAME: &str = "seedpath";

/// File name of the locations file
pub const LOCATIONS_FILE_NAME: &str = "locations";

static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$([a-zA-Z_]+[a-zA-Z0-9_]*)").expect("environment variable pattern is valid")
});

/// Default locations file, `<config dir>/seedpath/locations`
///
/// `None` if the platform has no config directory.
pub fn default_locations_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(LOCATIONS_FILE_NAME))
}

/// Ordered list of normalized download locations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locations {
    filepath: Option<PathBuf>,
    paths: Vec<PathBuf>,
}

impl Locations {
    /// Empty list that is not backed by a file
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the [default locations file](default_locations_file)
    ///
    /// A missing file gives an empty list.
    pub fn from_default_file() -> Result<Self> {
        match default_locations_file() {
            Some(path) => Self::read(&path, true),
            None => Ok(Self::new()),
        }
    }

    /// Read the locations file at `path`
    ///
    /// # Errors
    ///
    /// [`SeedpathError::Config`] if the file cannot be read (including when
    /// it does not exist) or a line is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::read(path.as_ref(), false)
    }

    fn read(path: &Path, missing_ok: bool) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if missing_ok && e.kind() == io::ErrorKind::NotFound => {
                debug!("No locations file at {}", path.display());
                String::new()
            }
            Err(e) => {
                return Err(SeedpathError::config(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    io_reason(&e)
                )))
            }
        };

        let mut paths = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            paths.extend(normalize(line).map_err(|e| e.at_line(path, index + 1))?);
        }

        debug!("Read {} location(s) from {}", paths.len(), path.display());
        Ok(Self {
            filepath: Some(path.to_path_buf()),
            paths,
        })
    }

    /// File the locations were read from
    pub fn filepath(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }

    /// Normalize `locations` and put them before the existing ones
    ///
    /// The given order is kept.
    pub fn prepend<I, S>(&mut self, locations: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut front = Vec::new();
        for location in locations {
            front.extend(normalize(location.as_ref())?);
        }
        front.append(&mut self.paths);
        self.paths = front;
        Ok(())
    }

    /// Normalize `location` and append it
    pub fn push(&mut self, location: &str) -> Result<()> {
        let normalized = normalize(location)?;
        self.paths.extend(normalized);
        Ok(())
    }

    /// Locations in order
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Iterate over the locations
    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    /// Number of locations
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether there are no locations
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Consume into the plain list
    pub fn into_vec(self) -> Vec<PathBuf> {
        self.paths
    }
}

impl<'a> IntoIterator for &'a Locations {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Expand one locations file line into its paths
///
/// Errors carry no file position; [`Locations::from_file`] adds it.
pub fn normalize(line: &str) -> Result<Vec<PathBuf>> {
    let glob_suffix = format!("{MAIN_SEPARATOR}*");
    let mut paths = match line.strip_suffix(glob_suffix.as_str()) {
        Some(parent) => subdirectories(&resolve(parent)?)?,
        None => vec![resolve(line)?],
    };

    for path in &paths {
        if path.exists() && !path.is_dir() {
            return Err(SeedpathError::config(format!(
                "Not a directory: {}",
                path.display()
            )));
        }
    }

    paths.sort();
    Ok(paths)
}

/// Subdirectories of `parent`, plus entries that vanished while listing
fn subdirectories(parent: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(parent).map_err(|e| {
        SeedpathError::config(format!(
            "Failed to read subdirectories from {}: {}",
            parent.display(),
            io_reason(&e)
        ))
    })?;

    let mut subdirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() || !path.exists() {
            subdirs.push(path);
        }
    }
    Ok(subdirs)
}

/// Expand a leading `~` and every `$NAME`
fn resolve(line: &str) -> Result<PathBuf> {
    let line = expand_tilde(line);

    let mut resolved = String::with_capacity(line.len());
    let mut last = 0;
    for captures in ENV_VAR.captures_iter(&line) {
        let (whole, name) = match (captures.get(0), captures.get(1)) {
            (Some(whole), Some(name)) => (whole, name.as_str()),
            _ => continue,
        };
        let value = match env::var(name) {
            Ok(value) if value.is_empty() => {
                return Err(SeedpathError::config(format!(
                    "Empty environment variable: ${name}"
                )))
            }
            Ok(value) => value,
            Err(env::VarError::NotPresent) => {
                return Err(SeedpathError::config(format!(
                    "Unset environment variable: ${name}"
                )))
            }
            Err(env::VarError::NotUnicode(_)) => {
                return Err(SeedpathError::config(format!(
                    "Environment variable is not valid Unicode: ${name}"
                )))
            }
        };
        resolved.push_str(&line[last..whole.start()]);
        resolved.push_str(&value);
        last = whole.end();
    }
    resolved.push_str(&line[last..]);

    Ok(PathBuf::from(resolved))
}

fn expand_tilde(line: &str) -> String {
    let rest = match line.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(MAIN_SEPARATOR) => rest,
        _ => return line.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{}", home.display(), rest),
        None => line.to_string(),
    }
}
