//! Link creation
//!
//! Confirmed files are made available under the resolved download location
//! with hard links, so the BitTorrent client sees the expected layout without
//! a byte being copied. Hard links cannot cross filesystems; in that case a
//! symbolic link is created instead.
//!
//! Both the final links and the temporary links of a staging directory go
//! through the same steps:
//!
//! 1. If anything already exists at the target, including a dangling
//!    symbolic link, it is left alone.
//! 2. Missing parent directories are created.
//! 3. The link itself is created.

use crate::error::{Result, SeedpathError};
use crate::types::{ConfirmedFile, LinkKind, LinkRecord};
use crate::utils::{create_symlink, io_reason, path_occupied};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Creates the final links for confirmed files
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkMaterializer;

impl LinkMaterializer {
    /// Create a materializer
    pub fn new() -> Self {
        Self
    }

    /// Hard link `target` to `source`, falling back to a symbolic link across
    /// filesystems
    ///
    /// # Returns
    ///
    /// How the target was satisfied. [`LinkKind::Existing`] means nothing
    /// was touched.
    ///
    /// # Errors
    ///
    /// - [`SeedpathError::CreateDirectory`] if a parent directory cannot be
    ///   created
    /// - [`SeedpathError::Link`] if the link cannot be created
    pub fn create_link(&self, source: &Path, target: &Path) -> Result<LinkKind> {
        link_with(source, target, hardlink_or_symlink)
    }

    /// Create every link in `confirmed`
    ///
    /// All links are attempted even if some fail.
    ///
    /// # Errors
    ///
    /// The first failure, after all links have been attempted.
    #[instrument(skip_all, fields(links = confirmed.len()))]
    pub fn materialize(&self, confirmed: &[ConfirmedFile]) -> Result<Vec<LinkRecord>> {
        let mut records = Vec::with_capacity(confirmed.len());
        let mut first_error = None;

        for file in confirmed {
            match self.create_link(&file.source, &file.target) {
                Ok(kind) => records.push(LinkRecord {
                    source: file.source.clone(),
                    target: file.target.clone(),
                    kind,
                }),
                Err(e) => {
                    warn!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(records),
        }
    }
}

/// Create a symbolic link at `target` pointing to `source`
///
/// Follows the same rules as [`LinkMaterializer::create_link`].
pub fn create_symbolic_link(source: &Path, target: &Path) -> Result<LinkKind> {
    link_with(source, target, |source, target| {
        create_symlink(source, target).map(|()| LinkKind::Symbolic)
    })
}

/// Links the file `source` resolves to, never a symbolic link itself
fn hardlink_or_symlink(source: &Path, target: &Path) -> Result<LinkKind> {
    let source = fs::canonicalize(source)?;
    match fs::hard_link(&source, target) {
        Ok(()) => Ok(LinkKind::Hard),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!("Cross-device link, using symlink: {}", target.display());
            create_symlink(&source, target)?;
            Ok(LinkKind::Symbolic)
        }
        Err(e) => Err(e.into()),
    }
}

fn link_with<F>(source: &Path, target: &Path, link: F) -> Result<LinkKind>
where
    F: FnOnce(&Path, &Path) -> Result<LinkKind>,
{
    if path_occupied(target) {
        debug!("Already exists: {}", target.display());
        return Ok(LinkKind::Existing);
    }

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SeedpathError::CreateDirectory {
            path: parent.to_path_buf(),
            reason: io_reason(&e),
        })?;
    }

    debug!("Linking {} -> {}", target.display(), source.display());
    link(source, target).map_err(|e| SeedpathError::Link {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        reason: match e {
            SeedpathError::Io(e) => io_reason(&e),
            other => other.to_string(),
        },
    })
}
