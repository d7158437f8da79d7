//! Temporary staging directories
//!
//! Every assignment the search tries is laid out in a fresh temporary
//! directory with symbolic links, so the verifier sees the candidates exactly
//! where the torrent expects them. [`StagingDir`] owns that directory: it is
//! removed by [`StagingDir::release`], or on drop if the search bails out
//! early.

use crate::error::{Result, SeedpathError};
use crate::link::create_symbolic_link;
use crate::types::LinkKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, trace};

/// Prefix of every staging directory name
pub const STAGING_PREFIX: &str = "seedpath";

/// A temporary directory holding the links of one assignment
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
}

impl StagingDir {
    /// Create a staging directory named `seedpath.<name>.<random>` in the
    /// system temporary directory
    ///
    /// `name` should already be sanitized.
    pub fn acquire(name: &str) -> Result<Self> {
        Self::acquire_in(std::env::temp_dir(), name)
    }

    /// Like [`acquire`](Self::acquire), below `parent`
    pub fn acquire_in(parent: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{STAGING_PREFIX}.{name}."))
            .tempdir_in(parent)?;
        trace!("Acquired staging directory {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Path of the directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Link `relative_path` inside the directory to `source`
    ///
    /// `source` is made absolute first, so the link resolves regardless of
    /// the working directory.
    pub fn stage(&self, relative_path: &Path, source: &Path) -> Result<PathBuf> {
        let source = std::path::absolute(source)?;
        let target = self.path().join(relative_path);
        if create_symbolic_link(&source, &target)? == LinkKind::Existing {
            debug!("Already staged: {}", target.display());
        }
        Ok(target)
    }

    /// Remove the directory and everything in it
    ///
    /// # Errors
    ///
    /// - [`SeedpathError::Io`] if removal fails
    /// - [`SeedpathError::StagingLeak`] if the directory still exists
    ///   afterwards
    pub fn release(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        if path.exists() {
            return Err(SeedpathError::StagingLeak(path));
        }
        trace!("Released staging directory {}", path.display());
        Ok(())
    }
}
