//! Download location search
//!
//! [`LocationFinder`] ties the pieces together:
//!
//! 1. **Collect**: every expected file gets its ranked size matches from the
//!    configured locations ([`CandidateCollector`]).
//! 2. **Search**: a [`Combinator`] enumerates assignments of one candidate
//!    per expected file. Each assignment is linked into a fresh
//!    [`StagingDir`] in the torrent's layout and every not yet confirmed file
//!    is checked by a [`ContentVerifier`]. Files that pass are locked in the
//!    combinator, so later assignments only vary what is still open. The
//!    search ends when every expected file is confirmed or the assignments
//!    run out.
//! 3. **Materialize**: confirmed files are linked below the location of the
//!    first file that was confirmed ([`LinkMaterializer`]).
//!
//! The returned location is, in order of preference, the location of the
//! first confirmed file, the configured default, or the first configured
//! location.
//!
//! ## Example
//!
//! ```rust,no_run
//! use seedpath::LocationFinder;
//!
//! # fn main() -> seedpath::Result<()> {
//! let finder = LocationFinder::builder()
//!     .location("/downloads/movies")
//!     .location("/downloads/incoming")
//!     .default_location("/downloads/new")
//!     .build("Some.Movie.2019.torrent")?;
//!
//! let report = finder.find_with_report()?;
//! println!("{} ({:?})", report.location.display(), report.origin);
//! for link in &report.links {
//!     println!("  {} -> {}", link.target.display(), link.source.display());
//! }
//! # Ok(())
//! # }
//! ```

use crate::candidates::{CandidateCollector, DEFAULT_MAX_CANDIDATES};
use crate::combinator::Combinator;
use crate::error::{Result, SeedpathError};
use crate::link::LinkMaterializer;
use crate::manifest::{ContentVerifier, Manifest};
use crate::staging::StagingDir;
use crate::types::{
    CandidateSet, ConfirmedFile, ExpectedFile, FindReport, LocationOrigin, SearchProgress,
    Verification,
};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Callback invoked after every assignment
pub type ProgressCallback = Box<dyn Fn(&SearchProgress) + Send + Sync>;

/// Builder for [`LocationFinder`]
///
/// # Examples
///
/// ```rust
/// use seedpath::LocationFinder;
///
/// let finder = LocationFinder::builder()
///     .locations(["/a", "/b", "/a"])
///     .max_candidates(5)
///     .build("some.torrent")
///     .unwrap();
/// assert_eq!(finder.locations().len(), 2);
/// ```
#[derive(Default)]
pub struct LocationFinderBuilder {
    locations: Vec<PathBuf>,
    default_location: Option<PathBuf>,
    max_candidates: Option<usize>,
    staging_parent: Option<PathBuf>,
    progress: Option<ProgressCallback>,
}

impl LocationFinderBuilder {
    /// Create a builder with no locations
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a potential download location
    ///
    /// Locations are searched in the order they are added.
    pub fn location(mut self, location: impl Into<PathBuf>) -> Self {
        self.locations.push(location.into());
        self
    }

    /// Add several potential download locations
    pub fn locations<I, P>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.locations.extend(locations.into_iter().map(Into::into));
        self
    }

    /// Location to report when no file is found
    ///
    /// Without a default the first location is reported.
    pub fn default_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.default_location = Some(location.into());
        self
    }

    /// Keep at most `count` candidates per expected file
    ///
    /// Defaults to 3. The number of assignments grows with the product of
    /// the candidate counts.
    pub fn max_candidates(mut self, count: usize) -> Self {
        self.max_candidates = Some(count.max(1));
        self
    }

    /// Create staging directories below `parent` instead of the system
    /// temporary directory
    pub fn staging_dir(mut self, parent: impl Into<PathBuf>) -> Self {
        self.staging_parent = Some(parent.into());
        self
    }

    /// Report progress after every assignment
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SearchProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Build the finder for the torrent at `torrent`
    ///
    /// The torrent is not read until [`LocationFinder::find`].
    ///
    /// # Errors
    ///
    /// [`SeedpathError::NoLocations`] if no location was added.
    pub fn build(self, torrent: impl Into<PathBuf>) -> Result<LocationFinder> {
        let mut locations: Vec<PathBuf> = Vec::with_capacity(self.locations.len());
        for location in self.locations {
            if !locations.contains(&location) {
                locations.push(location);
            }
        }
        if locations.is_empty() {
            return Err(SeedpathError::NoLocations);
        }

        Ok(LocationFinder {
            torrent: torrent.into(),
            locations,
            default_location: self
                .default_location
                .filter(|p| !p.as_os_str().is_empty()),
            max_candidates: self.max_candidates.unwrap_or(DEFAULT_MAX_CANDIDATES),
            staging_parent: self.staging_parent,
            progress: self.progress,
        })
    }
}

/// Finds the download location of a torrent and links existing files into it
pub struct LocationFinder {
    torrent: PathBuf,
    locations: Vec<PathBuf>,
    default_location: Option<PathBuf>,
    max_candidates: usize,
    staging_parent: Option<PathBuf>,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for LocationFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationFinder")
            .field("torrent", &self.torrent)
            .field("locations", &self.locations)
            .field("default_location", &self.default_location)
            .field("max_candidates", &self.max_candidates)
            .field("staging_parent", &self.staging_parent)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl LocationFinder {
    /// Start building a finder
    pub fn builder() -> LocationFinderBuilder {
        LocationFinderBuilder::new()
    }

    /// Create a finder with default settings
    ///
    /// Duplicate locations are removed, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// [`SeedpathError::NoLocations`] if `locations` is empty.
    pub fn new<I, P>(torrent: impl Into<PathBuf>, locations: I, default: Option<PathBuf>) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut builder = LocationFinderBuilder::new().locations(locations);
        if let Some(default) = default {
            builder = builder.default_location(default);
        }
        builder.build(torrent)
    }

    /// Torrent file this finder works on
    pub fn torrent(&self) -> &Path {
        &self.torrent
    }

    /// De-duplicated locations in search order
    pub fn locations(&self) -> &[PathBuf] {
        &self.locations
    }

    /// Configured default location
    pub fn default_location(&self) -> Option<&Path> {
        self.default_location.as_deref()
    }

    /// Find the download location, linking every verified file into it
    ///
    /// # Errors
    ///
    /// - [`SeedpathError::Manifest`] if the torrent cannot be read
    /// - link errors if a confirmed file cannot be linked into place
    pub fn find(&self) -> Result<PathBuf> {
        self.find_with_report().map(|report| report.location)
    }

    /// Like [`find`](Self::find), returning everything the search decided
    #[instrument(skip(self), fields(torrent = %self.torrent.display()))]
    pub fn find_with_report(&self) -> Result<FindReport> {
        let manifest = Manifest::read(&self.torrent)?;
        self.search(manifest.files(), &manifest.sanitized_name(), &manifest)
    }

    /// Search the locations for `files`, verifying candidates with `verifier`
    ///
    /// `staging_name` becomes part of every staging directory name and should
    /// be sanitized. [`find_with_report`](Self::find_with_report) calls this
    /// with the torrent's own files and the [`Manifest`] as verifier.
    ///
    /// # Errors
    ///
    /// - [`SeedpathError::StagingLeak`] if a staging directory survives its
    ///   release
    /// - I/O and link errors while staging or materializing
    pub fn search<V>(&self, files: &[ExpectedFile], staging_name: &str, verifier: &V) -> Result<FindReport>
    where
        V: ContentVerifier + ?Sized,
    {
        let candidates = CandidateCollector::new(&self.locations, files)
            .max_candidates(self.max_candidates)
            .collect()?;
        log_candidates(&candidates);

        let mut combinator = Combinator::new(
            candidates
                .iter()
                .map(|(file, ranked)| (file.clone(), ranked.to_vec())),
        );
        let mut confirmed: BTreeMap<ExpectedFile, ConfirmedFile> = BTreeMap::new();
        let mut resolved: Option<PathBuf> = None;
        let mut assignments_tried = 0;

        while let Some(mut assignment) = combinator.next() {
            if assignment.is_empty() {
                debug!("No file has a size match");
                break;
            }
            assignments_tried += 1;
            debug!(
                "Assignment {}: {} / {} files",
                assignments_tried,
                confirmed.len(),
                files.len()
            );

            let staging = self.acquire_staging(staging_name)?;
            for (file, candidate) in &mut assignment {
                staging.stage(&file.relative_path, &candidate.filepath)?;
                candidate.staged_at = Some(staging.path().to_path_buf());
            }

            for (file, candidate) in &assignment {
                if let Some(found) = confirmed.get(file) {
                    debug!("  {}: Already found {}", file, found.source.display());
                    continue;
                }

                let outcome = verifier.verify(staging.path(), file).unwrap_or_else(|e| {
                    warn!("  {}: Verification failed: {}", file, e);
                    Verification::Inconclusive
                });

                match outcome {
                    Verification::Valid => {
                        let location = resolved.get_or_insert_with(|| {
                            debug!("Setting download location: {}", candidate.location.display());
                            candidate.location.clone()
                        });
                        debug!("  {}: Using {}", file, candidate.filepath.display());
                        confirmed.insert(
                            file.clone(),
                            ConfirmedFile {
                                relative_path: file.relative_path.clone(),
                                source: candidate.filepath.clone(),
                                target: location.join(&file.relative_path),
                            },
                        );
                    }
                    Verification::Invalid | Verification::Inconclusive => {
                        debug!(
                            "  {}: Not using {} ({:?})",
                            file,
                            candidate.filepath.display(),
                            outcome
                        );
                    }
                }
            }

            staging.release()?;
            combinator.lock(confirmed.keys())?;

            if let Some(progress) = &self.progress {
                progress(&SearchProgress {
                    assignment: assignments_tried,
                    confirmed: confirmed.len(),
                    total: files.len(),
                });
            }

            if files.iter().all(|file| confirmed.contains_key(file)) {
                debug!("All files found");
                break;
            }
        }

        // Manifest order for links and report
        let confirmed: Vec<ConfirmedFile> = files
            .iter()
            .filter_map(|file| confirmed.get(file).cloned())
            .collect();
        let unmatched: Vec<PathBuf> = files
            .iter()
            .filter(|file| !confirmed.iter().any(|c| c.relative_path == file.relative_path))
            .map(|file| file.relative_path.clone())
            .collect();

        let links = LinkMaterializer::new().materialize(&confirmed)?;
        let (location, origin) = self.resolve(resolved);
        info!(
            "Download location: {} ({:?}, {} of {} files after {} assignment(s))",
            location.display(),
            origin,
            confirmed.len(),
            files.len(),
            assignments_tried
        );

        Ok(FindReport {
            location,
            origin,
            confirmed,
            unmatched,
            links,
            assignments_tried,
        })
    }

    fn acquire_staging(&self, name: &str) -> Result<StagingDir> {
        match &self.staging_parent {
            Some(parent) => StagingDir::acquire_in(parent, name),
            None => StagingDir::acquire(name),
        }
    }

    fn resolve(&self, found: Option<PathBuf>) -> (PathBuf, LocationOrigin) {
        if let Some(location) = found {
            return (location, LocationOrigin::Found);
        }
        if let Some(default) = &self.default_location {
            debug!("Default location: {}", default.display());
            return (default.clone(), LocationOrigin::Default);
        }
        // Never empty after build()
        let first = self.locations.first().cloned().unwrap_or_default();
        debug!("First location: {}", first.display());
        (first, LocationOrigin::FirstLocation)
    }
}

fn log_candidates(candidates: &CandidateSet) {
    debug!("Iterating over combinations of temporary symlinks:");
    for (file, ranked) in candidates.iter() {
        let paths: Vec<_> = ranked.iter().map(|c| c.filepath.display().to_string()).collect();
        debug!("  * {:?} -> {}", paths, file);
    }
}
