//! Candidate collection
//!
//! The collector walks every configured location and pairs each existing file
//! with the expected files of the same size. The surviving pairs are ranked by
//! [path similarity](crate::similarity) and only the best few per expected
//! file are kept, since every extra candidate multiplies the number of
//! assignments the search may have to stage.
//!
//! ## Walk order
//!
//! Locations are visited in configured order and each directory's entries
//! sorted by file name, with symbolic links followed. Ranking is a stable
//! sort, so candidates with equal similarity keep this order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use seedpath::candidates::CandidateCollector;
//! use seedpath::types::ExpectedFile;
//! use std::path::PathBuf;
//!
//! # fn main() -> seedpath::Result<()> {
//! let locations = vec![PathBuf::from("/downloads"), PathBuf::from("/archive")];
//! let expected = vec![ExpectedFile::new("Album/01.flac", 31_337)];
//!
//! let candidates = CandidateCollector::new(&locations, &expected)
//!     .max_candidates(5)
//!     .collect()?;
//! for (file, ranked) in candidates.iter() {
//!     println!("{}: {} candidate(s)", file, ranked.len());
//! }
//! # Ok(())
//! # }
//! ```

use crate::collections::HashMap;
use crate::error::Result;
use crate::similarity::PathMatcher;
use crate::types::{Candidate, CandidateSet, ExpectedFile};
use crate::utils::make_relative;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace, warn};
use walkdir::WalkDir;

/// Default number of candidates kept per expected file
pub const DEFAULT_MAX_CANDIDATES: usize = 3;

/// Finds and ranks size-matching files for a set of expected files
#[derive(Debug)]
pub struct CandidateCollector<'a> {
    locations: &'a [PathBuf],
    expected: &'a [ExpectedFile],
    max_candidates: usize,
}

impl<'a> CandidateCollector<'a> {
    /// Create a collector over `locations` for the files in `expected`
    pub fn new(locations: &'a [PathBuf], expected: &'a [ExpectedFile]) -> Self {
        Self {
            locations,
            expected,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    /// Keep at most `count` candidates per expected file (minimum 1)
    pub fn max_candidates(mut self, count: usize) -> Self {
        self.max_candidates = count.max(1);
        self
    }

    /// Walk all locations and build the ranked candidate set
    ///
    /// # Returns
    ///
    /// A [`CandidateSet`] in manifest order. Expected files without a single
    /// size match are absent.
    ///
    /// # Errors
    ///
    /// Unreadable directory entries are logged and skipped. An error is only
    /// returned if a found file cannot be expressed relative to its location.
    #[instrument(skip(self), fields(locations = self.locations.len(), files = self.expected.len()))]
    pub fn collect(self) -> Result<CandidateSet> {
        let matchers: Vec<PathMatcher> = self
            .expected
            .iter()
            .map(|file| PathMatcher::new(&file.relative_path.to_string_lossy()))
            .collect();
        let mut ranked: Vec<Vec<Candidate>> = vec![Vec::new(); self.expected.len()];
        let mut sizes = SizeMatcher::default();

        for (filepath, location) in each_file(self.locations) {
            for (index, file) in self.expected.iter().enumerate() {
                if !sizes.is_match(index, file, &filepath) {
                    continue;
                }
                let relative_path = make_relative(&filepath, &location)?;
                let similarity = matchers[index].ratio(&relative_path.to_string_lossy());
                ranked[index].push(Candidate::new(
                    location.clone(),
                    filepath.clone(),
                    relative_path,
                    similarity,
                ));
            }
        }

        let mut set = CandidateSet::new();
        for (file, mut candidates) in self.expected.iter().zip(ranked) {
            // Stable, so equal scores keep walk order
            candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

            if !candidates.is_empty() {
                debug!("Size matches for {}", file);
                for candidate in &candidates {
                    debug!(
                        " * {} [{:.2}]",
                        candidate.filepath.display(),
                        candidate.similarity
                    );
                }
            }

            candidates.truncate(self.max_candidates);
            set.insert(file.clone(), candidates);
        }

        debug!(
            "{} of {} files have candidates",
            set.len(),
            self.expected.len()
        );
        Ok(set)
    }
}

/// Memoized size lookups for one collection pass
#[derive(Debug, Default)]
struct SizeMatcher {
    /// Size of each path, `None` for directories and unreadable paths
    sizes: HashMap<PathBuf, Option<u64>>,
    /// Answers keyed by expected file index and path
    answers: HashMap<(usize, PathBuf), bool>,
}

impl SizeMatcher {
    fn is_match(&mut self, index: usize, file: &ExpectedFile, path: &Path) -> bool {
        let key = (index, path.to_path_buf());
        if let Some(&answer) = self.answers.get(&key) {
            return answer;
        }

        let size = *self
            .sizes
            .entry(path.to_path_buf())
            .or_insert_with(|| file_size(path));
        let answer = size == Some(file.size);
        self.answers.insert(key, answer);
        answer
    }
}

/// Size of a non-directory, following symbolic links
fn file_size(path: &Path) -> Option<u64> {
    match fs::metadata(path) {
        Ok(metadata) if !metadata.is_dir() => Some(metadata.len()),
        Ok(_) => None,
        Err(e) => {
            trace!("No size for {}: {}", path.display(), e);
            None
        }
    }
}

/// Every non-directory below each location, paired with that location
///
/// A location that is not a directory is yielded as its own location. A
/// location that does not exist yields nothing.
pub(crate) fn each_file(locations: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    let mut files = Vec::new();

    for location in locations {
        debug!("Searching {}", location.display());
        if !location.exists() {
            debug!("Location does not exist: {}", location.display());
            continue;
        }
        if !location.is_dir() {
            files.push((location.clone(), location.clone()));
            continue;
        }

        let walker = WalkDir::new(location)
            .follow_links(true)
            .sort_by_file_name();
        for entry in walker {
            match entry {
                Ok(entry) if !entry.file_type().is_dir() => {
                    files.push((entry.into_path(), location.clone()));
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry below {}: {}", location.display(), e),
            }
        }
    }

    files
}
