//! Core data types used throughout the seedpath library
//!
//! ## Overview
//!
//! The types in this module represent:
//! - **Manifest side**: [`ExpectedFile`] - a file the torrent says must exist
//! - **Filesystem side**: [`Candidate`], [`CandidateSet`] - existing files
//!   that might be one of the expected files
//! - **Decisions**: [`Verification`], [`ConfirmedFile`], [`FindReport`] -
//!   what the search concluded
//! - **Progress**: [`SearchProgress`] - handed to progress callbacks
//!
//! ## Examples
//!
//! ```rust
//! use seedpath::types::ExpectedFile;
//! use std::path::PathBuf;
//!
//! let file = ExpectedFile::new("Album/01 - Intro.flac", 1024);
//! assert_eq!(file.relative_path, PathBuf::from("Album/01 - Intro.flac"));
//! assert_eq!(file.to_string(), "Album/01 - Intro.flac");
//! ```

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A file declared by the torrent manifest
///
/// The relative path includes the torrent name for multi-file torrents
/// (`name/dir/file`) and is the torrent name itself for single-file torrents.
/// Ordering and equality follow the relative path first, which is also the
/// file's identity within a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExpectedFile {
    /// Path relative to the download location
    pub relative_path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

impl ExpectedFile {
    /// Create a new expected file
    pub fn new(relative_path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            relative_path: relative_path.into(),
            size,
        }
    }
}

impl fmt::Display for ExpectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path.display())
    }
}

/// An existing file whose size matches some expected file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Configured location the file was found under
    pub location: PathBuf,
    /// Full path of the existing file
    pub filepath: PathBuf,
    /// `filepath` without the `location` prefix (empty if the location is the file)
    pub relative_path: PathBuf,
    /// Closeness of `relative_path` to the expected path, from 0.0 to 1.0
    pub similarity: f64,
    /// Staging directory this candidate is currently linked into
    #[serde(skip)]
    pub staged_at: Option<PathBuf>,
}

impl Candidate {
    /// Create a candidate that has not been staged yet
    pub fn new(
        location: impl Into<PathBuf>,
        filepath: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
        similarity: f64,
    ) -> Self {
        Self {
            location: location.into(),
            filepath: filepath.into(),
            relative_path: relative_path.into(),
            similarity,
            staged_at: None,
        }
    }
}

/// Ranked candidates for each expected file
///
/// Keys keep manifest order. Expected files without a single size match are
/// not present at all.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: Vec<(ExpectedFile, Vec<Candidate>)>,
}

impl CandidateSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the ranked candidates of one expected file
    ///
    /// Empty candidate lists are dropped.
    pub fn insert(&mut self, file: ExpectedFile, candidates: Vec<Candidate>) {
        if candidates.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|(f, _)| *f == file) {
            Some((_, existing)) => *existing = candidates,
            None => self.entries.push((file, candidates)),
        }
    }

    /// Candidates for `file`, best first
    pub fn get(&self, file: &ExpectedFile) -> Option<&[Candidate]> {
        self.entries
            .iter()
            .find(|(f, _)| f == file)
            .map(|(_, c)| c.as_slice())
    }

    /// Iterate over entries in manifest order
    pub fn iter(&self) -> impl Iterator<Item = (&ExpectedFile, &[Candidate])> {
        self.entries.iter().map(|(f, c)| (f, c.as_slice()))
    }

    /// Number of expected files with at least one candidate
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no expected file has a candidate
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for CandidateSet {
    type Item = (ExpectedFile, Vec<Candidate>);
    type IntoIter = std::vec::IntoIter<(ExpectedFile, Vec<Candidate>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Outcome of checking one file's content against the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verification {
    /// Every checked piece matches its hash
    Valid,
    /// A checked piece does not match its hash
    Invalid,
    /// A piece could not be checked (missing or truncated content)
    Inconclusive,
}

/// An expected file whose candidate passed verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmedFile {
    /// Expected relative path
    pub relative_path: PathBuf,
    /// Existing file that holds the content
    pub source: PathBuf,
    /// Where the final link goes (`resolved location / relative path`)
    pub target: PathBuf,
}

/// How a final link was materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Hard link on the same filesystem
    Hard,
    /// Symbolic link, used across filesystem boundaries
    Symbolic,
    /// The target already existed and was left alone
    Existing,
}

/// A link that was created (or found in place)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    /// Existing file
    pub source: PathBuf,
    /// Link path
    pub target: PathBuf,
    /// How the link was made
    pub kind: LinkKind,
}

/// Where the returned download location came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationOrigin {
    /// Location of the first verified file
    Found,
    /// Configured default location
    Default,
    /// First configured location, used when nothing else applies
    FirstLocation,
}

/// Full result of a search
#[derive(Debug, Clone, Serialize)]
pub struct FindReport {
    /// Download location to hand to the BitTorrent client
    pub location: PathBuf,
    /// How `location` was chosen
    pub origin: LocationOrigin,
    /// Files whose content was verified, in manifest order
    pub confirmed: Vec<ConfirmedFile>,
    /// Expected files that were not confirmed
    pub unmatched: Vec<PathBuf>,
    /// Final links
    pub links: Vec<LinkRecord>,
    /// Number of assignments the search went through
    pub assignments_tried: usize,
}

impl FindReport {
    /// Whether every expected file was confirmed
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Search progress, reported after each assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchProgress {
    /// 1-based number of the assignment just processed
    pub assignment: usize,
    /// Files confirmed so far
    pub confirmed: usize,
    /// Files in the manifest
    pub total: usize,
}
