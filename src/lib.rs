//! # Seedpath - Find where a torrent's files already are
//!
//! Given a `.torrent` file and a list of directories that might hold its
//! content, seedpath works out which directory the BitTorrent client should
//! be pointed at and hard links every file it can prove correct into the
//! expected layout. Nothing is copied and nothing is moved.
//!
//! ## Overview
//!
//! Downloads get renamed, reorganized and spread over several disks. When a
//! torrent has to be seeded again (cross-seeding, a reinstalled client, a
//! migrated library), its files usually still exist, just not where the
//! torrent says they are. Seedpath:
//!
//! - Finds files of the right size below the configured locations
//! - Ranks them by how similar their path is to the expected one
//! - Proves candidates with the piece hashes from the torrent
//! - Keeps proven files fixed while it tries the remaining candidates
//! - Links the proven files below the location of the first one found
//!
//! ## Architecture
//!
//! - **Candidate collection** ([`candidates`]): a size match is a candidate,
//!   ranked with a path [`similarity`] score.
//! - **Combinator** ([`combinator`]): a Cartesian product over the ranked
//!   candidates in which individual keys can be locked mid-iteration.
//! - **Staging** ([`staging`]): each assignment is laid out with symbolic
//!   links in a temporary directory that mirrors the torrent.
//! - **Verification** ([`manifest`]): pieces that lie entirely within a file
//!   are hashed with SHA-1 and compared against the torrent.
//! - **Materialization** ([`link`]): hard links, falling back to symbolic
//!   links across filesystems. Existing paths are never overwritten.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seedpath::LocationFinder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let finder = LocationFinder::builder()
//!     .location("/srv/downloads")
//!     .location("/mnt/archive")
//!     .default_location("/srv/downloads")
//!     .build("Some.Album.2019.torrent")?;
//!
//! let report = finder.find_with_report()?;
//! println!("Download location: {}", report.location.display());
//! if !report.is_complete() {
//!     println!("Not found: {:?}", report.unmatched);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Locations File
//!
//! ```rust,no_run
//! use seedpath::{Locations, LocationFinder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut locations = Locations::from_default_file()?;
//! locations.prepend(["~/Downloads"])?;
//!
//! let location = LocationFinder::new("x.torrent", locations.into_vec(), None)?.find()?;
//! println!("{}", location.display());
//! # Ok(())
//! # }
//! ```
//!
//! ### Custom Verification
//!
//! Anything implementing [`ContentVerifier`], including closures, can stand
//! in for the torrent's piece hashes:
//!
//! ```rust,no_run
//! use seedpath::types::{ExpectedFile, Verification};
//! use seedpath::{LocationFinder, Result};
//! use std::path::Path;
//!
//! # fn main() -> Result<()> {
//! let files = vec![ExpectedFile::new("Album/01.flac", 31_337)];
//! let finder = LocationFinder::builder().location("/music").build("unused")?;
//!
//! let verify = |root: &Path, file: &ExpectedFile| -> Result<Verification> {
//!     Ok(if root.join(&file.relative_path).exists() {
//!         Verification::Valid
//!     } else {
//!         Verification::Inconclusive
//!     })
//! };
//! let report = finder.search(&files, "Album", &verify)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety
//!
//! - Existing files, directories and links at a target path are left alone
//! - Staging directories only ever contain symbolic links and are removed
//!   after every assignment
//! - Source files are only read, never modified
//!
//! ## Error Handling
//!
//! All operations return `Result<T, SeedpathError>`. Content that fails
//! verification is not an error; it is reported through
//! [`FindReport::unmatched`](types::FindReport::unmatched).
//!
//! ## Module Organization
//!
//! - [`location`]: The search driver and its builder
//! - [`combinator`]: Lockable Cartesian product
//! - [`candidates`]: Size matching and ranking
//! - [`similarity`]: Path similarity ratio
//! - [`manifest`]: Torrent reading and piece verification
//! - [`staging`]: Temporary assignment layouts
//! - [`link`]: Final link creation
//! - [`config`]: Locations file parsing
//! - [`types`]: Common types and data structures
//! - [`error`]: Error types and handling

// Public API modules
pub mod candidates;
pub mod combinator;
pub mod config;
pub mod error;
pub mod link;
pub mod location;
pub mod manifest;
pub mod similarity;
pub mod staging;
pub mod types;
pub mod utils;

// Internal modules (not part of public API)
mod collections;

// Re-export main types for convenience
pub use candidates::CandidateCollector;
pub use combinator::Combinator;
pub use config::Locations;
pub use error::{Result, SeedpathError};
pub use link::LinkMaterializer;
pub use location::{LocationFinder, LocationFinderBuilder, ProgressCallback};
pub use manifest::{ContentVerifier, Manifest};
pub use types::*;

#[cfg(test)]
pub(crate) mod testing;
