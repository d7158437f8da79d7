//! Torrent manifest and piece verification
//!
//! [`Manifest`] is the part of a v1 `.torrent` the search needs: the ordered
//! file list, the piece size and the SHA-1 hash of every piece. It also
//! implements [`ContentVerifier`], which is how the match driver asks whether
//! a staged candidate really holds an expected file's content.
//!
//! ## Piece layout
//!
//! All files of a torrent form one byte stream in manifest order, cut into
//! pieces of `piece_length` bytes (the last one may be shorter). A piece at a
//! file boundary covers bytes of two or more files:
//!
//! ```text
//! stream:  |-- file A --|---- file B ----|- C -|
//! pieces:  |  0  |  1  |  2  |  3  |  4  |  5  |
//! ```
//!
//! Only pieces that lie entirely inside one file say something about that
//! file alone, so [`Manifest::pieces_to_verify`] skips the first and last
//! piece of every file that spans at least three pieces. Shorter files are
//! checked on every piece they touch, which means their neighbours must be
//! staged as well for the check to pass.
//!
//! ## Example
//!
//! ```rust,no_run
//! use seedpath::manifest::{ContentVerifier, Manifest};
//! use std::path::Path;
//!
//! # fn main() -> seedpath::Result<()> {
//! let manifest = Manifest::read("album.torrent")?;
//! for file in manifest.files() {
//!     let outcome = manifest.verify(Path::new("/downloads"), file)?;
//!     println!("{}: {:?}", file, outcome);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SeedpathError};
use crate::types::{ExpectedFile, Verification};
use crate::utils::{format_bytes, sanitize_name};
use lava_torrent::torrent::v1::Torrent;
use sha1::{Digest, Sha1};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};

/// Decides whether staged content matches an expected file
///
/// `staging_root` is the directory the candidates of the current assignment
/// are linked into, laid out like the torrent expects
/// (`staging_root/<relative path>`).
pub trait ContentVerifier {
    /// Check `file` below `staging_root`
    ///
    /// # Errors
    ///
    /// Implementations may fail on unexpected I/O problems. The match driver
    /// logs such failures and treats them as [`Verification::Inconclusive`].
    fn verify(&self, staging_root: &Path, file: &ExpectedFile) -> Result<Verification>;
}

impl<F> ContentVerifier for F
where
    F: Fn(&Path, &ExpectedFile) -> Result<Verification>,
{
    fn verify(&self, staging_root: &Path, file: &ExpectedFile) -> Result<Verification> {
        self(staging_root, file)
    }
}

/// Result of hashing one piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceStatus {
    /// The bytes hash to the expected value
    Valid,
    /// The bytes hash to something else
    Invalid,
    /// A file the piece touches is missing or has the wrong size
    Unverifiable,
}

/// A file's place in the torrent's byte stream
#[derive(Debug, Clone)]
struct Span {
    file: ExpectedFile,
    offset: u64,
}

impl Span {
    fn end(&self) -> u64 {
        self.offset + self.file.size
    }
}

/// File list and piece hashes of a v1 torrent
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    name: String,
    piece_length: u64,
    pieces: Vec<Vec<u8>>,
    /// Every file in stream order, duplicates included
    spans: Vec<Span>,
    /// Distinct files in manifest order
    files: Vec<ExpectedFile>,
}

impl Manifest {
    /// Read and parse the torrent at `path`
    ///
    /// # Errors
    ///
    /// [`SeedpathError::Manifest`] if the file cannot be read, is not a valid
    /// v1 torrent, or declares negative sizes.
    #[instrument]
    pub fn read(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let path = path.as_ref();
        let torrent =
            Torrent::read_from_file(path).map_err(|e| SeedpathError::manifest(path, e))?;
        Self::from_torrent(path, torrent)
    }

    fn from_torrent(path: &Path, torrent: Torrent) -> Result<Self> {
        let to_size = |value: i64, what: &str| {
            u64::try_from(value)
                .map_err(|_| SeedpathError::manifest(path, format!("negative {what}: {value}")))
        };

        let piece_length = to_size(torrent.piece_length, "piece length")?;
        if piece_length == 0 {
            return Err(SeedpathError::manifest(path, "piece length is zero"));
        }

        let mut spans = Vec::new();
        let mut offset = 0;
        match &torrent.files {
            Some(files) => {
                for file in files {
                    let size = to_size(file.length, "file length")?;
                    let relative_path = Path::new(&torrent.name).join(&file.path);
                    spans.push(Span {
                        file: ExpectedFile::new(relative_path, size),
                        offset,
                    });
                    offset += size;
                }
            }
            None => {
                let size = to_size(torrent.length, "length")?;
                spans.push(Span {
                    file: ExpectedFile::new(&torrent.name, size),
                    offset,
                });
            }
        }

        let mut files: Vec<ExpectedFile> = Vec::with_capacity(spans.len());
        for span in &spans {
            if !files.iter().any(|f| f.relative_path == span.file.relative_path) {
                files.push(span.file.clone());
            }
        }

        let manifest = Self {
            path: path.to_path_buf(),
            name: torrent.name,
            piece_length,
            pieces: torrent.pieces,
            spans,
            files,
        };
        debug!(
            "Torrent {:?}: {} file(s), {} in {} piece(s) of {}",
            manifest.name,
            manifest.files.len(),
            format_bytes(manifest.total_length()),
            manifest.piece_count(),
            format_bytes(piece_length)
        );
        Ok(manifest)
    }

    /// Path the manifest was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Torrent name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Torrent name with characters outside `[A-Za-z0-9 ',.-]` replaced by `_`
    pub fn sanitized_name(&self) -> String {
        sanitize_name(&self.name)
    }

    /// Expected files in manifest order
    pub fn files(&self) -> &[ExpectedFile] {
        &self.files
    }

    /// Piece size in bytes
    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    /// Number of pieces
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Size of all files together
    pub fn total_length(&self) -> u64 {
        self.spans.last().map_or(0, Span::end)
    }

    fn span_of(&self, file: &ExpectedFile) -> Result<&Span> {
        self.spans
            .iter()
            .find(|span| span.file.relative_path == file.relative_path)
            .ok_or_else(|| {
                SeedpathError::internal(format!("{} is not part of {:?}", file, self.name))
            })
    }

    /// Absolute piece indexes covered by `file`
    ///
    /// Empty for zero-length files.
    ///
    /// # Errors
    ///
    /// [`SeedpathError::Internal`] if `file` is not in this manifest.
    pub fn file_piece_range(&self, file: &ExpectedFile) -> Result<Range<u64>> {
        let span = self.span_of(file)?;
        Ok(piece_range(span.offset, span.file.size, self.piece_length))
    }

    /// Piece indexes that are checked to verify `file`
    ///
    /// Interior pieces only, unless the file spans fewer than three pieces, in
    /// which case all of them.
    pub fn pieces_to_verify(&self, file: &ExpectedFile) -> Result<Vec<u64>> {
        Ok(interior_or_all(self.file_piece_range(file)?).collect())
    }

    /// Hash piece `index` as found below `content_root`
    ///
    /// # Errors
    ///
    /// [`SeedpathError::Internal`] for an index past the last piece and
    /// [`SeedpathError::Io`] if an existing file cannot be read.
    pub fn verify_piece(&self, content_root: &Path, index: u64) -> Result<PieceStatus> {
        let expected_hash = usize::try_from(index)
            .ok()
            .and_then(|i| self.pieces.get(i))
            .ok_or_else(|| {
                SeedpathError::internal(format!(
                    "piece {} out of range ({} pieces)",
                    index,
                    self.pieces.len()
                ))
            })?;

        let start = index * self.piece_length;
        let end = (start + self.piece_length).min(self.total_length());
        let mut hasher = Sha1::new();
        let mut buffer = Vec::new();

        for span in &self.spans {
            if span.file.size == 0 || span.end() <= start || span.offset >= end {
                continue;
            }

            let path = content_root.join(&span.file.relative_path);
            match fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() && metadata.len() == span.file.size => {}
                Ok(metadata) => {
                    trace!(
                        "Piece {}: {} has {} bytes instead of {}",
                        index,
                        path.display(),
                        metadata.len(),
                        span.file.size
                    );
                    return Ok(PieceStatus::Unverifiable);
                }
                Err(e) => {
                    trace!("Piece {}: {} is unavailable: {}", index, path.display(), e);
                    return Ok(PieceStatus::Unverifiable);
                }
            }

            let from = start.max(span.offset);
            let to = end.min(span.end());
            // Bounded by piece_length
            buffer.resize((to - from) as usize, 0);

            let mut reader = File::open(&path)?;
            reader.seek(SeekFrom::Start(from - span.offset))?;
            reader.read_exact(&mut buffer)?;
            hasher.update(&buffer);
        }

        let actual = hasher.finalize();
        if actual.as_slice() == expected_hash.as_slice() {
            trace!("Piece {} is valid", index);
            Ok(PieceStatus::Valid)
        } else {
            trace!(
                "Piece {} is invalid: {} != {}",
                index,
                hex::encode(actual),
                hex::encode(expected_hash)
            );
            Ok(PieceStatus::Invalid)
        }
    }
}

impl ContentVerifier for Manifest {
    fn verify(&self, staging_root: &Path, file: &ExpectedFile) -> Result<Verification> {
        let pieces = self.pieces_to_verify(file)?;
        debug!("Verifying {} at {}: pieces {:?}", file, staging_root.display(), pieces);
        if pieces.is_empty() {
            return Ok(Verification::Inconclusive);
        }

        for index in pieces {
            match self.verify_piece(staging_root, index)? {
                PieceStatus::Valid => {}
                PieceStatus::Invalid => return Ok(Verification::Invalid),
                PieceStatus::Unverifiable => return Ok(Verification::Inconclusive),
            }
        }
        Ok(Verification::Valid)
    }
}

/// Pieces touched by `size` bytes starting at `offset`
fn piece_range(offset: u64, size: u64, piece_length: u64) -> Range<u64> {
    if size == 0 {
        return 0..0;
    }
    let first = offset / piece_length;
    let last = (offset + size - 1) / piece_length;
    first..last + 1
}

fn interior_or_all(range: Range<u64>) -> Range<u64> {
    if range.end - range.start >= 3 {
        range.start + 1..range.end - 1
    } else {
        range
    }
}
