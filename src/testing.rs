//! Torrent fixtures shared by unit and integration tests
//!
//! Content is written to disk first and the torrent is built from it with
//! lava_torrent, so piece hashes always match the fixture bytes.
#![allow(dead_code)]

use lava_torrent::torrent::v1::TorrentBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// Piece size used by all fixtures
pub const PIECE_LENGTH: i64 = 16 * 1024;

/// A torrent and the original content it was built from
#[derive(Debug, Clone)]
pub struct Fixture {
    /// The `.torrent` file
    pub torrent: PathBuf,
    /// Directory that holds the content as the torrent expects it
    /// (`content_root/<name>/...` or `content_root/<name>`)
    pub content_root: PathBuf,
}

/// Pseudo-random bytes, different for every seed
pub fn content(size: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// Build a multi-file torrent named `name` below `root`
///
/// The content lands in `root/original/<name>/<path>` and the torrent in
/// `root/<name>.torrent`.
pub fn multi_file_torrent(root: &Path, name: &str, files: &[(&str, Vec<u8>)]) -> Fixture {
    let content_root = root.join("original");
    let dir = content_root.join(name);
    for (path, data) in files {
        let path = dir.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, data).unwrap();
    }
    write_torrent(root, name, &dir, content_root)
}

/// Build a single-file torrent named `name` below `root`
pub fn single_file_torrent(root: &Path, name: &str, data: Vec<u8>) -> Fixture {
    let content_root = root.join("original");
    fs::create_dir_all(&content_root).unwrap();
    let path = content_root.join(name);
    fs::write(&path, data).unwrap();
    write_torrent(root, name, &path, content_root)
}

fn write_torrent(root: &Path, name: &str, source: &Path, content_root: PathBuf) -> Fixture {
    let torrent = root.join(format!("{name}.torrent"));
    TorrentBuilder::new(source, PIECE_LENGTH)
        .set_announce(Some("http://tracker.example/announce".to_string()))
        .build()
        .unwrap()
        .write_into_file(&torrent)
        .unwrap();
    Fixture {
        torrent,
        content_root,
    }
}

/// Copy `from` to `to`, creating parent directories
pub fn place(from: &Path, to: &Path) {
    fs::create_dir_all(to.parent().unwrap()).unwrap();
    fs::copy(from, to).unwrap();
}
