//! End-to-end search scenarios
//!
//! Every test builds a real torrent from fixture content, scatters copies of
//! that content over a few locations and checks where the finder points and
//! what it links.

use crate::testing::{content, multi_file_torrent, place, single_file_torrent, Fixture, PIECE_LENGTH};
use ::seedpath::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PIECE: usize = PIECE_LENGTH as usize;

/// A multi-file torrent and the directory it was built from
pub struct Album {
    pub root: TempDir,
    pub fixture: Fixture,
}

impl Album {
    pub const NAME: &'static str = "Some Artist - Some Album (2019)";

    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let fixture = multi_file_torrent(
            root.path(),
            Self::NAME,
            &[
                ("01 - First.flac", content(PIECE * 3 + 11, 11)),
                ("02 - Second.flac", content(PIECE * 4 + 22, 22)),
                ("03 - Third.flac", content(PIECE * 5 + 33, 33)),
            ],
        );
        Self { root, fixture }
    }

    /// Original content of `file`
    pub fn original(&self, file: &str) -> PathBuf {
        self.fixture.content_root.join(Self::NAME).join(file)
    }

    /// A fresh directory below the test root
    pub fn location(&self, name: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn finder(&self, locations: &[&PathBuf]) -> LocationFinderBuilder {
        LocationFinder::builder()
            .locations(locations.iter().copied())
            .staging_dir(self.root.path())
    }

    /// Whether `location` holds the album in torrent layout with the
    /// original bytes
    pub fn assert_linked(&self, location: &Path, file: &str) {
        let linked = location.join(Self::NAME).join(file);
        assert_eq!(
            fs::read(&linked).unwrap(),
            fs::read(self.original(file)).unwrap(),
            "{}",
            linked.display()
        );
    }
}

#[test]
fn test_renamed_files_in_one_location() {
    let album = Album::new();
    let location = album.location("music");
    place(&album.original("01 - First.flac"), &location.join("Some Album/01.flac"));
    place(&album.original("02 - Second.flac"), &location.join("Some Album/02.flac"));
    place(&album.original("03 - Third.flac"), &location.join("Some Album/03.flac"));

    let report = album
        .finder(&[&location])
        .build(&album.fixture.torrent)
        .unwrap()
        .find_with_report()
        .unwrap();

    assert_eq!(report.location, location);
    assert_eq!(report.origin, LocationOrigin::Found);
    assert!(report.is_complete());
    assert_eq!(report.assignments_tried, 1);
    assert_eq!(report.links.len(), 3);
    for file in ["01 - First.flac", "02 - Second.flac", "03 - Third.flac"] {
        album.assert_linked(&location, file);
    }
}

#[test]
fn test_files_spread_over_locations() {
    let album = Album::new();
    let disk1 = album.location("disk1");
    let disk2 = album.location("disk2");
    place(&album.original("01 - First.flac"), &disk1.join("a/first.flac"));
    place(&album.original("02 - Second.flac"), &disk2.join("b/second.flac"));
    place(&album.original("03 - Third.flac"), &disk2.join("b/third.flac"));

    let report = album
        .finder(&[&disk1, &disk2])
        .build(&album.fixture.torrent)
        .unwrap()
        .find_with_report()
        .unwrap();

    assert!(report.location == disk1 || report.location == disk2);
    assert!(report.is_complete());
    for file in ["01 - First.flac", "02 - Second.flac", "03 - Third.flac"] {
        album.assert_linked(&report.location, file);
    }
}

#[test]
fn test_corrupt_candidate_is_skipped() {
    let root = TempDir::new().unwrap();
    let data = content(PIECE * 4, 7);
    let fixture = single_file_torrent(root.path(), "image.iso", data.clone());

    // Best-named candidate has a flipped byte in an interior piece
    let first = root.path().join("first");
    let mut corrupt = data;
    corrupt[PIECE + 10] ^= 0xff;
    fs::create_dir_all(&first).unwrap();
    fs::write(first.join("image.iso"), &corrupt).unwrap();

    let second = root.path().join("second");
    place(
        &fixture.content_root.join("image.iso"),
        &second.join("backup/disc.img"),
    );

    let report = LocationFinder::builder()
        .locations([&first, &second])
        .staging_dir(root.path())
        .build(&fixture.torrent)
        .unwrap()
        .find_with_report()
        .unwrap();

    assert_eq!(report.location, second);
    assert_eq!(report.assignments_tried, 2);
    assert_eq!(report.confirmed[0].source, second.join("backup/disc.img"));
    assert_eq!(report.links[0].kind, LinkKind::Hard);
    // The corrupt file is never touched
    assert_eq!(fs::read(first.join("image.iso")).unwrap(), corrupt);
}

#[test]
fn test_partial_album() {
    let album = Album::new();
    let location = album.location("music");
    place(&album.original("01 - First.flac"), &location.join("x/1.flac"));
    place(&album.original("03 - Third.flac"), &location.join("x/3.flac"));

    let report = album
        .finder(&[&location])
        .build(&album.fixture.torrent)
        .unwrap()
        .find_with_report()
        .unwrap();

    assert_eq!(report.location, location);
    assert!(!report.is_complete());
    assert_eq!(
        report.unmatched,
        vec![Path::new(Album::NAME).join("02 - Second.flac")]
    );
    album.assert_linked(&location, "01 - First.flac");
    album.assert_linked(&location, "03 - Third.flac");
    assert!(!location.join(Album::NAME).join("02 - Second.flac").exists());
}

#[test]
fn test_same_size_wrong_content_is_not_linked() {
    let album = Album::new();
    let location = album.location("music");
    let size = fs::metadata(album.original("02 - Second.flac")).unwrap().len() as usize;
    fs::write(location.join("impostor.flac"), content(size, 999)).unwrap();

    let report = album
        .finder(&[&location])
        .build(&album.fixture.torrent)
        .unwrap()
        .find_with_report()
        .unwrap();

    assert_eq!(report.origin, LocationOrigin::FirstLocation);
    assert!(report.confirmed.is_empty());
    assert!(report.links.is_empty());
    assert_eq!(report.assignments_tried, 1);
    assert!(!location.join(Album::NAME).exists());
}

#[test]
fn test_already_in_place() {
    let album = Album::new();
    let location = album.location("music");
    for file in ["01 - First.flac", "02 - Second.flac", "03 - Third.flac"] {
        place(&album.original(file), &location.join(Album::NAME).join(file));
    }

    let report = album
        .finder(&[&location])
        .build(&album.fixture.torrent)
        .unwrap()
        .find_with_report()
        .unwrap();

    assert_eq!(report.location, location);
    assert!(report.links.iter().all(|l| l.kind == LinkKind::Existing));
}

#[test]
fn test_fallbacks() {
    let album = Album::new();
    let first = album.location("first");
    let second = album.location("second");
    let default = album.root.path().join("default");

    let found = album
        .finder(&[&first, &second])
        .default_location(&default)
        .build(&album.fixture.torrent)
        .unwrap()
        .find()
        .unwrap();
    assert_eq!(found, default);

    let found = album
        .finder(&[&first, &second])
        .build(&album.fixture.torrent)
        .unwrap()
        .find()
        .unwrap();
    assert_eq!(found, first);
}

#[test]
fn test_unreadable_torrent() {
    let root = TempDir::new().unwrap();
    let torrent = root.path().join("not.torrent");
    fs::write(&torrent, b"this is not bencode").unwrap();

    let err = LocationFinder::new(&torrent, [root.path()], None)
        .unwrap()
        .find()
        .unwrap_err();
    assert!(matches!(err, SeedpathError::Manifest { ref path, .. } if *path == torrent));
}

#[test]
fn test_locations_file_end_to_end() {
    let album = Album::new();
    let library = album.location("library");
    for shelf in ["a", "b", "c"] {
        fs::create_dir_all(library.join(shelf)).unwrap();
    }
    place(&album.original("01 - First.flac"), &library.join("b/one.flac"));
    place(&album.original("02 - Second.flac"), &library.join("b/two.flac"));
    place(&album.original("03 - Third.flac"), &library.join("b/three.flac"));

    std::env::set_var("SEEDPATH_IT_LIBRARY", &library);
    let file = album.root.path().join("locations");
    fs::write(&file, "# shelves\n$SEEDPATH_IT_LIBRARY/*\n").unwrap();

    let locations = Locations::from_file(&file).unwrap();
    assert_eq!(
        locations.as_slice(),
        &[library.join("a"), library.join("b"), library.join("c")]
    );

    let report = album
        .finder(&[])
        .locations(locations.into_vec())
        .build(&album.fixture.torrent)
        .unwrap()
        .find_with_report()
        .unwrap();
    assert_eq!(report.location, library.join("b"));
    assert!(report.is_complete());
}
