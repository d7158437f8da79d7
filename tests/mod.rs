//! Main test module for seedpath
//!
//! This module includes all test suites:
//! - Integration tests that search real torrents end to end
//! - Property-based tests for the combinator invariants
//! - Edge cases around unusual names and linked directories

#[path = "../src/testing.rs"]
mod testing;

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use crate::testing::{content, multi_file_torrent, place, single_file_torrent, PIECE_LENGTH};
    use ::seedpath::*;
    use std::fs;
    use tempfile::TempDir;

    const PIECE: usize = PIECE_LENGTH as usize;

    #[test]
    fn test_empty_location() {
        let root = TempDir::new().unwrap();
        let fixture = single_file_torrent(root.path(), "a.bin", content(PIECE * 3, 1));
        let location = root.path().join("empty");
        fs::create_dir_all(&location).unwrap();

        let report = LocationFinder::new(&fixture.torrent, [&location], None)
            .unwrap()
            .find_with_report()
            .unwrap();

        assert_eq!(report.location, location);
        assert_eq!(report.origin, LocationOrigin::FirstLocation);
        assert_eq!(report.assignments_tried, 0);
        assert_eq!(report.unmatched, vec![std::path::PathBuf::from("a.bin")]);
    }

    #[test]
    fn test_nonexistent_location_is_skipped() {
        let root = TempDir::new().unwrap();
        let data = content(PIECE * 3, 2);
        let fixture = single_file_torrent(root.path(), "a.bin", data);
        let missing = root.path().join("does/not/exist");
        let location = root.path().join("real");
        place(
            &fixture.content_root.join("a.bin"),
            &location.join("moved/a.bin"),
        );

        let found = LocationFinder::new(&fixture.torrent, [&missing, &location], None)
            .unwrap()
            .find()
            .unwrap();
        assert_eq!(found, location);
        assert!(location.join("a.bin").exists());
    }

    #[test]
    fn test_special_names() {
        let root = TempDir::new().unwrap();
        let name = "Sh0w (2020) [1080p] {x264} it's, fine";
        let fixture = multi_file_torrent(
            root.path(),
            name,
            &[
                ("Season 1/E01 @ home #1.mkv", content(PIECE * 3, 3)),
                ("Season 1/E02 $pecial.mkv", content(PIECE * 4, 4)),
            ],
        );

        let location = root.path().join("library");
        let original = fixture.content_root.join(name).join("Season 1");
        place(&original.join("E01 @ home #1.mkv"), &location.join("show/e01.mkv"));
        place(&original.join("E02 $pecial.mkv"), &location.join("show/e02.mkv"));

        let report = LocationFinder::builder()
            .location(&location)
            .staging_dir(root.path())
            .build(&fixture.torrent)
            .unwrap()
            .find_with_report()
            .unwrap();

        assert!(report.is_complete());
        assert!(location.join(name).join("Season 1/E02 $pecial.mkv").exists());
    }

    #[test]
    fn test_unicode_names() {
        let root = TempDir::new().unwrap();
        let name = "Ünïcödé Älbum";
        let fixture = multi_file_torrent(
            root.path(),
            name,
            &[("トラック 01.flac", content(PIECE * 3 + 5, 5))],
        );

        let location = root.path().join("music");
        place(
            &fixture.content_root.join(name).join("トラック 01.flac"),
            &location.join("album/track01.flac"),
        );

        let report = LocationFinder::builder()
            .location(&location)
            .staging_dir(root.path())
            .build(&fixture.torrent)
            .unwrap()
            .find_with_report()
            .unwrap();

        assert!(report.is_complete());
        assert!(location.join(name).join("トラック 01.flac").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_inside_location() {
        let root = TempDir::new().unwrap();
        let fixture = single_file_torrent(root.path(), "movie.mkv", content(PIECE * 4, 6));

        let elsewhere = root.path().join("elsewhere");
        place(
            &fixture.content_root.join("movie.mkv"),
            &elsewhere.join("movie.mkv"),
        );
        let location = root.path().join("location");
        fs::create_dir_all(&location).unwrap();
        std::os::unix::fs::symlink(&elsewhere, location.join("linked")).unwrap();

        let report = LocationFinder::new(&fixture.torrent, [&location], None)
            .unwrap()
            .find_with_report()
            .unwrap();

        assert_eq!(report.origin, LocationOrigin::Found);
        assert_eq!(report.confirmed[0].source, location.join("linked/movie.mkv"));
        assert_eq!(
            fs::read(location.join("movie.mkv")).unwrap(),
            fs::read(elsewhere.join("movie.mkv")).unwrap()
        );
    }
}
