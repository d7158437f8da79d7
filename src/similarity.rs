//! Path similarity scoring
//!
//! Candidates for an expected file are ranked by how closely their path
//! (relative to the location they were found in) resembles the path the
//! torrent expects. The score is the classic "gestalt pattern matching" ratio:
//! find the longest common block, recurse on both sides of it, and report
//! `2 * matched / (len(a) + len(b))`.
//!
//! Separator-like characters (`.`, space, `-`, `/`) are junk in the expected
//! path: the longest-block search skips them, and a block found on the other
//! characters is only grown across them afterwards. This keeps `Show.S01E01`
//! and `Show S01E01` close while a shared `.` between two unrelated names
//! counts for nothing.
//!
//! ```rust
//! use seedpath::similarity::path_similarity;
//! use std::path::Path;
//!
//! let score = path_similarity(Path::new("foo bar.mkv"), Path::new("foo.bar.mkv"));
//! assert!((score - 0.909).abs() < 0.001);
//! ```

use crate::collections::HashMap;
use std::path::Path;

/// Characters that may not start a match
const JUNK: &[char] = &['.', ' ', '-', '/'];

fn is_junk(c: char) -> bool {
    JUNK.contains(&c)
}

/// A matching block: `a[a_start..a_start+size] == b[b_start..b_start+size]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a_start: usize,
    b_start: usize,
    size: usize,
}

/// Precomputed index of an expected path, scored against many candidates
///
/// Building the index once per expected file avoids rebuilding the character
/// positions for every candidate the collector looks at.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    expected: Vec<char>,
    /// Positions of every non-junk character in `expected`
    positions: HashMap<char, Vec<usize>>,
}

impl PathMatcher {
    /// Index `expected` for scoring
    pub fn new(expected: &str) -> Self {
        let expected: Vec<char> = expected.chars().collect();
        let mut positions: HashMap<char, Vec<usize>> = HashMap::default();
        for (j, &c) in expected.iter().enumerate() {
            if !is_junk(c) {
                positions.entry(c).or_default().push(j);
            }
        }
        Self {
            expected,
            positions,
        }
    }

    /// Similarity of `candidate` to the indexed path, in `0.0..=1.0`
    ///
    /// Two empty strings are identical and score `1.0`.
    pub fn ratio(&self, candidate: &str) -> f64 {
        let candidate: Vec<char> = candidate.chars().collect();
        let total = candidate.len() + self.expected.len();
        if total == 0 {
            return 1.0;
        }

        let matched: usize = self
            .matching_blocks(&candidate)
            .iter()
            .map(|block| block.size)
            .sum();
        2.0 * matched as f64 / total as f64
    }

    fn matching_blocks(&self, a: &[char]) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut queue = vec![(0, a.len(), 0, self.expected.len())];

        while let Some((a_lo, a_hi, b_lo, b_hi)) = queue.pop() {
            let block = self.longest_match(a, a_lo, a_hi, b_lo, b_hi);
            if block.size == 0 {
                continue;
            }
            if a_lo < block.a_start && b_lo < block.b_start {
                queue.push((a_lo, block.a_start, b_lo, block.b_start));
            }
            let a_end = block.a_start + block.size;
            let b_end = block.b_start + block.size;
            if a_end < a_hi && b_end < b_hi {
                queue.push((a_end, a_hi, b_end, b_hi));
            }
            blocks.push(block);
        }

        blocks.sort_by_key(|block| (block.a_start, block.b_start));

        // Adjacent blocks are reported as one
        let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(last) = merged.last_mut() {
                if last.a_start + last.size == block.a_start
                    && last.b_start + last.size == block.b_start
                {
                    last.size += block.size;
                    continue;
                }
            }
            merged.push(block);
        }
        merged
    }

    /// Longest block of `a[a_lo..a_hi]` and `expected[b_lo..b_hi]`
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in the
    /// expected path.
    fn longest_match(&self, a: &[char], a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> Block {
        let b = &self.expected;
        let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);

        // Length of the match ending at (i - 1, j), keyed by j
        let mut run_lengths: HashMap<usize, usize> = HashMap::default();
        for (i, c) in a.iter().enumerate().take(a_hi).skip(a_lo) {
            let mut next_run_lengths: HashMap<usize, usize> = HashMap::default();
            if let Some(positions) = self.positions.get(c) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_lengths.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run_lengths.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            run_lengths = next_run_lengths;
        }

        // Grow the block over neighbouring equal characters, non-junk first,
        // then junk
        for junk in [false, true] {
            while best_i > a_lo
                && best_j > b_lo
                && is_junk(b[best_j - 1]) == junk
                && a[best_i - 1] == b[best_j - 1]
            {
                best_i -= 1;
                best_j -= 1;
                best_size += 1;
            }
            while best_i + best_size < a_hi
                && best_j + best_size < b_hi
                && is_junk(b[best_j + best_size]) == junk
                && a[best_i + best_size] == b[best_j + best_size]
            {
                best_size += 1;
            }
        }

        Block {
            a_start: best_i,
            b_start: best_j,
            size: best_size,
        }
    }
}

/// Similarity of `candidate` to `expected`, in `0.0..=1.0`
///
/// Paths are compared as strings. Non-UTF-8 components are replaced lossily.
pub fn path_similarity(candidate: &Path, expected: &Path) -> f64 {
    PathMatcher::new(&expected.to_string_lossy()).ratio(&candidate.to_string_lossy())
}
