//! Banded scoring of a two-haplotype answer against a truth pair
//!
//! Truth haplotypes may contain `-` (may be skipped for free) and `X`
//! (matches anything at no cost). Answers must be plain `ACGT`. In switch
//! mode a single crossover between the truth haplotypes is allowed, at the
//! same truth position for both answers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub const MATCH_SCORE: i64 = 1;
pub const PENALTY: i64 = -99;
pub const SWITCH_PENALTY: i64 = -750;
/// Added to the gap/wildcard count before doubling into a bandwidth
pub const BAND_MARGIN: usize = 300;

#[derive(Debug, Error)]
pub enum PairFormatError {
    #[error("file is empty")]
    Empty,
    #[error("expected two newline-terminated lines")]
    MissingLine,
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid format in '{}': {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: PairFormatError,
    },

    #[error("truth haplotypes differ in length ({first} vs {second})")]
    LengthMismatch { first: usize, second: usize },

    #[error("answer haplotype {haplotype} has invalid base '{base}' at position {position}")]
    InvalidBase {
        haplotype: usize,
        position: usize,
        base: char,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaplotypePair {
    pub first: Vec<u8>,
    pub second: Vec<u8>,
}

pub fn read_pair(path: &Path) -> Result<HaplotypePair, ScoreError> {
    let text = fs::read(path).map_err(|source| ScoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_pair(&text).map_err(|source| ScoreError::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// Two `\n`-terminated lines, carriage returns dropped anywhere
pub fn parse_pair(bytes: &[u8]) -> Result<HaplotypePair, PairFormatError> {
    if bytes.is_empty() {
        return Err(PairFormatError::Empty);
    }
    let cleaned: Vec<u8> = bytes.iter().copied().filter(|&b| b != b'\r').collect();
    let mut lines = cleaned.split_inclusive(|&b| b == b'\n');

    let mut next_line = || -> Result<Vec<u8>, PairFormatError> {
        match lines.next() {
            Some(line) if line.ends_with(b"\n") => Ok(line[..line.len() - 1].to_vec()),
            _ => Err(PairFormatError::MissingLine),
        }
    };
    let first = next_line()?;
    let second = next_line()?;
    Ok(HaplotypePair { first, second })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    /// `None` when the lengths are too far apart for the band
    pub raw_score: Option<i64>,
    pub final_score: i64,
    pub bandwidth: usize,
    pub allow_switch: bool,
}

impl ScoreReport {
    fn new(raw_score: Option<i64>, bandwidth: usize, allow_switch: bool) -> Self {
        let final_score = raw_score.map_or(0, |raw| raw.max(0) / 100);
        ScoreReport {
            raw_score,
            final_score,
            bandwidth,
            allow_switch,
        }
    }
}

/// Score `answer` against `truth`
pub fn score(
    truth: &HaplotypePair,
    answer: &HaplotypePair,
    allow_switch: bool,
) -> Result<ScoreReport, ScoreError> {
    if truth.first.len() != truth.second.len() {
        return Err(ScoreError::LengthMismatch {
            first: truth.first.len(),
            second: truth.second.len(),
        });
    }
    check_answer(1, &answer.first)?;
    check_answer(2, &answer.second)?;

    let gaps = count_gaps(&truth.first).max(count_gaps(&truth.second));
    let bandwidth = (gaps + BAND_MARGIN) * 2 + 1;
    log::debug!("scoring with bandwidth {} ({} gap/wildcard cells)", bandwidth, gaps);

    let (s1, s2) = (&truth.first[..], &truth.second[..]);
    let (t1, t2) = (&answer.first[..], &answer.second[..]);
    let raw = if allow_switch {
        switch_score(s1, s2, t1, t2, bandwidth)
    } else {
        direct_score(s1, s2, t1, t2, bandwidth)
    };
    Ok(ScoreReport::new(raw, bandwidth, allow_switch))
}

fn check_answer(haplotype: usize, seq: &[u8]) -> Result<(), ScoreError> {
    match seq.iter().position(|b| !matches!(b, b'A' | b'C' | b'G' | b'T')) {
        Some(position) => Err(ScoreError::InvalidBase {
            haplotype,
            position,
            base: seq[position] as char,
        }),
        None => Ok(()),
    }
}

fn count_gaps(seq: &[u8]) -> usize {
    seq.iter().filter(|&&b| b == b'-' || b == b'X').count()
}

/// Each answer aligned end to end to one truth haplotype, best of both pairings
fn direct_score(s1: &[u8], s2: &[u8], t1: &[u8], t2: &[u8], bandwidth: usize) -> Option<i64> {
    let global = |s: &[u8], t: &[u8]| BandedScores::fill(s, t, bandwidth).and_then(|m| m.last());
    let straight = global(s1, t1).zip(global(s2, t2)).map(|(a, b)| a + b);
    let crossed = global(s1, t2).zip(global(s2, t1)).map(|(a, b)| a + b);
    straight.max(crossed)
}

fn switch_score(s1: &[u8], s2: &[u8], t1: &[u8], t2: &[u8], bandwidth: usize) -> Option<i64> {
    let straight = best_joint(
        &switch_profile(s1, s2, t1, bandwidth)?,
        &switch_profile(s2, s1, t2, bandwidth)?,
    );
    let crossed = best_joint(
        &switch_profile(s1, s2, t2, bandwidth)?,
        &switch_profile(s2, s1, t1, bandwidth)?,
    );
    straight.max(crossed)
}

/// Best total over switch points where both answers have a score
fn best_joint(a: &[Option<i64>], b: &[Option<i64>]) -> Option<i64> {
    a.iter()
        .zip(b)
        .filter_map(|(x, y)| Some((*x)? + (*y)?))
        .max()
}

/// Entry `i` is the best score of `answer` against `head[..i]` followed by
/// `tail[i..]`. Entries `0` and `len` need no switch, the rest pay
/// [`SWITCH_PENALTY`].
fn switch_profile(
    head: &[u8],
    tail: &[u8],
    answer: &[u8],
    bandwidth: usize,
) -> Option<Vec<Option<i64>>> {
    let forward = BandedScores::fill(head, answer, bandwidth)?;
    let tail_rev: Vec<u8> = tail.iter().rev().copied().collect();
    let answer_rev: Vec<u8> = answer.iter().rev().copied().collect();
    let backward = BandedScores::fill(&tail_rev, &answer_rev, bandwidth)?;

    let slen = head.len() as isize;
    let tlen = answer.len() as isize;
    let half = (bandwidth / 2) as isize;
    // Best alignment of tail[i..] against answer[j..]
    let suffix = |i: isize, j: isize| backward.get(slen - 1 - i, tlen - 1 - j);

    let mut profile = Vec::with_capacity(head.len() + 1);
    profile.push(suffix(0, 0));
    for i in 1..slen {
        let centre = tlen - slen + i - 1;
        let lo = (i - 1 - half).max(centre - half).max(0);
        let hi = (i - 1 + half).min(centre + half).min(tlen - 2);
        let best = (lo..=hi)
            .filter_map(|j| Some(forward.get(i - 1, j)? + suffix(i, j + 1)? + SWITCH_PENALTY))
            .max();
        profile.push(best);
    }
    profile.push(forward.last());
    Some(profile)
}

/// Global alignment scores restricted to the diagonal band `|i - j| <= bandwidth / 2`,
/// `i` indexing the truth and `j` the answer.
struct BandedScores {
    half: usize,
    bandwidth: usize,
    slen: usize,
    tlen: usize,
    cells: Vec<i64>,
}

impl BandedScores {
    fn fill(s: &[u8], t: &[u8], bandwidth: usize) -> Option<Self> {
        let (slen, tlen) = (s.len(), t.len());
        let half = bandwidth / 2;
        if slen == 0 || tlen == 0 || slen.abs_diff(tlen) > half {
            return None;
        }

        let mut m = BandedScores {
            half,
            bandwidth,
            slen,
            tlen,
            cells: vec![i64::MIN / 4; tlen * bandwidth],
        };
        for j in 0..tlen {
            let start = j.saturating_sub(half);
            let end = (j + half).min(slen - 1);
            for i in start..=end {
                let (mut diag, mut left, mut up) = if i == 0 && j == 0 {
                    (0, PENALTY, PENALTY)
                } else if i == 0 {
                    (j as i64 * PENALTY, (j as i64 + 1) * PENALTY, m.at(i, j - 1))
                } else if j == 0 {
                    (i as i64 * PENALTY, m.at(i - 1, j), (i as i64 + 1) * PENALTY)
                } else {
                    (m.at(i - 1, j - 1), m.at(i - 1, j), m.at(i, j - 1))
                };
                diag += base_score(s[i], t[j]).max(gap_score(s[i], b'X'));
                left += gap_score(s[i], b'-').max(gap_score(s[i], b'X'));
                up += PENALTY;

                // Neighbours outside the band do not take part
                let best = if i != 0 && i == j + half {
                    diag.max(left)
                } else if i == start && i + half == j {
                    diag.max(up)
                } else {
                    diag.max(left).max(up)
                };
                let idx = m.index(i, j);
                m.cells[idx] = best;
            }
        }
        Some(m)
    }

    fn index(&self, i: usize, j: usize) -> usize {
        j * self.bandwidth + i + self.half - j
    }

    fn at(&self, i: usize, j: usize) -> i64 {
        self.cells[self.index(i, j)]
    }

    fn get(&self, i: isize, j: isize) -> Option<i64> {
        if i < 0 || j < 0 {
            return None;
        }
        let (i, j) = (i as usize, j as usize);
        if i >= self.slen || j >= self.tlen || i.abs_diff(j) > self.half {
            return None;
        }
        Some(self.at(i, j))
    }

    fn last(&self) -> Option<i64> {
        self.get(self.slen as isize - 1, self.tlen as isize - 1)
    }
}

fn base_score(a: u8, b: u8) -> i64 {
    if a == b {
        MATCH_SCORE
    } else {
        PENALTY
    }
}

fn gap_score(a: u8, b: u8) -> i64 {
    if a == b {
        0
    } else {
        PENALTY
    }
}
