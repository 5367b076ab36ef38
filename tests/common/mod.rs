#![allow(dead_code)]

use std::io::Write;

use cigarpad::ReadRecord;
use rand::rngs::StdRng;
use rand::Rng;
use tempfile::NamedTempFile;

const BASES: &[u8] = b"ACGT";

/// Write `contents` to a fresh temp file
pub fn temp_input(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.as_file_mut().sync_all().unwrap();
    file
}

pub fn random_bases(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| BASES[rng.gen_range(0..BASES.len())] as char).collect()
}

/// A read that stays inside a reference of `reference_len` bases
pub fn random_read(rng: &mut StdRng, reference_len: usize, allow_insertions: bool) -> ReadRecord {
    let offset = rng.gen_range(0..reference_len);
    let mut cursor = offset;
    let mut script = String::new();
    let runs = rng.gen_range(1..8);
    for _ in 0..runs {
        let remaining = reference_len - cursor;
        let kind = rng.gen_range(0..4);
        if kind == 2 && allow_insertions && remaining > 0 {
            let n = rng.gen_range(1..5);
            script.push_str(&format!("{}I{}", n, random_bases(rng, n)));
            continue;
        }
        if remaining == 0 {
            break;
        }
        let n = rng.gen_range(1..=remaining.min(4));
        match kind {
            1 => script.push_str(&format!("{}X{}", n, random_bases(rng, n))),
            3 => script.push_str(&format!("{}D", n)),
            _ => script.push_str(&format!("{}=", n)),
        }
        cursor += n;
    }
    let orientation = if rng.gen_bool(0.5) { "+" } else { "-" };
    ReadRecord::new(orientation, offset, script)
}
