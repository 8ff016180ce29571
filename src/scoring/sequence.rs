//! Ratcliff/Obershelp matching-block ratio over characters.
//!
//! Finds the longest common block, recurses on both sides of it, and scores
//! `2 * matched / (len_a + len_b)`. No junk heuristic is applied; question
//! fingerprints are short enough that every character counts.

use std::collections::HashMap;

/// Similarity ratio in `[0, 1]`. Two empty inputs are identical (`1.0`).
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_characters(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Total size of all matching blocks between `a` and `b`.
pub(crate) fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, ch) in b.iter().enumerate() {
        positions.entry(*ch).or_default().push(j);
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let block = longest_block(a, &positions, alo, ahi, blo, bhi);
        if block.size == 0 {
            continue;
        }
        matched += block.size;

        if alo < block.a && blo < block.b {
            pending.push((alo, block.a, blo, block.b));
        }
        let (a_end, b_end) = (block.a + block.size, block.b + block.size);
        if a_end < ahi && b_end < bhi {
            pending.push((a_end, ahi, b_end, bhi));
        }
    }

    matched
}

#[derive(Debug, Clone, Copy)]
struct Block {
    a: usize,
    b: usize,
    size: usize,
}

/// Longest block in `a[alo..ahi]` x `b[blo..bhi]`; ties go to the earliest
/// start in `a`, then in `b`.
fn longest_block(
    a: &[char],
    positions: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> Block {
    let mut best = Block {
        a: alo,
        b: blo,
        size: 0,
    };
    // run length of the match ending at (i - 1, j), keyed by j
    let mut runs: HashMap<usize, usize> = HashMap::new();

    for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_runs = HashMap::new();
        if let Some(js) = positions.get(ch) {
            for &j in js {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let run = j
                    .checked_sub(1)
                    .and_then(|prev| runs.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_runs.insert(j, run);
                if run > best.size {
                    best = Block {
                        a: i + 1 - run,
                        b: j + 1 - run,
                        size: run,
                    };
                }
            }
        }
        runs = next_runs;
    }

    best
}
