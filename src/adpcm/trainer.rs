use super::*;
use indexmap::IndexMap;
use tracing::debug;

/// The window of one block: one sample before it, the block itself, and two
/// samples after it.
const WINDOW_SIZE: usize = SAMPLES_PER_BLOCK + 3;

/// Summary of a training scan.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TrainingReport {
    /// The number of blocks that voted.
    pub blocks: usize,
    /// The number of distinct coefficient pairs that received votes.
    pub distinct_pairs: usize,
}

/// Derives a table of `coefficient_count` coefficient pairs that best fit the
/// whole of `samples`.
///
/// The count is clamped to `1..=MAX_COEFFICIENT_PAIRS`. If fewer distinct
/// pairs were voted for than requested, the remaining slots hold the zero pair.
pub fn train(samples: &[i16], coefficient_count: usize) -> CoefficientTable {
    train_with_report(samples, coefficient_count).0
}

/// Like [`train`], but also returns a summary of the vote.
pub fn train_with_report(
    samples: &[i16],
    coefficient_count: usize,
) -> (CoefficientTable, TrainingReport) {
    train_blocks(samples, block_count(samples.len()), coefficient_count)
}

/// Trains on the first `blocks` blocks of `samples` only.
///
/// Samples after those blocks do not vote, but the last voting block still
/// reads them as its look-ahead. Encoding a sequence whose trailing partial
/// block is dropped trains this way on the full input.
pub fn train_blocks(
    samples: &[i16],
    blocks: usize,
    coefficient_count: usize,
) -> (CoefficientTable, TrainingReport) {
    let coefficient_count = coefficient_count.clamp(1, MAX_COEFFICIENT_PAIRS);
    let seed = History::extrapolate(samples);

    let mut votes = VoteTable::default();
    let blocks = blocks.min(block_count(samples.len()));
    for block in 0..blocks {
        let window = block_window(samples, block, seed);
        votes.vote(autocorrelate(&window));
    }

    let report = TrainingReport {
        blocks,
        distinct_pairs: votes.len(),
    };
    debug!(
        blocks = report.blocks,
        distinct_pairs = report.distinct_pairs,
        coefficient_count,
        "trained coefficient table"
    );

    (votes.select(coefficient_count), report)
}

/// Gathers the window for `block`, widened to 64 bits for correlation.
///
/// The sample before the first block is the seed's `hist1`. Samples past the
/// end of the sequence read as silence.
fn block_window(samples: &[i16], block: usize, seed: History) -> [i64; WINDOW_SIZE] {
    let start = block * SAMPLES_PER_BLOCK;
    let mut window = [0i64; WINDOW_SIZE];

    window[0] = match start.checked_sub(1) {
        Some(i) => samples[i] as i64,
        None => seed.hist1 as i64,
    };
    for (w, &s) in window[1..].iter_mut().zip(samples.iter().skip(start)) {
        *w = s as i64;
    }

    window
}

/// Mean of `s[i] * s[i + lag]` over the block, with integer division.
///
/// `window[0]` is lag -1 of the first block sample, so block sample `i` lives
/// at `window[i + 1]`.
fn correlate(window: &[i64; WINDOW_SIZE], lag: isize) -> i64 {
    let sum: i64 = (0..SAMPLES_PER_BLOCK)
        .map(|i| {
            let j = (i as isize + 1 + lag) as usize;
            window[i + 1] * window[j]
        })
        .sum();
    sum / SAMPLES_PER_BLOCK as i64
}

/// Solves the second-order normal equations for one block window.
///
/// A singular system (`denom == 0`, e.g. a silent block) yields the zero pair.
pub(crate) fn autocorrelate(window: &[i64; WINDOW_SIZE]) -> CoefficientPair {
    let fn1 = correlate(window, -1);
    let f0 = correlate(window, 0);
    let f1 = correlate(window, 1);
    let f2 = correlate(window, 2);

    let denom = f0 * f0 - fn1 * f1;
    if denom == 0 {
        return CoefficientPair::ZERO;
    }

    let a1 = (f0 * f1 - f1 * f2) / denom;
    let a2 = (f0 * f2 - fn1 * f1) / denom;

    // Coefficients are stored as 16-bit values.
    CoefficientPair::new(a1 as i16, a2 as i16)
}

/// A histogram of the coefficient pairs voted for by each block, in the order
/// they were first seen.
#[derive(Debug, Default)]
struct VoteTable {
    votes: IndexMap<CoefficientPair, u32>,
}

impl VoteTable {
    fn vote(&mut self, pair: CoefficientPair) {
        *self.votes.entry(pair).or_insert(0) += 1;
    }

    fn len(&self) -> usize {
        self.votes.len()
    }

    /// Takes the pair with the most votes and zeroes its count. Ties go to the
    /// pair seen first.
    fn take_best(&mut self) -> Option<CoefficientPair> {
        let mut best: Option<(&CoefficientPair, &mut u32)> = None;
        for (pair, votes) in self.votes.iter_mut() {
            if *votes > best.as_ref().map_or(0, |(_, v)| **v) {
                best = Some((pair, votes));
            }
        }

        best.map(|(pair, votes)| {
            *votes = 0;
            *pair
        })
    }

    fn select(mut self, count: usize) -> CoefficientTable {
        let pairs = (0..count)
            .map(|_| self.take_best().unwrap_or(CoefficientPair::ZERO))
            .collect();
        CoefficientTable::new(pairs)
    }
}
