//! Deterministic signals shared by the encoder core tests.

use super::SAMPLES_PER_BLOCK;

/// Two blocks of `0, 100, 200, ..., 2700`.
pub(crate) fn ramp_signal() -> Vec<i16> {
    (0..2 * SAMPLES_PER_BLOCK as i16).map(|i| i * 100).collect()
}

fn triangle(i: usize, period: usize, amplitude: i32) -> i32 {
    let phase = i % period;
    let v = if phase < period / 2 {
        phase as i32 * 4 * amplitude / period as i32
    } else {
        (period - phase) as i32 * 4 * amplitude / period as i32
    };
    v - amplitude
}

/// 200 blocks of three summed triangle waves at unrelated periods.
pub(crate) fn mixed_signal() -> Vec<i16> {
    (0..200 * SAMPLES_PER_BLOCK)
        .map(|i| (triangle(i, 50, 6000) + triangle(i, 7, 1500) + triangle(i, 333, 9000)) as i16)
        .collect()
}

#[rustfmt::skip]
const WAVE: [i16; SAMPLES_PER_BLOCK] = [
    0, 3000, 5000, 6000, 5000, 3000, 0,
    -3000, -5000, -6000, -5000, -3000, -1000, 500,
];

/// Ten blocks, seven of which repeat [`WAVE`].
pub(crate) fn majority_signal() -> Vec<i16> {
    let other: Vec<i16> = (0..SAMPLES_PER_BLOCK as i32)
        .map(|i| ((i * i * 37) % 2000 - 1000) as i16)
        .collect();

    let mut samples = Vec::new();
    for _ in 0..3 {
        samples.extend_from_slice(&WAVE);
    }
    samples.extend_from_slice(&other);
    for _ in 0..3 {
        samples.extend_from_slice(&WAVE);
    }
    samples.extend_from_slice(&other);
    samples.extend_from_slice(&other);
    samples.extend_from_slice(&WAVE);
    samples
}
