//! Row orders used to permute a feature column.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::config::Method;

/// Identify the random stream of one (scope item, repetition) unit.
///
/// The scope item key occupies the high 32 bits and the repetition the low 32
/// bits, so every unit of a run draws from its own ChaCha stream.
pub(crate) fn stream_id(item_key: usize, repetition: usize) -> u64 {
    debug_assert!(repetition <= u32::MAX as usize);
    ((item_key as u64) << 32) | repetition as u64
}

/// A uniformly random permutation of `0..n_rows` drawn from stream `stream` of `seed`.
pub(crate) fn shuffled_order(n_rows: usize, seed: u64, stream: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    let mut order: Vec<usize> = (0..n_rows).collect();
    order.shuffle(&mut rng);
    order
}

/// Row `i` takes the value from row `(i + shift) % n_rows`.
///
/// For `shift` in `1..n_rows` these orders are derangements that together pair
/// every row with every other row exactly once.
pub(crate) fn cyclic_shift(n_rows: usize, shift: usize) -> Vec<usize> {
    (0..n_rows).map(|i| (i + shift) % n_rows).collect()
}

/// Number of permuted scorings per scope item.
pub(crate) fn draws_per_item(method: Method, n_repetitions: usize, n_rows: usize) -> usize {
    match method {
        Method::Shuffle => n_repetitions,
        Method::ExactPairs => n_rows - 1,
    }
}

/// The row order for draw `draw` of the scope item keyed `item_key`.
pub(crate) fn draw_order(method: Method, n_rows: usize, seed: u64, item_key: usize, draw: usize) -> Vec<usize> {
    match method {
        Method::Shuffle => shuffled_order(n_rows, seed, stream_id(item_key, draw)),
        Method::ExactPairs => cyclic_shift(n_rows, draw + 1),
    }
}
