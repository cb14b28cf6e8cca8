//! Per-arm statistics helpers
//!
//! Running means, partial top-M selection over arm indices, and uniform
//! draws from candidate sets. Shared by every strategy.

use rand::Rng;
use std::cmp::Ordering;

/// Fold one more sample into a running arithmetic mean
///
/// # Arguments
/// * `mean` - Mean of the first `count` samples
/// * `count` - Number of samples already folded in
/// * `value` - New sample
pub fn running_mean(mean: f64, count: u64, value: f64) -> f64 {
    (count as f64 * mean + value) / (count as f64 + 1.0)
}

/// Indices of the `m` largest values
///
/// Ties (including infinite values) are broken by the lower index, so the
/// result is deterministic for a given input. Returns at most
/// `values.len()` indices, ordered from largest to smallest value.
pub fn top_m_indices(values: &[f64], m: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    let m = m.min(values.len());
    if m == 0 {
        return Vec::new();
    }

    let by_value_desc =
        |a: &usize, b: &usize| -> Ordering { values[*b].total_cmp(&values[*a]).then(a.cmp(b)) };

    if m < order.len() {
        order.select_nth_unstable_by(m - 1, by_value_desc);
        order.truncate(m);
    }
    order.sort_by(by_value_desc);
    order
}

/// Pick one element of `candidates` uniformly at random
pub fn choose_uniform<R: Rng + ?Sized>(rng: &mut R, candidates: &[usize]) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}
