use rand::{seq::SliceRandom, Rng};

use super::DraftError;

/// A single shuffle pass leaves streaks players notice, so the pool is
/// shuffled this many times.
pub const SHUFFLE_PASSES: usize = 4;

pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

pub fn over_shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for _ in 0..SHUFFLE_PASSES {
        shuffle(items, rng);
    }
}

/// Pick one item with probability proportional to its weight. Without
/// weights, or with a weight list of the wrong length, the pick is uniform.
/// Floating point leftovers resolve to the final item.
pub fn select_weighted<'a, T, R: Rng + ?Sized>(
    items: &'a [T],
    weights: Option<&[f64]>,
    rng: &mut R,
) -> Result<&'a T, DraftError> {
    if items.is_empty() {
        return Err(DraftError::EmptySelection);
    }

    let weights = match weights {
        Some(w) if w.len() == items.len() => w,
        _ => return Ok(&items[rng.gen_range(0..items.len())]),
    };

    let total: f64 = weights.iter().sum();
    let mut remainder = rng.gen::<f64>() * total;
    for (item, weight) in items.iter().zip(weights) {
        remainder -= weight;
        if remainder <= 0.0 {
            return Ok(item);
        }
    }

    Ok(&items[items.len() - 1])
}
