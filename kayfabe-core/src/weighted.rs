//! Weighted-random selection over `(item, weight)` pairs.
//!
//! One draw in `[0, Σweight)` walks the list subtracting each weight until
//! the remainder goes negative; the entry at that point wins. The walk is
//! kept exactly in this form (no precomputed cumulative table) so a seeded
//! RNG reproduces identical picks across runs and platforms.

use rand::Rng;

/// Pick one entry from a weighted list.
///
/// Returns `None` if the list is empty or all weights are zero. A
/// zero-weight entry is never selected.
#[must_use]
pub fn weighted_pick<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    entries: &'a [(T, u32)],
) -> Option<&'a T> {
    let total: u32 = entries.iter().map(|(_, weight)| *weight).sum();
    if total == 0 {
        return None;
    }
    pick_at(entries, rng.gen_range(0..total))
}

/// Resolve a concrete draw value against the weight list.
fn pick_at<T>(entries: &[(T, u32)], draw: u32) -> Option<&T> {
    let mut remaining = i64::from(draw);
    for (item, weight) in entries {
        remaining -= i64::from(*weight);
        if remaining < 0 {
            return Some(item);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_draw_value_maps_to_exact_weight_share() {
        let entries = [("a", 30), ("b", 15), ("c", 55)];
        let total: u32 = entries.iter().map(|(_, w)| w).sum();

        let mut counts = std::collections::HashMap::new();
        for draw in 0..total {
            let picked = pick_at(&entries, draw).expect("in-range draw selects");
            *counts.entry(*picked).or_insert(0u32) += 1;
        }

        assert_eq!(counts["a"], 30);
        assert_eq!(counts["b"], 15);
        assert_eq!(counts["c"], 55);
    }

    #[test]
    fn zero_weight_entries_are_never_selected() {
        let entries = [("never", 0), ("always", 10)];
        for draw in 0..10 {
            assert_eq!(pick_at(&entries, draw), Some(&"always"));
        }
    }

    #[test]
    fn empty_or_all_zero_lists_yield_none() {
        let mut rng = StdRng::seed_from_u64(7);
        let empty: [(&str, u32); 0] = [];
        assert_eq!(weighted_pick(&mut rng, &empty), None);
        let zeros = [("a", 0), ("b", 0)];
        assert_eq!(weighted_pick(&mut rng, &zeros), None);
    }

    #[test]
    fn single_entry_always_wins() {
        let mut rng = StdRng::seed_from_u64(1);
        let entries = [("only", 5)];
        for _ in 0..20 {
            assert_eq!(weighted_pick(&mut rng, &entries), Some(&"only"));
        }
    }

    #[test]
    fn seeded_rng_reproduces_the_same_sequence() {
        let entries = [("x", 35), ("y", 15), ("z", 50)];
        let picks = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| *weighted_pick(&mut rng, &entries).expect("non-empty"))
                .collect::<Vec<_>>()
        };
        assert_eq!(picks(42), picks(42));
    }
}
