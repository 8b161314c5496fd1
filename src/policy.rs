//! Victim selection for full rows.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    error::{SimError, SimResult},
    geometry::ReplacementKind,
};

pub trait ReplacementPolicy {
    /// Picks the way to evict from a full row, in `0..ways`.
    fn victim(&mut self, row: usize, ways: usize) -> usize;
}

impl ReplacementKind {
    /// Builds the policy for this kind. LRU has no implementation and is
    /// rejected here so that a run fails before touching the trace.
    pub fn build(self, num_rows: usize, seed: Option<u64>) -> SimResult<Box<dyn ReplacementPolicy>> {
        match self {
            ReplacementKind::RoundRobin => Ok(Box::new(RoundRobin::new(num_rows))),
            ReplacementKind::Random => Ok(Box::new(match seed {
                Some(seed) => RandomPolicy::seeded(seed),
                None => RandomPolicy::from_entropy(),
            })),
            ReplacementKind::LeastRecentlyUsed => Err(SimError::UnsupportedPolicy(self)),
        }
    }
}

/// One next-victim pointer per row.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    next: Vec<usize>,
}

impl RoundRobin {
    pub fn new(num_rows: usize) -> Self {
        Self {
            next: vec![0; num_rows],
        }
    }
}

impl ReplacementPolicy for RoundRobin {
    fn victim(&mut self, row: usize, ways: usize) -> usize {
        let pointer = &mut self.next[row];
        let victim = *pointer;
        *pointer = (victim + 1) % ways;
        victim
    }
}

pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn victim(&mut self, _row: usize, ways: usize) -> usize {
        self.rng.gen_range(0..ways)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_visits_every_way_before_repeating() {
        for ways in [1, 2, 4, 8, 16] {
            let mut policy = RoundRobin::new(1);
            let first: Vec<_> = (0..ways).map(|_| policy.victim(0, ways)).collect();
            assert_eq!(first, (0..ways).collect::<Vec<_>>());
            assert_eq!(policy.victim(0, ways), 0);
        }
    }

    #[test]
    fn round_robin_rows_advance_independently() {
        let mut policy = RoundRobin::new(4);
        assert_eq!(policy.victim(2, 4), 0);
        assert_eq!(policy.victim(2, 4), 1);
        assert_eq!(policy.victim(3, 4), 0);
        assert_eq!(policy.victim(2, 4), 2);
    }

    #[test]
    fn seeded_random_is_reproducible_and_in_range() {
        let mut a = RandomPolicy::seeded(42);
        let mut b = RandomPolicy::seeded(42);
        let draws_a: Vec<_> = (0..256).map(|_| a.victim(0, 8)).collect();
        let draws_b: Vec<_> = (0..256).map(|_| b.victim(0, 8)).collect();
        assert_eq!(draws_a, draws_b);
        assert!(draws_a.iter().all(|&way| way < 8));
        // 256 uniform draws over 8 ways hit more than one way.
        assert!(draws_a.iter().any(|&way| way != draws_a[0]));
    }

    #[test]
    fn lru_is_rejected_at_build() {
        let result = ReplacementKind::LeastRecentlyUsed.build(8, None);
        assert!(matches!(
            result,
            Err(SimError::UnsupportedPolicy(ReplacementKind::LeastRecentlyUsed))
        ));
        assert!(ReplacementKind::RoundRobin.build(8, None).is_ok());
        assert!(ReplacementKind::Random.build(8, Some(7)).is_ok());
    }
}
