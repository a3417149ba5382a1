use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tie-break port used when several teams are equally good candidates
///
/// Implementations must return an index in `0..candidates` and be safe to
/// share between concurrently running use cases.
pub trait TeamSelector: Send + Sync {
    fn pick(&self, candidates: usize) -> usize;
}

/// Uniform random selection backed by a seedable `StdRng`
pub struct RandomTeamSelector {
    rng: Mutex<StdRng>,
}

impl RandomTeamSelector {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible selector, for replays and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomTeamSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl TeamSelector for RandomTeamSelector {
    fn pick(&self, candidates: usize) -> usize {
        if candidates <= 1 {
            return 0;
        }
        // a poisoned lock still holds a usable rng
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..candidates)
    }
}
