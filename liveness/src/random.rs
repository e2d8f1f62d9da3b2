//! Motion prompt selection.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use veriface_types::Motion;

/// Chooses the prompt for each challenge attempt.
pub trait MotionPicker: Send {
    /// Pick one of `choices`; `None` only when `choices` is empty.
    fn pick(&mut self, choices: &[Motion]) -> Option<Motion>;
}

/// Uniform choice, independent per attempt (the previous prompt may repeat).
pub struct RandomMotionPicker {
    rng: StdRng,
}

impl RandomMotionPicker {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for tests and replay.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl MotionPicker for RandomMotionPicker {
    fn pick(&mut self, choices: &[Motion]) -> Option<Motion> {
        choices.choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomMotionPicker::seeded(7);
        let mut b = RandomMotionPicker::seeded(7);
        for _ in 0..32 {
            assert_eq!(a.pick(&Motion::ALL), b.pick(&Motion::ALL));
        }
    }

    #[test]
    fn picks_every_motion_eventually() {
        let mut picker = RandomMotionPicker::seeded(42);
        let picks: Vec<_> = (0..64).filter_map(|_| picker.pick(&Motion::ALL)).collect();
        assert!(picks.contains(&Motion::Left));
        assert!(picks.contains(&Motion::Right));
    }

    #[test]
    fn empty_choices_yield_none() {
        assert_eq!(RandomMotionPicker::seeded(1).pick(&[]), None);
    }
}
