//! Piece kinds and the random source that deals them.

use crate::board::Kind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Anything that can deal piece kinds for the initial fill and for respawns.
pub trait KindSource {
    /// Number of distinct kinds this source deals (`0..num_kinds`).
    fn num_kinds(&self) -> u8;

    /// Next kind, uniform over `0..num_kinds`.
    fn next_kind(&mut self) -> Kind;
}

/// Seeded RNG used for kinds, quake clears and camera jitter.
#[derive(Debug, Clone)]
pub struct RandomKinds {
    rng: StdRng,
    num_kinds: u8,
    seed: u64,
}

impl RandomKinds {
    /// `seed = None` draws a fresh seed from the thread RNG.
    pub fn new(num_kinds: u8, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        Self {
            rng: StdRng::seed_from_u64(seed),
            num_kinds: num_kinds.clamp(1, Kind::MAX_KINDS),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// True with probability `p` (clamped to 0..=1).
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform value in `-amplitude..=amplitude`.
    pub fn jitter(&mut self, amplitude: f32) -> f32 {
        let a = amplitude.abs();
        self.rng.random_range(-a..=a)
    }
}

impl KindSource for RandomKinds {
    fn num_kinds(&self) -> u8 {
        self.num_kinds
    }

    fn next_kind(&mut self) -> Kind {
        Kind(self.rng.random_range(0..self.num_kinds))
    }
}

/// Deals a fixed cycle of kinds. Test boards use it so contents are exact.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct SeqKinds {
    seq: Vec<u8>,
    pos: usize,
}

#[cfg(test)]
impl SeqKinds {
    pub fn new(seq: &[u8]) -> Self {
        Self {
            seq: seq.to_vec(),
            pos: 0,
        }
    }

    pub fn dealt(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
impl KindSource for SeqKinds {
    fn num_kinds(&self) -> u8 {
        self.seq.iter().copied().max().map_or(1, |m| m + 1)
    }

    fn next_kind(&mut self) -> Kind {
        let k = self.seq[self.pos % self.seq.len()];
        self.pos += 1;
        Kind(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_kinds_stay_in_range() {
        let mut kinds = RandomKinds::new(4, Some(7));
        for _ in 0..1000 {
            assert!(kinds.next_kind().0 < 4);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = RandomKinds::new(6, Some(42));
        let mut b = RandomKinds::new(6, Some(42));
        let xs: Vec<Kind> = (0..50).map(|_| a.next_kind()).collect();
        let ys: Vec<Kind> = (0..50).map(|_| b.next_kind()).collect();
        assert_eq!(xs, ys);
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn test_num_kinds_is_clamped() {
        assert_eq!(RandomKinds::new(0, Some(1)).num_kinds(), 1);
        assert_eq!(RandomKinds::new(200, Some(1)).num_kinds(), Kind::MAX_KINDS);
    }

    #[test]
    fn test_chance_extremes() {
        let mut kinds = RandomKinds::new(3, Some(9));
        assert!((0..100).all(|_| kinds.chance(1.0)));
        assert!((0..100).all(|_| !kinds.chance(0.0)));
        assert!((0..100).all(|_| !kinds.chance(-3.0)));
    }

    #[test]
    fn test_jitter_bounds() {
        let mut kinds = RandomKinds::new(3, Some(11));
        for _ in 0..200 {
            let j = kinds.jitter(0.05);
            assert!((-0.05..=0.05).contains(&j));
        }
        assert_eq!(kinds.jitter(0.0), 0.0);
    }
}
