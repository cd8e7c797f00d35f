//! Randomness used when one source lane is split across two output lanes.
//!
//! The remapper never touches a global generator. Callers hand in an [`Rng`]:
//! [`RandRng`] for real conversions and [`RngMock`] for reproducible tests.

use core::ops::RangeInclusive;

/// A source of random integers.
///
/// The returned value must lie inside `range`.
pub trait Rng {
    fn generate(&mut self, range: RangeInclusive<u64>) -> u64;
}

impl<T: Rng + ?Sized> Rng for Box<T> {
    fn generate(&mut self, range: RangeInclusive<u64>) -> u64 {
        T::generate(self, range)
    }
}

impl<T: Rng + ?Sized> Rng for &mut T {
    fn generate(&mut self, range: RangeInclusive<u64>) -> u64 {
        T::generate(self, range)
    }
}

/// Returns the predefined values in rotation, ignoring the requested range.
///
/// ```rust
/// use osu_converter::rng::{Rng, RngMock};
///
/// let mut rng = RngMock([0u64, 1u64]);
/// assert_eq!(rng.generate(0..=1), 0);
/// assert_eq!(rng.generate(0..=1), 1);
/// assert_eq!(rng.generate(0..=1), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RngMock<const N: usize>(pub [u64; N]);

impl<const N: usize> Rng for RngMock<N> {
    fn generate(&mut self, _range: RangeInclusive<u64>) -> u64 {
        let Some(first) = self.0.first().copied() else {
            return 0;
        };
        self.0.rotate_left(1);
        first
    }
}

/// Wraps any [`rand::RngCore`].
///
/// ```rust
/// use osu_converter::rng::{RandRng, Rng};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = RandRng(StdRng::seed_from_u64(42));
/// let n = rng.generate(0..=1);
/// assert!(n <= 1);
/// ```
pub struct RandRng<R>(pub R);

impl<R: rand::RngCore> Rng for RandRng<R> {
    fn generate(&mut self, range: RangeInclusive<u64>) -> u64 {
        rand::Rng::random_range(&mut self.0, range)
    }
}

/// `StdRng` seeded from `seed`, or from the OS when `seed` is `None`.
pub fn std_rng(seed: Option<u64>) -> RandRng<rand::rngs::StdRng> {
    use rand::SeedableRng;

    match seed {
        Some(seed) => RandRng(rand::rngs::StdRng::seed_from_u64(seed)),
        None => RandRng(rand::rngs::StdRng::from_os_rng()),
    }
}
