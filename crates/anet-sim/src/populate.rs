//! Random template filling
//!
//! Each field of a synthetic entity is set with some probability, so the
//! generated data mixes complete and sparse records.

use rand::Rng;

/// How often a field gets filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Always,
    Often,
    Sometimes,
    Rarely,
    Never,
}

impl Frequency {
    #[must_use]
    pub fn probability(self) -> f64 {
        match self {
            Frequency::Always => 1.0,
            Frequency::Often => 0.75,
            Frequency::Sometimes => 0.5,
            Frequency::Rarely => 0.1,
            Frequency::Never => 0.0,
        }
    }

    /// Roll the dice for one field
    pub fn roll<R: Rng + ?Sized>(self, rng: &mut R) -> bool {
        match self {
            Frequency::Always => true,
            Frequency::Never => false,
            other => rng.gen::<f64>() < other.probability(),
        }
    }
}

/// Fills fields of `target` with random values
///
/// ```
/// use anet_sim::populate::{Frequency, Populate};
/// let mut rng = rand::thread_rng();
/// let mut name = String::new();
/// let mut code = None;
/// Populate::new(&mut (&mut name, &mut code), &mut rng)
///     .field(Frequency::Always, |t, _| *t.0 = "Atlas".into())
///     .field(Frequency::Never, |t, _| *t.1 = Some("X"));
/// assert_eq!(name, "Atlas");
/// assert_eq!(code, None);
/// ```
pub struct Populate<'a, T, R: ?Sized> {
    target: &'a mut T,
    rng: &'a mut R,
    last: bool,
}

impl<'a, T, R: Rng + ?Sized> Populate<'a, T, R> {
    pub fn new(target: &'a mut T, rng: &'a mut R) -> Self {
        Self {
            target,
            rng,
            last: false,
        }
    }

    /// Set a field with the given frequency
    pub fn field(&mut self, frequency: Frequency, set: impl FnOnce(&mut T, &mut R)) -> &mut Self {
        self.last = frequency.roll(&mut *self.rng);
        if self.last {
            set(&mut *self.target, &mut *self.rng);
        }
        self
    }

    /// Set a field exactly when the previous one was set
    pub fn and(&mut self, set: impl FnOnce(&mut T, &mut R)) -> &mut Self {
        if self.last {
            set(&mut *self.target, &mut *self.rng);
        }
        self
    }
}
