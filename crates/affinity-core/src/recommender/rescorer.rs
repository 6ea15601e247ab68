//! Caller-supplied scoring hooks.

use crate::error::Result;

/// Adjusts or vetoes a candidate's score before ranking.
///
/// Returning NaN from [`Rescorer::rescore`] excludes the candidate.
pub trait Rescorer<T: ?Sized> {
    /// Final score for `thing` given its estimated score.
    fn rescore(&self, thing: &T, original: f64) -> f64;

    /// Whether `thing` is excluded before estimation.
    fn is_filtered(&self, _thing: &T) -> bool {
        false
    }

    /// True only for rescorers that never change or filter anything.
    /// Caching layers may reuse results computed under such a rescorer.
    fn is_identity(&self) -> bool {
        false
    }
}

/// Rescorer that keeps every candidate and every score.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRescorer;

impl<T: ?Sized> Rescorer<T> for NullRescorer {
    fn rescore(&self, _thing: &T, original: f64) -> f64 {
        original
    }

    fn is_identity(&self) -> bool {
        true
    }
}

/// Produces the base score of a candidate.
pub trait Estimator<T: ?Sized> {
    /// Estimated score, NaN when there is no evidence.
    fn estimate(&self, thing: &T) -> Result<f64>;
}

impl<T: ?Sized, F> Estimator<T> for F
where
    F: Fn(&T) -> Result<f64>,
{
    fn estimate(&self, thing: &T) -> Result<f64> {
        self(thing)
    }
}
