//! Case amplification: sharpens strong correlations relative to weak ones.

use super::CorrelationTransform;
use crate::common::Refreshable;
use crate::error::{Error, Result};

/// Raises a correlation's magnitude to a power, keeping its sign.
///
/// A factor above 1 favours strongly correlated pairs.
#[derive(Debug, Clone, Copy)]
pub struct CaseAmplification {
    factor: f64,
}

impl CaseAmplification {
    /// Creates the transform.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `factor` is zero or NaN.
    pub fn new(factor: f64) -> Result<Self> {
        if factor.is_nan() || factor == 0.0 {
            return Err(Error::invalid(format!(
                "case amplification factor must be non-zero, got {factor}"
            )));
        }
        Ok(Self { factor })
    }

    /// The exponent applied to correlation magnitudes.
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl CorrelationTransform for CaseAmplification {
    fn transform_correlation(&self, value: f64) -> f64 {
        if value < 0.0 {
            -(-value).powf(self.factor)
        } else {
            value.powf(self.factor)
        }
    }
}

impl Refreshable for CaseAmplification {
    fn refresh(&self) {}
}
