//! Value and correlation transforms plugged into the correlation engine.
//!
//! A [`PreferenceTransform`] remaps each preference value before it enters
//! the correlation sums. A [`CorrelationTransform`] post-processes the raw
//! correlation.

mod case_amplification;
mod inverse_user_frequency;
mod zscore;


pub use case_amplification::CaseAmplification;
pub use inverse_user_frequency::InverseUserFrequency;
pub use zscore::ZScore;

use crate::common::Refreshable;
use crate::error::Result;
use crate::model::{Preference, User};

/// Remaps a preference value before correlation.
pub trait PreferenceTransform: Refreshable + Send + Sync {
    /// The transformed value of `pref`.
    fn transformed_value(&self, pref: &Preference) -> Result<f64>;

    /// The transformed value of `pref`, one of `user`'s own preferences.
    ///
    /// Transforms with per-user statistics override this to read them from
    /// `user` when it is a derived view.
    fn transformed_user_value(&self, _user: &User, pref: &Preference) -> Result<f64> {
        self.transformed_value(pref)
    }
}

/// Post-processes a raw correlation value.
pub trait CorrelationTransform: Refreshable + Send + Sync {
    /// The transformed correlation. NaN stays NaN.
    fn transform_correlation(&self, value: f64) -> f64;
}
