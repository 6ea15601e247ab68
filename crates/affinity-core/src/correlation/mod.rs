//! Correlation engine: pairwise similarity between users or items.
//!
//! Every correlation is a value in `[-1.0, 1.0]`, or NaN when the two
//! histories give no evidence. NaN is never an error.

mod generic;
mod inferrer;
mod pearson;
mod spearman;
mod stats;

#[cfg(test)]
mod inferrer_tests;
#[cfg(test)]
mod pearson_tests;

pub use generic::{GenericItemCorrelation, ItemItemCorrelation};
pub use inferrer::AveragingPreferenceInferrer;
pub use pearson::PearsonCorrelation;
pub use spearman::SpearmanCorrelation;

use crate::common::Refreshable;
use crate::error::Result;
use crate::model::{ItemId, User};

/// Similarity between two users.
pub trait UserCorrelation: Refreshable + Send + Sync {
    /// Correlation of `a` and `b`, NaN when undefined.
    fn user_correlation(&self, a: &User, b: &User) -> Result<f64>;
}

/// Similarity between two items.
pub trait ItemCorrelation: Refreshable + Send + Sync {
    /// Correlation of `a` and `b`, NaN when undefined.
    fn item_correlation(&self, a: &ItemId, b: &ItemId) -> Result<f64>;
}

/// Synthesizes a stand-in for a preference a user never expressed.
pub trait PreferenceInferrer: Refreshable + Send + Sync {
    /// Inferred preference of `user` for `item`.
    fn infer_preference(&self, user: &User, item: &ItemId) -> Result<f64>;
}
