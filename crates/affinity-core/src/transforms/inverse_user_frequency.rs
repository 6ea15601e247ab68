//! Inverse user frequency weighting.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::PreferenceTransform;
use crate::common::Refreshable;
use crate::error::{Error, Result};
use crate::model::{DataModel, ItemId, Preference};

/// Scales each value by `log_base(numUsers / usersWhoRatedItem)`.
///
/// Items rated by everyone contribute nothing; rare items are boosted.
/// Factors are computed up front and rebuilt on refresh.
pub struct InverseUserFrequency {
    data_model: Arc<dyn DataModel>,
    log_base: f64,
    factors: ArcSwap<FxHashMap<ItemId, f64>>,
}

impl InverseUserFrequency {
    /// Creates the transform and computes its factors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `log_base` is NaN or not above 1.
    pub fn new(data_model: Arc<dyn DataModel>, log_base: f64) -> Result<Self> {
        if log_base.is_nan() || log_base <= 1.0 {
            return Err(Error::invalid(format!(
                "log base must be greater than 1, got {log_base}"
            )));
        }
        let factors = compute_factors(data_model.as_ref(), log_base)?;
        Ok(Self {
            data_model,
            log_base,
            factors: ArcSwap::from_pointee(factors),
        })
    }

    /// Logarithm base used for the factors.
    #[must_use]
    pub fn log_base(&self) -> f64 {
        self.log_base
    }
}

fn compute_factors(data_model: &dyn DataModel, log_base: f64) -> Result<FxHashMap<ItemId, f64>> {
    let users = data_model.users()?;
    let mut counts: FxHashMap<ItemId, usize> = FxHashMap::default();
    for user in users.iter() {
        for pref in user.preferences() {
            *counts.entry(pref.item_id.clone()).or_default() += 1;
        }
    }

    let num_users = users.len() as f64;
    let log_factor = log_base.ln();
    let factors: FxHashMap<ItemId, f64> = counts
        .into_iter()
        .map(|(item, count)| (item, (num_users / count as f64).ln() / log_factor))
        .collect();
    debug!(items = factors.len(), "computed inverse user frequency factors");
    Ok(factors)
}

impl PreferenceTransform for InverseUserFrequency {
    fn transformed_value(&self, pref: &Preference) -> Result<f64> {
        Ok(self
            .factors
            .load()
            .get(&pref.item_id)
            .map_or(pref.value, |factor| pref.value * factor))
    }
}

impl Refreshable for InverseUserFrequency {
    fn refresh(&self) {
        match compute_factors(self.data_model.as_ref(), self.log_base) {
            Ok(factors) => self.factors.store(Arc::new(factors)),
            Err(err) => warn!(error = %err, "unable to refresh inverse user frequency"),
        }
    }
}
