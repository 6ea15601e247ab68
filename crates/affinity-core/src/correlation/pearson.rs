//! Pearson product-moment correlation over sorted preference lists.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::trace;

use super::stats::{normalize, PairedSums};
use super::{ItemCorrelation, PreferenceInferrer, UserCorrelation};
use crate::common::Refreshable;
use crate::error::Result;
use crate::model::{DataModel, ItemId, Preference, User};
use crate::transforms::{CorrelationTransform, PreferenceTransform};

/// Pearson correlation between users (joined on item) or items (joined on
/// user).
///
/// Both operands are walked once with a two-pointer merge. Optional hooks:
///
/// - an inferrer fills in one-sided keys for user-user comparisons,
/// - a preference transform remaps values before they are summed,
/// - a correlation transform post-processes the result,
/// - weighting discounts correlations computed from few overlaps.
pub struct PearsonCorrelation {
    data_model: Arc<dyn DataModel>,
    inferrer: Option<Arc<dyn PreferenceInferrer>>,
    preference_transform: Option<Arc<dyn PreferenceTransform>>,
    correlation_transform: Option<Arc<dyn CorrelationTransform>>,
    weighted: bool,
}

impl PearsonCorrelation {
    /// Unweighted correlation without hooks.
    #[must_use]
    pub fn new(data_model: Arc<dyn DataModel>) -> Self {
        Self {
            data_model,
            inferrer: None,
            preference_transform: None,
            correlation_transform: None,
            weighted: false,
        }
    }

    /// Enables or disables evidence weighting.
    #[must_use]
    pub fn weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    /// Infers missing preferences in user-user comparisons.
    #[must_use]
    pub fn with_inferrer(mut self, inferrer: Arc<dyn PreferenceInferrer>) -> Self {
        self.inferrer = Some(inferrer);
        self
    }

    /// Remaps preference values before correlating.
    #[must_use]
    pub fn with_preference_transform(mut self, transform: Arc<dyn PreferenceTransform>) -> Self {
        self.preference_transform = Some(transform);
        self
    }

    /// Post-processes each raw correlation.
    #[must_use]
    pub fn with_correlation_transform(mut self, transform: Arc<dyn CorrelationTransform>) -> Self {
        self.correlation_transform = Some(transform);
        self
    }

    /// Whether evidence weighting is on.
    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    /// The data model correlations are computed against.
    #[must_use]
    pub fn data_model(&self) -> &Arc<dyn DataModel> {
        &self.data_model
    }

    fn value(&self, pref: &Preference) -> Result<f64> {
        match &self.preference_transform {
            Some(transform) => transform.transformed_value(pref),
            None => Ok(pref.value),
        }
    }

    fn user_value(&self, user: &User, pref: &Preference) -> Result<f64> {
        match &self.preference_transform {
            Some(transform) => transform.transformed_user_value(user, pref),
            None => Ok(pref.value),
        }
    }

    fn finish(&self, sums: &PairedSums, corpus: impl FnOnce() -> Result<usize>) -> Result<f64> {
        let mut result = sums.correlation();
        if let Some(transform) = &self.correlation_transform {
            result = transform.transform_correlation(result);
        }
        if !result.is_nan() {
            result = normalize(result, sums.count, corpus()?, self.weighted);
        }
        Ok(result)
    }
}

impl std::fmt::Debug for PearsonCorrelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PearsonCorrelation")
            .field("weighted", &self.weighted)
            .field("inferrer", &self.inferrer.is_some())
            .field("preference_transform", &self.preference_transform.is_some())
            .field("correlation_transform", &self.correlation_transform.is_some())
            .finish_non_exhaustive()
    }
}

impl UserCorrelation for PearsonCorrelation {
    fn user_correlation(&self, a: &User, b: &User) -> Result<f64> {
        let xs = a.preferences();
        let ys = b.preferences();
        if xs.is_empty() || ys.is_empty() {
            return Ok(f64::NAN);
        }

        let mut sums = PairedSums::default();
        let (mut i, mut j) = (0, 0);
        // Stops as soon as either side is exhausted; trailing one-sided
        // keys are never inferred.
        while i < xs.len() && j < ys.len() {
            let (x, y) = (&xs[i], &ys[j]);
            match x.item_id.cmp(&y.item_id) {
                Ordering::Equal => {
                    sums.add(self.user_value(a, x)?, self.user_value(b, y)?);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    if let Some(inferrer) = &self.inferrer {
                        sums.add(
                            self.user_value(a, x)?,
                            inferrer.infer_preference(b, &x.item_id)?,
                        );
                    }
                    i += 1;
                }
                Ordering::Greater => {
                    if let Some(inferrer) = &self.inferrer {
                        sums.add(
                            inferrer.infer_preference(a, &y.item_id)?,
                            self.user_value(b, y)?,
                        );
                    }
                    j += 1;
                }
            }
        }

        let result = self.finish(&sums, || self.data_model.num_items())?;
        trace!(user1 = %a.id(), user2 = %b.id(), result, "user correlation");
        Ok(result)
    }
}

impl ItemCorrelation for PearsonCorrelation {
    fn item_correlation(&self, a: &ItemId, b: &ItemId) -> Result<f64> {
        let xs = self.data_model.preferences_for_item(a)?;
        let ys = self.data_model.preferences_for_item(b)?;
        if xs.is_empty() || ys.is_empty() {
            return Ok(f64::NAN);
        }
        if a == b {
            return Ok(1.0);
        }

        let mut sums = PairedSums::default();
        let (mut i, mut j) = (0, 0);
        while i < xs.len() && j < ys.len() {
            let (x, y) = (&xs[i], &ys[j]);
            match x.user_id.cmp(&y.user_id) {
                Ordering::Equal => {
                    sums.add(self.value(x)?, self.value(y)?);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }

        let result = self.finish(&sums, || self.data_model.num_users())?;
        trace!(item1 = %a, item2 = %b, result, "item correlation");
        Ok(result)
    }
}

impl Refreshable for PearsonCorrelation {
    fn refresh(&self) {
        self.data_model.refresh();
        if let Some(inferrer) = &self.inferrer {
            inferrer.refresh();
        }
        if let Some(transform) = &self.preference_transform {
            transform.refresh();
        }
        if let Some(transform) = &self.correlation_transform {
            transform.refresh();
        }
    }
}
