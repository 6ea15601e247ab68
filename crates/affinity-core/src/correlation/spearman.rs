//! Spearman rank correlation.

use std::sync::Arc;

use super::{PearsonCorrelation, UserCorrelation};
use crate::common::{RefreshLock, Refreshable};
use crate::error::Result;
use crate::model::{DataModel, Preference, User};

/// Correlation of preference ranks rather than raw values.
///
/// Each user is replaced by a transient copy whose values are 1-based ranks
/// (lowest value is rank 1, ties keep item order), then handed to the
/// wrapped correlation.
pub struct SpearmanCorrelation {
    ranking: Arc<dyn UserCorrelation>,
    refresh_lock: RefreshLock,
}

impl SpearmanCorrelation {
    /// Ranks with a plain Pearson correlation over `data_model`.
    #[must_use]
    pub fn new(data_model: Arc<dyn DataModel>) -> Self {
        Self::with_correlation(Arc::new(PearsonCorrelation::new(data_model)))
    }

    /// Ranks with the given correlation.
    #[must_use]
    pub fn with_correlation(ranking: Arc<dyn UserCorrelation>) -> Self {
        Self {
            ranking,
            refresh_lock: RefreshLock::new(),
        }
    }
}

/// Copy of `user` with each value replaced by its rank.
pub(crate) fn ranked(user: &User) -> User {
    let mut by_value: Vec<&Preference> = user.preferences().iter().collect();
    by_value.sort_by(|a, b| a.value.total_cmp(&b.value));

    let mut ranked: Vec<Preference> = by_value
        .into_iter()
        .enumerate()
        .map(|(rank, pref)| Preference {
            user_id: pref.user_id.clone(),
            item_id: pref.item_id.clone(),
            value: (rank + 1) as f64,
        })
        .collect();
    ranked.sort_by(|a, b| a.item_id.cmp(&b.item_id));
    User::derived_view(user.id().clone(), ranked)
}

impl UserCorrelation for SpearmanCorrelation {
    fn user_correlation(&self, a: &User, b: &User) -> Result<f64> {
        self.ranking.user_correlation(&ranked(a), &ranked(b))
    }
}

impl Refreshable for SpearmanCorrelation {
    fn refresh(&self) {
        self.refresh_lock.run(|| self.ranking.refresh());
    }
}
