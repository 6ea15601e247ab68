//! Slope-one recommender over precomputed average item-item diffs.
//!
//! For every pair of items rated by the same user, the storage keeps the
//! average of `pref(b) - pref(a)`. A user's preference for an unrated item
//! is then the (optionally weighted) mean of `pref(rated) + diff(rated,
//! item)` over the items the user rated.

mod memory;


use std::sync::Arc;

use tracing::debug;

pub use memory::MemoryDiffStorage;

use super::{check_how_many, RecommendedItem, Recommender, Rescorer};
use crate::common::{RefreshLock, Refreshable, RunningAverage, WeightedRunningAverage};
use crate::error::{Error, Result};
use crate::model::{DataModel, Item, ItemId, Preference, User, UserId};
use crate::top_items::top_items;

/// Summary of the diffs between two items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffStat {
    /// Average of `pref(second) - pref(first)`.
    pub average: f64,
    /// Number of users contributing.
    pub count: usize,
    /// Sample standard deviation, NaN when not tracked or undefined.
    pub std_dev: f64,
}

/// A write to fold into stored diffs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferenceChange {
    /// A preference was set; `old` is the replaced value, if any.
    Set {
        /// Previous value.
        old: Option<f64>,
        /// New value.
        value: f64,
    },
    /// A preference with value `old` was removed.
    Remove {
        /// Removed value.
        old: f64,
    },
}

/// Storage of average item-item diffs and per-item averages.
pub trait DiffStorage: Refreshable + Send + Sync {
    /// Diff from `from` to `to`, if tracked.
    fn diff(&self, from: &ItemId, to: &ItemId) -> Option<DiffStat>;

    /// Diffs from each of `user`'s rated items to `item`, index-aligned
    /// with `user.preferences()`.
    fn diffs(&self, user: &User, item: &ItemId) -> Vec<Option<DiffStat>> {
        user.preferences()
            .iter()
            .map(|pref| self.diff(&pref.item_id, item))
            .collect()
    }

    /// Mean preference for `item`, if anyone rated it.
    fn average_item_pref(&self, item: &ItemId) -> Option<f64>;

    /// Folds a write into the stored statistics. `user_prefs` are the
    /// user's preferences before the write.
    fn update_item_pref(
        &self,
        user_prefs: &[Preference],
        item: &ItemId,
        change: PreferenceChange,
    ) -> Result<()>;

    /// Items `user` could be recommended.
    fn recommendable_items(&self, user: &UserId) -> Result<Vec<Arc<Item>>>;
}

/// Slope-one recommender.
///
/// With `weighted`, each diff counts in proportion to the number of users
/// behind it; with `std_dev_weighted` additionally divided by
/// `1 + std_dev`. Items with no usable diff fall back to their average.
pub struct SlopeOneRecommender {
    data_model: Arc<dyn DataModel>,
    weighted: bool,
    std_dev_weighted: bool,
    storage: Arc<dyn DiffStorage>,
    refresh_lock: RefreshLock,
}

impl SlopeOneRecommender {
    /// Weighted, standard-deviation weighted, over an unbounded
    /// [`MemoryDiffStorage`].
    pub fn new(data_model: Arc<dyn DataModel>) -> Result<Self> {
        let storage = MemoryDiffStorage::new(Arc::clone(&data_model), true, usize::MAX)?;
        Self::with_storage(data_model, true, true, Arc::new(storage))
    }

    /// Creates a recommender over an explicit diff storage.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `std_dev_weighted` is set without `weighted`.
    pub fn with_storage(
        data_model: Arc<dyn DataModel>,
        weighted: bool,
        std_dev_weighted: bool,
        storage: Arc<dyn DiffStorage>,
    ) -> Result<Self> {
        if std_dev_weighted && !weighted {
            return Err(Error::invalid(
                "std_dev_weighted requires weighted to be set",
            ));
        }
        Ok(Self {
            data_model,
            weighted,
            std_dev_weighted,
            storage,
            refresh_lock: RefreshLock::new(),
        })
    }

    /// Whether diffs are weighted by their support.
    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    /// Whether weights are discounted by standard deviation.
    #[must_use]
    pub fn is_std_dev_weighted(&self) -> bool {
        self.std_dev_weighted
    }

    fn weight(&self, stat: &DiffStat) -> f64 {
        if !self.weighted {
            return 1.0;
        }
        let weight = stat.count as f64;
        if self.std_dev_weighted && !stat.std_dev.is_nan() {
            weight / (1.0 + stat.std_dev)
        } else {
            weight
        }
    }

    fn estimate_for(&self, user: &User, item: &ItemId) -> f64 {
        let diffs = self.storage.diffs(user, item);
        let mut estimate = WeightedRunningAverage::new();
        for (pref, stat) in user.preferences().iter().zip(&diffs) {
            if let Some(stat) = stat {
                estimate.add_weighted_datum(pref.value + stat.average, self.weight(stat));
            }
        }
        if estimate.total_weight() > 0.0 {
            estimate.average()
        } else {
            self.storage.average_item_pref(item).unwrap_or(f64::NAN)
        }
    }
}

impl Recommender for SlopeOneRecommender {
    fn recommend_with_rescorer(
        &self,
        user_id: &UserId,
        how_many: usize,
        rescorer: &dyn Rescorer<Item>,
    ) -> Result<Vec<RecommendedItem>> {
        check_how_many(how_many)?;
        debug!(user = %user_id, how_many, "recommending items by slope one");
        let user = self.data_model.user(user_id)?;
        let candidates = self.storage.recommendable_items(user_id)?;
        let estimator = |item: &ItemId| -> Result<f64> { Ok(self.estimate_for(&user, item)) };
        top_items(how_many, candidates, rescorer, &estimator)
    }

    fn estimate_preference(&self, user_id: &UserId, item_id: &ItemId) -> Result<f64> {
        let user = self.data_model.user(user_id)?;
        if let Some(pref) = user.preference_for(item_id) {
            return Ok(pref.value);
        }
        Ok(self.estimate_for(&user, item_id))
    }

    fn set_preference(&self, user_id: &UserId, item_id: &ItemId, value: f64) -> Result<()> {
        crate::model::check_value(value)?;
        if self.std_dev_weighted {
            return Err(Error::Unsupported(
                "incremental updates with standard-deviation weighting".into(),
            ));
        }
        let before = match self.data_model.user(user_id) {
            Ok(user) => Some(user),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };
        let prefs = before.as_ref().map_or(&[][..], |user| user.preferences());
        let old = before
            .as_ref()
            .and_then(|user| user.preference_for(item_id))
            .map(|pref| pref.value);
        debug!(user = %user_id, item = %item_id, value, "setting preference");
        self.data_model.set_preference(user_id, item_id, value)?;
        self.storage
            .update_item_pref(prefs, item_id, PreferenceChange::Set { old, value })
    }

    fn remove_preference(&self, user_id: &UserId, item_id: &ItemId) -> Result<()> {
        let before = self.data_model.user(user_id)?;
        debug!(user = %user_id, item = %item_id, "removing preference");
        self.data_model.remove_preference(user_id, item_id)?;
        match before.preference_for(item_id) {
            Some(pref) => self.storage.update_item_pref(
                before.preferences(),
                item_id,
                PreferenceChange::Remove { old: pref.value },
            ),
            None => Ok(()),
        }
    }

    fn data_model(&self) -> &Arc<dyn DataModel> {
        &self.data_model
    }
}

impl Refreshable for SlopeOneRecommender {
    fn refresh(&self) {
        self.refresh_lock.run(|| self.storage.refresh());
    }
}

impl std::fmt::Debug for SlopeOneRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlopeOneRecommender")
            .field("weighted", &self.weighted)
            .field("std_dev_weighted", &self.std_dev_weighted)
            .finish_non_exhaustive()
    }
}
