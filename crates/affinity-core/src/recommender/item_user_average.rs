//! Baseline recommender: item mean adjusted by the user's bias.

use std::sync::Arc;

use tracing::debug;

use super::averages::{AverageIndex, LazyAverages};
use super::{check_how_many, unrated_items, RecommendedItem, Recommender, Rescorer};
use crate::common::{RefreshLock, Refreshable};
use crate::error::Result;
use crate::model::{DataModel, Item, ItemId, UserId};
use crate::top_items::top_items;

/// Estimates `item average + (user average - overall average)`.
///
/// NaN when either the item or the user has no preferences.
pub struct ItemUserAverageRecommender {
    averages: LazyAverages,
    refresh_lock: RefreshLock,
}

fn estimate(index: &AverageIndex, user: &UserId, item: &ItemId) -> f64 {
    index.item_average(item) + (index.user_average(user) - index.overall_average())
}

impl ItemUserAverageRecommender {
    /// Creates a recommender over `data_model`. Averages are computed on
    /// first use.
    pub fn new(data_model: Arc<dyn DataModel>) -> Self {
        Self {
            averages: LazyAverages::new(data_model),
            refresh_lock: RefreshLock::new(),
        }
    }
}

impl Recommender for ItemUserAverageRecommender {
    fn recommend_with_rescorer(
        &self,
        user_id: &UserId,
        how_many: usize,
        rescorer: &dyn Rescorer<Item>,
    ) -> Result<Vec<RecommendedItem>> {
        check_how_many(how_many)?;
        debug!(user = %user_id, how_many, "recommending items by item-user average");
        let user = self.data_model().user(user_id)?;
        let candidates = unrated_items(&user, self.data_model().as_ref())?;
        self.averages.with(|index| {
            let estimator = |item: &ItemId| -> Result<f64> { Ok(estimate(index, user_id, item)) };
            top_items(how_many, candidates, rescorer, &estimator)
        })?
    }

    fn estimate_preference(&self, user_id: &UserId, item_id: &ItemId) -> Result<f64> {
        let user = self.data_model().user(user_id)?;
        if let Some(pref) = user.preference_for(item_id) {
            return Ok(pref.value);
        }
        self.averages.with(|index| estimate(index, user_id, item_id))
    }

    fn set_preference(&self, user: &UserId, item: &ItemId, value: f64) -> Result<()> {
        crate::model::check_value(value)?;
        debug!(user = %user, item = %item, value, "setting preference");
        self.averages.set_preference(user, item, value)
    }

    fn remove_preference(&self, user: &UserId, item: &ItemId) -> Result<()> {
        debug!(user = %user, item = %item, "removing preference");
        self.averages.remove_preference(user, item)
    }

    fn data_model(&self) -> &Arc<dyn DataModel> {
        self.averages.data_model()
    }
}

impl Refreshable for ItemUserAverageRecommender {
    fn refresh(&self) {
        self.refresh_lock.run(|| {
            self.data_model().refresh();
            self.averages.rebuild();
        });
    }
}

impl std::fmt::Debug for ItemUserAverageRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ItemUserAverageRecommender")
    }
}
