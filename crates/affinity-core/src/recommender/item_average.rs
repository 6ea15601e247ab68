//! Baseline recommender: an item's mean preference.

use std::sync::Arc;

use tracing::debug;

use super::averages::LazyAverages;
use super::{check_how_many, unrated_items, RecommendedItem, Recommender, Rescorer};
use crate::common::{RefreshLock, Refreshable};
use crate::error::Result;
use crate::model::{DataModel, Item, ItemId, UserId};
use crate::top_items::top_items;

/// Estimates every preference as the item's average preference across all
/// users. Ignores the target user's tastes entirely.
pub struct ItemAverageRecommender {
    averages: LazyAverages,
    refresh_lock: RefreshLock,
}

impl ItemAverageRecommender {
    /// Creates a recommender over `data_model`. Averages are computed on
    /// first use.
    pub fn new(data_model: Arc<dyn DataModel>) -> Self {
        Self {
            averages: LazyAverages::new(data_model),
            refresh_lock: RefreshLock::new(),
        }
    }
}

impl Recommender for ItemAverageRecommender {
    fn recommend_with_rescorer(
        &self,
        user_id: &UserId,
        how_many: usize,
        rescorer: &dyn Rescorer<Item>,
    ) -> Result<Vec<RecommendedItem>> {
        check_how_many(how_many)?;
        debug!(user = %user_id, how_many, "recommending items by item average");
        let user = self.data_model().user(user_id)?;
        let candidates = unrated_items(&user, self.data_model().as_ref())?;
        self.averages.with(|index| {
            let estimator = |item: &ItemId| -> Result<f64> { Ok(index.item_average(item)) };
            top_items(how_many, candidates, rescorer, &estimator)
        })?
    }

    fn estimate_preference(&self, user_id: &UserId, item_id: &ItemId) -> Result<f64> {
        let user = self.data_model().user(user_id)?;
        if let Some(pref) = user.preference_for(item_id) {
            return Ok(pref.value);
        }
        self.averages.with(|index| index.item_average(item_id))
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

impl Refreshable for ItemAverageRecommender {
    fn refresh(&self) {
        self.refresh_lock.run(|| {
            self.data_model().refresh();
            self.averages.rebuild();
        });
    }
}

impl std::fmt::Debug for ItemAverageRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ItemAverageRecommender")
    }
}
