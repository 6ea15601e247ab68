//! Item-based collaborative filtering.

use std::sync::Arc;

use tracing::debug;

use super::{
    check_how_many, unrated_items, ItemBasedRecommender, ItemPair, NullRescorer, RecommendedItem,
    Recommender, Rescorer,
};
use crate::common::{FullRunningAverage, RefreshLock, Refreshable, RunningAverage};
use crate::correlation::ItemCorrelation;
use crate::error::{Error, Result};
use crate::model::{DataModel, Item, ItemId, User, UserId};
use crate::top_items::top_items;

/// Estimates a user's preference for an item from the user's own
/// preferences, weighted by each rated item's `correlation + 1` to it.
pub struct GenericItemBasedRecommender {
    data_model: Arc<dyn DataModel>,
    correlation: Arc<dyn ItemCorrelation>,
    refresh_lock: RefreshLock,
}

impl GenericItemBasedRecommender {
    /// Creates a recommender over `data_model`.
    pub fn new(data_model: Arc<dyn DataModel>, correlation: Arc<dyn ItemCorrelation>) -> Self {
        Self {
            data_model,
            correlation,
            refresh_lock: RefreshLock::new(),
        }
    }

    fn estimate_for(&self, user: &User, item: &ItemId) -> Result<f64> {
        let mut preference = 0.0;
        let mut total_weight = 0.0;
        for pref in user.preferences() {
            let correlation = self.correlation.item_correlation(item, &pref.item_id)?;
            if !correlation.is_nan() {
                let weight = correlation + 1.0;
                preference += weight * pref.value;
                total_weight += weight;
            }
        }
        Ok(if total_weight == 0.0 {
            f64::NAN
        } else {
            preference / total_weight
        })
    }

    fn items_except(&self, excluded: &[ItemId]) -> Result<Vec<Arc<Item>>> {
        Ok(self
            .data_model
            .items()?
            .iter()
            .filter(|item| !excluded.contains(item.id()))
            .cloned()
            .collect())
    }
}

impl Recommender for GenericItemBasedRecommender {
    fn recommend_with_rescorer(
        &self,
        user_id: &UserId,
        how_many: usize,
        rescorer: &dyn Rescorer<Item>,
    ) -> Result<Vec<RecommendedItem>> {
        check_how_many(how_many)?;
        debug!(user = %user_id, how_many, "recommending items");

        let user = self.data_model.user(user_id)?;
        if user.preferences().is_empty() {
            return Ok(Vec::new());
        }
        let candidates = unrated_items(&user, self.data_model.as_ref())?;
        let estimator = |item: &ItemId| -> Result<f64> { self.estimate_for(&user, item) };
        let recommended = top_items(how_many, candidates, rescorer, &estimator)?;
        debug!(user = %user_id, count = recommended.len(), "recommendations ready");
        Ok(recommended)
    }

    fn estimate_preference(&self, user_id: &UserId, item_id: &ItemId) -> Result<f64> {
        let user = self.data_model.user(user_id)?;
        if let Some(pref) = user.preference_for(item_id) {
            return Ok(pref.value);
        }
        self.data_model.item(item_id)?;
        self.estimate_for(&user, item_id)
    }

    fn data_model(&self) -> &Arc<dyn DataModel> {
        &self.data_model
    }
}

impl ItemBasedRecommender for GenericItemBasedRecommender {
    fn most_similar_items_with_rescorer(
        &self,
        item_id: &ItemId,
        how_many: usize,
        rescorer: &dyn Rescorer<ItemPair>,
    ) -> Result<Vec<RecommendedItem>> {
        check_how_many(how_many)?;
        self.data_model.item(item_id)?;
        let candidates = self.items_except(std::slice::from_ref(item_id))?;
        let estimator = |item: &ItemId| -> Result<f64> {
            let pair = (item_id.clone(), item.clone());
            if rescorer.is_filtered(&pair) {
                return Ok(f64::NAN);
            }
            let correlation = self.correlation.item_correlation(item_id, item)?;
            Ok(rescorer.rescore(&pair, correlation))
        };
        top_items(how_many, candidates, &NullRescorer, &estimator)
    }

    fn most_similar_to_items_with_rescorer(
        &self,
        item_ids: &[ItemId],
        how_many: usize,
        rescorer: &dyn Rescorer<ItemPair>,
    ) -> Result<Vec<RecommendedItem>> {
        check_how_many(how_many)?;
        if item_ids.is_empty() {
            return Err(Error::invalid("at least one seed item is required"));
        }
        for item_id in item_ids {
            self.data_model.item(item_id)?;
        }
        let candidates = self.items_except(item_ids)?;
        // A NaN correlation to any seed makes the mean NaN and drops the
        // candidate.
        let estimator = |item: &ItemId| -> Result<f64> {
            let mut average = FullRunningAverage::new();
            for seed in item_ids {
                let pair = (seed.clone(), item.clone());
                if rescorer.is_filtered(&pair) {
                    continue;
                }
                let correlation = self.correlation.item_correlation(seed, item)?;
                average.add_datum(rescorer.rescore(&pair, correlation));
            }
            Ok(average.average())
        };
        top_items(how_many, candidates, &NullRescorer, &estimator)
    }

    fn recommended_because(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
        how_many: usize,
    ) -> Result<Vec<RecommendedItem>> {
        check_how_many(how_many)?;
        let user = self.data_model.user(user_id)?;
        self.data_model.item(item_id)?;
        let candidates = user
            .preferences()
            .iter()
            .filter(|pref| &pref.item_id != item_id)
            .map(|pref| self.data_model.item(&pref.item_id))
            .collect::<Result<Vec<_>>>()?;
        let estimator = |item: &ItemId| -> Result<f64> {
            let Some(pref) = user.preference_for(item) else {
                return Ok(f64::NAN);
            };
            let correlation = self.correlation.item_correlation(item_id, item)?;
            Ok((1.0 + correlation) * pref.value)
        };
        top_items(how_many, candidates, &NullRescorer, &estimator)
    }
}

impl Refreshable for GenericItemBasedRecommender {
    fn refresh(&self) {
        self.refresh_lock.run(|| {
            self.data_model.refresh();
            self.correlation.refresh();
        });
    }
}

impl std::fmt::Debug for GenericItemBasedRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericItemBasedRecommender")
            .finish_non_exhaustive()
    }
}
