//! User-based collaborative filtering.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::{
    check_how_many, NullRescorer, RecommendedItem, Recommender, Rescorer, SimilarUser,
    UserBasedRecommender, UserPair,
};
use crate::common::{RefreshLock, Refreshable};
use crate::correlation::UserCorrelation;
use crate::error::Result;
use crate::model::{DataModel, Item, ItemId, User, UserId};
use crate::neighborhood::UserNeighborhood;
use crate::top_items::{top_items, top_users};

/// Estimates a user's preference for an item from the preferences of the
/// user's neighborhood, weighted by `correlation + 1`.
pub struct GenericUserBasedRecommender {
    data_model: Arc<dyn DataModel>,
    neighborhood: Arc<dyn UserNeighborhood>,
    correlation: Arc<dyn UserCorrelation>,
    refresh_lock: RefreshLock,
}

impl GenericUserBasedRecommender {
    /// Creates a recommender over `data_model`.
    ///
    /// `correlation` weights neighbors and answers similar-user queries;
    /// it is normally the one `neighborhood` was built with.
    pub fn new(
        data_model: Arc<dyn DataModel>,
        neighborhood: Arc<dyn UserNeighborhood>,
        correlation: Arc<dyn UserCorrelation>,
    ) -> Self {
        Self {
            data_model,
            neighborhood,
            correlation,
            refresh_lock: RefreshLock::new(),
        }
    }

    fn estimate_from(&self, user: &User, neighbors: &[Arc<User>], item: &ItemId) -> Result<f64> {
        let mut preference = 0.0;
        let mut total_weight = 0.0;
        for neighbor in neighbors {
            if neighbor.id() == user.id() {
                continue;
            }
            let Some(pref) = neighbor.preference_for(item) else {
                continue;
            };
            let weight = self.correlation.user_correlation(user, neighbor)? + 1.0;
            if !weight.is_nan() {
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

    /// Items rated by any neighbor but not by `user`, in id order.
    fn candidate_items(&self, user: &User, neighbors: &[Arc<User>]) -> Result<Vec<Arc<Item>>> {
        let ids: BTreeSet<&ItemId> = neighbors
            .iter()
            .flat_map(|neighbor| neighbor.preferences())
            .map(|pref| &pref.item_id)
            .filter(|item| user.preference_for(item).is_none())
            .collect();
        ids.into_iter().map(|id| self.data_model.item(id)).collect()
    }
}

impl Recommender for GenericUserBasedRecommender {
    fn recommend_with_rescorer(
        &self,
        user_id: &UserId,
        how_many: usize,
        rescorer: &dyn Rescorer<Item>,
    ) -> Result<Vec<RecommendedItem>> {
        check_how_many(how_many)?;
        debug!(user = %user_id, how_many, "recommending items");

        let user = self.data_model.user(user_id)?;
        let neighbors = self.neighborhood.user_neighborhood(user_id)?;
        debug!(user = %user_id, neighbors = neighbors.len(), "neighborhood ready");
        if neighbors.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.candidate_items(&user, &neighbors)?;
        let estimator =
            |item: &ItemId| -> Result<f64> { self.estimate_from(&user, &neighbors, item) };
        let recommended = top_items(how_many, candidates, rescorer, &estimator)?;
        debug!(user = %user_id, count = recommended.len(), "recommendations ready");
        Ok(recommended)
    }

    fn estimate_preference(&self, user_id: &UserId, item_id: &ItemId) -> Result<f64> {
        let user = self.data_model.user(user_id)?;
        if let Some(pref) = user.preference_for(item_id) {
            return Ok(pref.value);
        }
        let neighbors = self.neighborhood.user_neighborhood(user_id)?;
        self.data_model.item(item_id)?;
        self.estimate_from(&user, &neighbors, item_id)
    }

    fn data_model(&self) -> &Arc<dyn DataModel> {
        &self.data_model
    }
}

impl UserBasedRecommender for GenericUserBasedRecommender {
    fn most_similar_users_with_rescorer(
        &self,
        user_id: &UserId,
        how_many: usize,
        rescorer: &dyn Rescorer<UserPair>,
    ) -> Result<Vec<SimilarUser>> {
        check_how_many(how_many)?;
        let target = self.data_model.user(user_id)?;
        let candidates: Vec<Arc<User>> = self
            .data_model
            .users()?
            .iter()
            .filter(|user| user.id() != user_id)
            .cloned()
            .collect();
        let estimator = |user: &User| -> Result<f64> {
            let pair = (user_id.clone(), user.id().clone());
            if rescorer.is_filtered(&pair) {
                return Ok(f64::NAN);
            }
            let correlation = self.correlation.user_correlation(&target, user)?;
            Ok(rescorer.rescore(&pair, correlation))
        };
        top_users(how_many, candidates, &NullRescorer, &estimator)
    }
}

impl Refreshable for GenericUserBasedRecommender {
    fn refresh(&self) {
        self.refresh_lock.run(|| {
            self.data_model.refresh();
            self.neighborhood.refresh();
        });
    }
}

impl std::fmt::Debug for GenericUserBasedRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericUserBasedRecommender")
            .finish_non_exhaustive()
    }
}
