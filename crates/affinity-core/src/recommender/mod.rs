//! Recommenders: ranked item suggestions and preference estimates.
//!
//! [`Recommender`] is the common contract. User-based and item-based
//! collaborative filtering add similarity queries through
//! [`UserBasedRecommender`] and [`ItemBasedRecommender`]; the remaining
//! implementations are simple baselines and the slope-one scheme.
//! [`CachingRecommender`] decorates any of them.

mod averages;
mod caching;
mod item_average;
mod item_based;
mod item_user_average;
mod rescorer;
pub mod slope_one;
mod user_based;

#[cfg(test)]
mod averages_tests;
#[cfg(test)]
mod user_based_tests;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

pub use caching::CachingRecommender;
pub use item_average::ItemAverageRecommender;
pub use item_based::GenericItemBasedRecommender;
pub use item_user_average::ItemUserAverageRecommender;
pub use rescorer::{Estimator, NullRescorer, Rescorer};
pub use slope_one::SlopeOneRecommender;
pub use user_based::GenericUserBasedRecommender;

use crate::common::Refreshable;
use crate::error::{Error, Result};
use crate::model::{DataModel, Item, ItemId, User, UserId};

/// Pair of items handed to pairwise rescorers, seed first.
pub type ItemPair = (ItemId, ItemId);

/// Pair of users handed to pairwise rescorers, target first.
pub type UserPair = (UserId, UserId);

/// An item and its final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedItem {
    /// The recommended item.
    pub item: Arc<Item>,
    /// Estimated preference after rescoring.
    pub value: f64,
}

impl RecommendedItem {
    /// Id of the recommended item.
    #[must_use]
    pub fn item_id(&self) -> &ItemId {
        self.item.id()
    }
}

impl fmt::Display for RecommendedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecommendedItem[item:{}, value:{}]", self.item.id(), self.value)
    }
}

/// A user and its similarity to a query user.
#[derive(Debug, Clone)]
pub struct SimilarUser {
    /// The similar user.
    pub user: Arc<User>,
    /// Correlation after rescoring.
    pub similarity: f64,
}

/// Produces recommendations and preference estimates.
pub trait Recommender: Refreshable + Send + Sync {
    /// Up to `how_many` items `user` has not rated, best first.
    fn recommend(&self, user: &UserId, how_many: usize) -> Result<Vec<RecommendedItem>> {
        self.recommend_with_rescorer(user, how_many, &NullRescorer)
    }

    /// Like [`Recommender::recommend`], with scores passed through `rescorer`.
    fn recommend_with_rescorer(
        &self,
        user: &UserId,
        how_many: usize,
        rescorer: &dyn Rescorer<Item>,
    ) -> Result<Vec<RecommendedItem>>;

    /// The explicit preference if one exists, otherwise an estimate
    /// (NaN without evidence).
    fn estimate_preference(&self, user: &UserId, item: &ItemId) -> Result<f64>;

    /// Records a preference in the underlying data model.
    fn set_preference(&self, user: &UserId, item: &ItemId, value: f64) -> Result<()> {
        crate::model::check_value(value)?;
        tracing::debug!(user = %user, item = %item, value, "setting preference");
        self.data_model().set_preference(user, item, value)
    }

    /// Removes a preference from the underlying data model.
    fn remove_preference(&self, user: &UserId, item: &ItemId) -> Result<()> {
        tracing::debug!(user = %user, item = %item, "removing preference");
        self.data_model().remove_preference(user, item)
    }

    /// The data model this recommender reads from.
    fn data_model(&self) -> &Arc<dyn DataModel>;
}

/// Recommender driven by user-user similarity.
pub trait UserBasedRecommender: Recommender {
    /// The `how_many` users most similar to `user`.
    fn most_similar_users(&self, user: &UserId, how_many: usize) -> Result<Vec<SimilarUser>> {
        self.most_similar_users_with_rescorer(user, how_many, &NullRescorer)
    }

    /// Like [`UserBasedRecommender::most_similar_users`], rescoring each
    /// `(user, candidate)` pair.
    fn most_similar_users_with_rescorer(
        &self,
        user: &UserId,
        how_many: usize,
        rescorer: &dyn Rescorer<UserPair>,
    ) -> Result<Vec<SimilarUser>>;
}

/// Recommender driven by item-item similarity.
pub trait ItemBasedRecommender: Recommender {
    /// The `how_many` items most similar to `item`, excluding `item`.
    fn most_similar_items(&self, item: &ItemId, how_many: usize) -> Result<Vec<RecommendedItem>> {
        self.most_similar_items_with_rescorer(item, how_many, &NullRescorer)
    }

    /// Like [`ItemBasedRecommender::most_similar_items`], rescoring each
    /// `(item, candidate)` pair.
    fn most_similar_items_with_rescorer(
        &self,
        item: &ItemId,
        how_many: usize,
        rescorer: &dyn Rescorer<ItemPair>,
    ) -> Result<Vec<RecommendedItem>>;

    /// The `how_many` items whose mean similarity to all of `items` is
    /// highest, excluding `items` themselves.
    fn most_similar_to_items(
        &self,
        items: &[ItemId],
        how_many: usize,
    ) -> Result<Vec<RecommendedItem>> {
        self.most_similar_to_items_with_rescorer(items, how_many, &NullRescorer)
    }

    /// Like [`ItemBasedRecommender::most_similar_to_items`], rescoring each
    /// `(seed, candidate)` pair before averaging.
    fn most_similar_to_items_with_rescorer(
        &self,
        items: &[ItemId],
        how_many: usize,
        rescorer: &dyn Rescorer<ItemPair>,
    ) -> Result<Vec<RecommendedItem>>;

    /// Items `user` rated that contributed most to recommending `item`.
    fn recommended_because(
        &self,
        user: &UserId,
        item: &ItemId,
        how_many: usize,
    ) -> Result<Vec<RecommendedItem>>;
}

pub(crate) fn check_how_many(how_many: usize) -> Result<()> {
    if how_many == 0 {
        return Err(Error::invalid("how_many must be at least 1"));
    }
    Ok(())
}

/// Items in `data_model` that `user` has no preference for.
pub(crate) fn unrated_items(user: &User, data_model: &dyn DataModel) -> Result<Vec<Arc<Item>>> {
    Ok(data_model
        .items()?
        .iter()
        .filter(|item| user.preference_for(item.id()).is_none())
        .cloned()
        .collect())
}
