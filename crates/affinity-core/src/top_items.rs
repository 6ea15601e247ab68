//! Bounded best-`k` selection.
//!
//! Every ranked answer in the crate (recommendations, most-similar users
//! and items, nearest-N neighborhoods, top correlation pairs) is produced by
//! offering scored candidates to a [`TopK`].
//!
//! Ties: among equal scores the earlier candidate ranks first, and a later
//! candidate never displaces an earlier one with the same score.

use std::sync::Arc;

use crate::correlation::ItemItemCorrelation;
use crate::error::Result;
use crate::model::{Item, ItemId, User};
use crate::recommender::{Estimator, ItemPair, RecommendedItem, Rescorer, SimilarUser};

/// Descending list of at most `capacity` scored entries.
#[derive(Debug, Clone)]
pub struct TopK<T> {
    capacity: usize,
    entries: Vec<(T, f64)>,
}

impl<T> TopK<T> {
    /// Creates an empty selector keeping at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity.min(1024)),
        }
    }

    /// Offers a candidate. Returns whether it was kept.
    ///
    /// NaN scores are never kept. When full, the candidate must score
    /// strictly higher than the current worst, which is then dropped.
    pub fn offer(&mut self, item: T, score: f64) -> bool {
        if score.is_nan() || self.capacity == 0 {
            return false;
        }
        if self.entries.len() >= self.capacity {
            if self.worst_score().is_some_and(|worst| score <= worst) {
                return false;
            }
            self.entries.pop();
        }
        let pos = self.entries.partition_point(|(_, s)| *s >= score);
        self.entries.insert(pos, (item, score));
        true
    }

    /// Score of the last kept entry.
    #[must_use]
    pub fn worst_score(&self) -> Option<f64> {
        self.entries.last().map(|(_, score)| *score)
    }

    /// Number of kept entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was kept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kept entries, best first.
    #[must_use]
    pub fn into_sorted_vec(self) -> Vec<(T, f64)> {
        self.entries
    }
}

/// Best `how_many` recommendable, unfiltered items by rescored estimate.
///
/// Candidates whose estimate lookup reports not-found are skipped.
pub fn top_items<I>(
    how_many: usize,
    candidates: I,
    rescorer: &dyn Rescorer<Item>,
    estimator: &dyn Estimator<ItemId>,
) -> Result<Vec<RecommendedItem>>
where
    I: IntoIterator<Item = Arc<Item>>,
{
    let mut top = TopK::new(how_many);
    for item in candidates {
        if !item.is_recommendable() || rescorer.is_filtered(&item) {
            continue;
        }
        let estimate = match estimator.estimate(item.id()) {
            Ok(value) => value,
            Err(err) if err.is_not_found() => continue,
            Err(err) => return Err(err),
        };
        let score = rescorer.rescore(&item, estimate);
        top.offer(item, score);
    }
    Ok(top
        .into_sorted_vec()
        .into_iter()
        .map(|(item, value)| RecommendedItem { item, value })
        .collect())
}

/// Best `how_many` unfiltered users by rescored estimate.
pub fn top_users<I>(
    how_many: usize,
    candidates: I,
    rescorer: &dyn Rescorer<User>,
    estimator: &dyn Estimator<User>,
) -> Result<Vec<SimilarUser>>
where
    I: IntoIterator<Item = Arc<User>>,
{
    let mut top = TopK::new(how_many);
    for user in candidates {
        if rescorer.is_filtered(&user) {
            continue;
        }
        let score = rescorer.rescore(&user, estimator.estimate(&user)?);
        top.offer(user, score);
    }
    Ok(top
        .into_sorted_vec()
        .into_iter()
        .map(|(user, similarity)| SimilarUser { user, similarity })
        .collect())
}

/// Best `how_many` item-item correlations by rescored value.
pub fn top_item_item_correlations<I>(
    how_many: usize,
    correlations: I,
    rescorer: &dyn Rescorer<ItemPair>,
) -> Vec<ItemItemCorrelation>
where
    I: IntoIterator<Item = ItemItemCorrelation>,
{
    let mut top = TopK::new(how_many);
    for correlation in correlations {
        let pair = (correlation.item1.clone(), correlation.item2.clone());
        if rescorer.is_filtered(&pair) {
            continue;
        }
        let score = rescorer.rescore(&pair, correlation.value);
        top.offer(correlation, score);
    }
    top.into_sorted_vec()
        .into_iter()
        .map(|(correlation, value)| ItemItemCorrelation {
            value,
            ..correlation
        })
        .collect()
}
