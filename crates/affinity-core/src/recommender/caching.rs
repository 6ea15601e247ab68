//! Memoizing decorator over any [`Recommender`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::{check_how_many, RecommendedItem, Recommender, Rescorer};
use crate::cache::{CacheStats, MemoCache};
use crate::common::{RefreshLock, Refreshable};
use crate::error::Result;
use crate::model::{DataModel, Item, ItemId, UserId};

/// Cached recommendation list for one user.
#[derive(Debug)]
struct Recommendations {
    items: Vec<RecommendedItem>,
    /// Set once a recomputation still came back shorter than requested.
    exhausted: AtomicBool,
}

/// Caches recommendation lists per user and estimates per
/// `(user, item)` pair.
///
/// Lists are computed at the largest size ever requested so that one entry
/// serves every smaller request. Writes through this recommender drop the
/// affected user's list; cached estimates are kept until the next refresh.
pub struct CachingRecommender {
    inner: Arc<dyn Recommender>,
    max_how_many: Arc<AtomicUsize>,
    recommendations: MemoCache<UserId, Arc<Recommendations>>,
    estimates: MemoCache<(UserId, ItemId), f64>,
    refresh_lock: RefreshLock,
}

impl CachingRecommender {
    /// Wraps `inner`. Both caches are sized to the current user count.
    pub fn new(inner: Arc<dyn Recommender>) -> Result<Self> {
        let capacity = inner.data_model().num_users()?;
        let max_how_many = Arc::new(AtomicUsize::new(1));

        let recommendations = {
            let inner = Arc::clone(&inner);
            let max_how_many = Arc::clone(&max_how_many);
            MemoCache::new(
                capacity,
                move |user: &UserId| -> Result<Arc<Recommendations>> {
                    let how_many = max_how_many.load(Ordering::Acquire);
                    debug!(user = %user, how_many, "retrieving recommendations");
                    Ok(Arc::new(Recommendations {
                        items: inner.recommend(user, how_many)?,
                        exhausted: AtomicBool::new(false),
                    }))
                },
            )
        };
        let estimates = {
            let inner = Arc::clone(&inner);
            MemoCache::new(capacity, move |key: &(UserId, ItemId)| -> Result<f64> {
                debug!(user = %key.0, item = %key.1, "retrieving estimated preference");
                inner.estimate_preference(&key.0, &key.1)
            })
        };

        Ok(Self {
            inner,
            max_how_many,
            recommendations,
            estimates,
            refresh_lock: RefreshLock::new(),
        })
    }

    /// The decorated recommender.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn Recommender> {
        &self.inner
    }

    /// Drops the cached recommendations of `user`.
    pub fn clear_user(&self, user: &UserId) {
        debug!(user = %user, "clearing cached recommendations");
        self.recommendations.remove(user);
    }

    /// Drops every cached recommendation list and estimate.
    pub fn clear(&self) {
        debug!("clearing all cached recommendations and estimates");
        self.recommendations.clear();
        self.estimates.clear();
    }

    /// Counters of the recommendation cache.
    #[must_use]
    pub fn recommendation_stats(&self) -> CacheStats {
        self.recommendations.stats()
    }

    /// Counters of the estimate cache.
    #[must_use]
    pub fn estimate_stats(&self) -> CacheStats {
        self.estimates.stats()
    }
}

impl Recommender for CachingRecommender {
    fn recommend(&self, user: &UserId, how_many: usize) -> Result<Vec<RecommendedItem>> {
        check_how_many(how_many)?;
        self.max_how_many.fetch_max(how_many, Ordering::AcqRel);

        let mut cached = self.recommendations.get(user)?;
        if cached.items.len() < how_many && !cached.exhausted.load(Ordering::Acquire) {
            self.clear_user(user);
            cached = self.recommendations.get(user)?;
            if cached.items.len() < how_many {
                cached.exhausted.store(true, Ordering::Release);
            }
        }
        Ok(cached.items.iter().take(how_many).cloned().collect())
    }

    fn recommend_with_rescorer(
        &self,
        user: &UserId,
        how_many: usize,
        rescorer: &dyn Rescorer<Item>,
    ) -> Result<Vec<RecommendedItem>> {
        if rescorer.is_identity() {
            return self.recommend(user, how_many);
        }
        self.inner.recommend_with_rescorer(user, how_many, rescorer)
    }

    fn estimate_preference(&self, user: &UserId, item: &ItemId) -> Result<f64> {
        self.estimates.get(&(user.clone(), item.clone()))
    }

    fn set_preference(&self, user: &UserId, item: &ItemId, value: f64) -> Result<()> {
        self.inner.set_preference(user, item, value)?;
        self.clear_user(user);
        Ok(())
    }

    fn remove_preference(&self, user: &UserId, item: &ItemId) -> Result<()> {
        self.inner.remove_preference(user, item)?;
        self.clear_user(user);
        Ok(())
    }

    fn data_model(&self) -> &Arc<dyn DataModel> {
        self.inner.data_model()
    }
}

impl Refreshable for CachingRecommender {
    fn refresh(&self) {
        self.refresh_lock.run(|| {
            self.inner.refresh();
            self.clear();
        });
    }
}

impl std::fmt::Debug for CachingRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingRecommender")
            .field("max_how_many", &self.max_how_many.load(Ordering::Relaxed))
            .field("recommendations", &self.recommendations)
            .field("estimates", &self.estimates)
            .finish_non_exhaustive()
    }
}
