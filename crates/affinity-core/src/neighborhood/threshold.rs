//! Neighborhood of every peer correlated at least as strongly as a threshold.

use std::sync::Arc;

use tracing::info;

use super::{neighborhood_cache, Neighbors, Sampler, Scan, UserNeighborhood};
use crate::cache::MemoCache;
use crate::common::Refreshable;
use crate::correlation::UserCorrelation;
use crate::error::{Error, Result};
use crate::model::{DataModel, UserId};

/// Every peer whose correlation to the target is `>= threshold`.
pub struct ThresholdUserNeighborhood {
    threshold: f64,
    scan: Arc<Scan>,
    cache: MemoCache<UserId, Neighbors>,
}

impl ThresholdUserNeighborhood {
    /// Considers every peer.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `threshold` is NaN.
    pub fn new(
        threshold: f64,
        correlation: Arc<dyn UserCorrelation>,
        data_model: Arc<dyn DataModel>,
    ) -> Result<Self> {
        Self::with_sampling(threshold, correlation, data_model, 1.0, None)
    }

    /// Considers each peer with probability `sampling_rate`.
    pub fn with_sampling(
        threshold: f64,
        correlation: Arc<dyn UserCorrelation>,
        data_model: Arc<dyn DataModel>,
        sampling_rate: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        if threshold.is_nan() {
            return Err(Error::invalid("neighborhood threshold must not be NaN"));
        }
        let scan = Arc::new(Scan {
            correlation,
            data_model,
            sampler: Sampler::new(sampling_rate, seed)?,
        });
        let cache = neighborhood_cache(&scan, move |scan, user| {
            info!(user = %user, threshold, "computing threshold neighborhood");
            let mut peers = Vec::new();
            scan.for_each_peer(user, |peer, correlation| {
                if correlation >= threshold {
                    peers.push(peer);
                }
            })?;
            Ok(peers.into())
        })?;
        Ok(Self {
            threshold,
            scan,
            cache,
        })
    }

    /// Minimum correlation for membership.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl UserNeighborhood for ThresholdUserNeighborhood {
    fn user_neighborhood(&self, user: &UserId) -> Result<Neighbors> {
        self.cache.get(user)
    }
}

impl Refreshable for ThresholdUserNeighborhood {
    fn refresh(&self) {
        self.scan.refresh();
        self.cache.clear();
    }
}

impl std::fmt::Debug for ThresholdUserNeighborhood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThresholdUserNeighborhood")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
