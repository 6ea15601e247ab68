//! Fixed-size neighborhood of the most correlated peers.

use std::sync::Arc;

use tracing::info;

use super::{neighborhood_cache, Neighbors, Sampler, Scan, UserNeighborhood};
use crate::cache::MemoCache;
use crate::common::Refreshable;
use crate::correlation::UserCorrelation;
use crate::error::{Error, Result};
use crate::model::{DataModel, UserId};
use crate::top_items::TopK;

/// The `n` peers with the highest correlation to the target user.
pub struct NearestNUserNeighborhood {
    n: usize,
    scan: Arc<Scan>,
    cache: MemoCache<UserId, Neighbors>,
}

impl NearestNUserNeighborhood {
    /// Considers every peer.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `n` is zero.
    pub fn new(
        n: usize,
        correlation: Arc<dyn UserCorrelation>,
        data_model: Arc<dyn DataModel>,
    ) -> Result<Self> {
        Self::with_sampling(n, correlation, data_model, 1.0, None)
    }

    /// Considers each peer with probability `sampling_rate`.
    ///
    /// A `seed` makes the sampling reproducible.
    pub fn with_sampling(
        n: usize,
        correlation: Arc<dyn UserCorrelation>,
        data_model: Arc<dyn DataModel>,
        sampling_rate: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        if n == 0 {
            return Err(Error::invalid("neighborhood size must be at least 1"));
        }
        let scan = Arc::new(Scan {
            correlation,
            data_model,
            sampler: Sampler::new(sampling_rate, seed)?,
        });
        let cache = neighborhood_cache(&scan, move |scan, user| nearest(scan, n, user))?;
        Ok(Self { n, scan, cache })
    }

    /// Maximum neighborhood size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Fraction of peers considered.
    #[must_use]
    pub fn sampling_rate(&self) -> f64 {
        self.scan.sampler.rate()
    }
}

fn nearest(scan: &Scan, n: usize, user: &UserId) -> Result<Neighbors> {
    info!(user = %user, n, "computing nearest-n neighborhood");
    let mut top = TopK::new(n);
    scan.for_each_peer(user, |peer, correlation| {
        top.offer(peer, correlation);
    })?;
    Ok(top.into_sorted_vec().into_iter().map(|(peer, _)| peer).collect())
}

impl UserNeighborhood for NearestNUserNeighborhood {
    fn user_neighborhood(&self, user: &UserId) -> Result<Neighbors> {
        self.cache.get(user)
    }
}

impl Refreshable for NearestNUserNeighborhood {
    fn refresh(&self) {
        self.scan.refresh();
        self.cache.clear();
    }
}

impl std::fmt::Debug for NearestNUserNeighborhood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearestNUserNeighborhood")
            .field("n", &self.n)
            .field("sampling_rate", &self.scan.sampler.rate())
            .finish_non_exhaustive()
    }
}
