//! User neighborhoods: the peers whose tastes drive user-based estimates.
//!
//! Both strategies scan every user other than the target, optionally
//! sampling a fraction of them, and drop peers whose correlation is NaN.
//! Results are memoized per user until the next refresh.

mod nearest_n;
mod threshold;


use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub use nearest_n::NearestNUserNeighborhood;
pub use threshold::ThresholdUserNeighborhood;

use crate::cache::MemoCache;
use crate::common::Refreshable;
use crate::correlation::UserCorrelation;
use crate::error::{Error, Result};
use crate::model::{DataModel, User, UserId};

/// Computes the neighborhood of a user.
pub trait UserNeighborhood: Refreshable + Send + Sync {
    /// Users most like `user`, never including `user` itself.
    fn user_neighborhood(&self, user: &UserId) -> Result<Arc<[Arc<User>]>>;
}

/// Neighborhood of one user.
pub type Neighbors = Arc<[Arc<User>]>;

/// Bernoulli filter over candidate peers.
#[derive(Debug)]
pub(crate) struct Sampler {
    rate: f64,
    rng: Mutex<StdRng>,
}

impl Sampler {
    pub(crate) fn new(rate: f64, seed: Option<u64>) -> Result<Self> {
        if rate.is_nan() || rate <= 0.0 || rate > 1.0 {
            return Err(Error::invalid(format!(
                "sampling rate must be in (0, 1], got {rate}"
            )));
        }
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Ok(Self {
            rate,
            rng: Mutex::new(rng),
        })
    }

    pub(crate) fn rate(&self) -> f64 {
        self.rate
    }

    /// Whether the next candidate should be considered.
    pub(crate) fn sample(&self) -> bool {
        self.rate >= 1.0 || self.rng.lock().gen::<f64>() < self.rate
    }
}

/// Collaborators shared by every neighborhood strategy.
pub(crate) struct Scan {
    pub(crate) correlation: Arc<dyn UserCorrelation>,
    pub(crate) data_model: Arc<dyn DataModel>,
    pub(crate) sampler: Sampler,
}

impl Scan {
    /// Visits each sampled peer of `target` with a non-NaN correlation.
    pub(crate) fn for_each_peer<F>(&self, target: &UserId, mut visit: F) -> Result<()>
    where
        F: FnMut(Arc<User>, f64),
    {
        let target = self.data_model.user(target)?;
        for candidate in self.data_model.users()?.iter() {
            if candidate.id() == target.id() || !self.sampler.sample() {
                continue;
            }
            let correlation = self.correlation.user_correlation(&target, candidate)?;
            if !correlation.is_nan() {
                visit(Arc::clone(candidate), correlation);
            }
        }
        Ok(())
    }

    pub(crate) fn refresh(&self) {
        self.correlation.refresh();
        self.data_model.refresh();
    }
}

/// Memo cache of neighborhoods, sized to the current user count.
pub(crate) fn neighborhood_cache<F>(
    scan: &Arc<Scan>,
    compute: F,
) -> Result<MemoCache<UserId, Neighbors>>
where
    F: Fn(&Scan, &UserId) -> Result<Neighbors> + Send + Sync + 'static,
{
    let capacity = scan.data_model.num_users()?;
    let scan = Arc::clone(scan);
    Ok(MemoCache::new(
        capacity,
        move |user: &UserId| -> Result<Neighbors> { compute(&scan, user) },
    ))
}
