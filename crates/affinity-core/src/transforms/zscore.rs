//! Per-user z-score normalization.

use std::sync::Arc;

use crate::cache::MemoCache;
use crate::common::{
    FullRunningAverageAndStdDev, Refreshable, RunningAverage, RunningAverageAndStdDev,
};
use crate::error::Result;
use crate::model::{DataModel, Preference, User, UserId};

use super::PreferenceTransform;

#[derive(Debug, Clone, Copy)]
struct UserStats {
    count: usize,
    mean: f64,
    std_dev: f64,
}

impl UserStats {
    fn of(user: &User) -> Self {
        let mut running = FullRunningAverageAndStdDev::new();
        for pref in user.preferences() {
            running.add_datum(pref.value);
        }
        Self {
            count: running.count(),
            mean: running.average(),
            std_dev: running.standard_deviation(),
        }
    }

    fn z(&self, value: f64) -> f64 {
        if self.count > 1 && self.std_dev > 0.0 {
            (value - self.mean) / self.std_dev
        } else {
            0.0
        }
    }
}

/// Replaces each value with its distance from the user's mean, in units of
/// the user's standard deviation.
///
/// Users with fewer than two preferences, or no spread, map to 0.0.
/// Statistics are cached per user id; derived views (rank copies) are
/// measured from their own values instead.
pub struct ZScore {
    stats: MemoCache<UserId, UserStats>,
}

impl ZScore {
    /// Creates the transform over `data_model`, caching one entry per user.
    pub fn new(data_model: Arc<dyn DataModel>) -> Result<Self> {
        let capacity = data_model.num_users()?;
        let stats = MemoCache::new(
            capacity,
            move |user_id: &UserId| -> Result<UserStats> {
                Ok(UserStats::of(&*data_model.user(user_id)?))
            },
        );
        Ok(Self { stats })
    }
}

impl PreferenceTransform for ZScore {
    fn transformed_value(&self, pref: &Preference) -> Result<f64> {
        Ok(self.stats.get(&pref.user_id)?.z(pref.value))
    }

    fn transformed_user_value(&self, user: &User, pref: &Preference) -> Result<f64> {
        if user.is_derived_view() {
            return Ok(UserStats::of(user).z(pref.value));
        }
        self.transformed_value(pref)
    }
}

impl Refreshable for ZScore {
    fn refresh(&self) {
        self.stats.clear();
    }
}
