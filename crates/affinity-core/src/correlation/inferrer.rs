//! Preference inference from a user's average.

use std::sync::Arc;

use crate::cache::MemoCache;
use crate::common::{FullRunningAverage, Refreshable, RunningAverage};
use crate::error::Result;
use crate::model::{DataModel, ItemId, User, UserId};

use super::PreferenceInferrer;

/// Infers a missing preference as the user's mean preference value.
///
/// Users with no preferences infer 0.0. Means are cached per user id and
/// dropped on refresh. Derived views (rank copies) are averaged as given and
/// never cached, since their values differ from the stored user's.
pub struct AveragingPreferenceInferrer {
    averages: MemoCache<UserId, f64>,
}

impl AveragingPreferenceInferrer {
    /// Creates an inferrer reading users from `data_model`.
    pub fn new(data_model: Arc<dyn DataModel>) -> Result<Self> {
        let capacity = data_model.num_users()?;
        let averages = MemoCache::new(capacity, move |user_id: &UserId| -> Result<f64> {
            Ok(average_preference(&*data_model.user(user_id)?))
        });
        Ok(Self { averages })
    }
}

fn average_preference(user: &User) -> f64 {
    if user.preferences().is_empty() {
        return 0.0;
    }
    let mut average = FullRunningAverage::new();
    for pref in user.preferences() {
        average.add_datum(pref.value);
    }
    average.average()
}

impl PreferenceInferrer for AveragingPreferenceInferrer {
    fn infer_preference(&self, user: &User, _item: &ItemId) -> Result<f64> {
        if user.is_derived_view() {
            return Ok(average_preference(user));
        }
        match self.averages.get(user.id()) {
            // Users outside the model are averaged as given.
            Err(err) if err.is_not_found() => Ok(average_preference(user)),
            other => other,
        }
    }
}

impl Refreshable for AveragingPreferenceInferrer {
    fn refresh(&self) {
        self.averages.clear();
    }
}
