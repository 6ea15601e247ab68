//! Lazily built per-item, per-user and overall preference averages.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::common::{FullRunningAverage, RunningAverage};
use crate::error::Result;
use crate::model::{DataModel, ItemId, UserId};

#[derive(Debug, Default)]
pub(crate) struct AverageIndex {
    items: FxHashMap<ItemId, FullRunningAverage>,
    users: FxHashMap<UserId, FullRunningAverage>,
    overall: FullRunningAverage,
}

fn average_of<K: std::hash::Hash + Eq>(map: &FxHashMap<K, FullRunningAverage>, key: &K) -> f64 {
    map.get(key).map_or(f64::NAN, RunningAverage::average)
}

impl AverageIndex {
    fn build(data_model: &dyn DataModel) -> Result<Self> {
        let mut index = Self::default();
        for user in data_model.users()?.iter() {
            for pref in user.preferences() {
                index.add(user.id(), &pref.item_id, pref.value);
            }
        }
        info!(items = index.items.len(), users = index.users.len(), "built preference averages");
        Ok(index)
    }

    fn add(&mut self, user: &UserId, item: &ItemId, value: f64) {
        self.items.entry(item.clone()).or_default().add_datum(value);
        self.users.entry(user.clone()).or_default().add_datum(value);
        self.overall.add_datum(value);
    }

    fn change(&mut self, user: &UserId, item: &ItemId, delta: f64) -> Result<()> {
        for average in [
            self.items.entry(item.clone()).or_default(),
            self.users.entry(user.clone()).or_default(),
        ] {
            average.change_datum(delta)?;
        }
        self.overall.change_datum(delta)
    }

    fn remove(&mut self, user: &UserId, item: &ItemId, value: f64) -> Result<()> {
        for average in [
            self.items.entry(item.clone()).or_default(),
            self.users.entry(user.clone()).or_default(),
        ] {
            average.remove_datum(value)?;
        }
        self.overall.remove_datum(value)
    }

    pub(crate) fn item_average(&self, item: &ItemId) -> f64 {
        average_of(&self.items, item)
    }

    pub(crate) fn user_average(&self, user: &UserId) -> f64 {
        average_of(&self.users, user)
    }

    pub(crate) fn overall_average(&self) -> f64 {
        self.overall.average()
    }
}

/// Averages built on first use, kept current through writes made via
/// the owning recommender and rebuilt on refresh.
pub(crate) struct LazyAverages {
    data_model: Arc<dyn DataModel>,
    index: RwLock<Option<AverageIndex>>,
}

impl LazyAverages {
    pub(crate) fn new(data_model: Arc<dyn DataModel>) -> Self {
        Self {
            data_model,
            index: RwLock::new(None),
        }
    }

    pub(crate) fn data_model(&self) -> &Arc<dyn DataModel> {
        &self.data_model
    }

    /// Runs `f` against the index, building it first if needed.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&AverageIndex) -> R) -> Result<R> {
        if let Some(index) = self.index.read().as_ref() {
            return Ok(f(index));
        }
        let mut guard = self.index.write();
        let index = match guard.take() {
            Some(index) => index,
            None => AverageIndex::build(self.data_model.as_ref())?,
        };
        Ok(f(guard.insert(index)))
    }

    /// Writes a preference through to the data model and folds it into
    /// the index.
    pub(crate) fn set_preference(&self, user: &UserId, item: &ItemId, value: f64) -> Result<()> {
        let old = match self.data_model.preference_value(user, item) {
            Ok(old) => old,
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };
        self.data_model.set_preference(user, item, value)?;
        self.update(|index| match old {
            Some(old) => index.change(user, item, value - old),
            None => {
                index.add(user, item, value);
                Ok(())
            }
        });
        Ok(())
    }

    /// Removes a preference from the data model and from the index.
    pub(crate) fn remove_preference(&self, user: &UserId, item: &ItemId) -> Result<()> {
        let old = self.data_model.preference_value(user, item)?;
        self.data_model.remove_preference(user, item)?;
        if let Some(old) = old {
            self.update(|index| index.remove(user, item, old));
        }
        Ok(())
    }

    /// Applies an incremental update to a built index. A failed update
    /// discards the index so the next read rebuilds it.
    fn update(&self, f: impl FnOnce(&mut AverageIndex) -> Result<()>) {
        let mut guard = self.index.write();
        if let Some(index) = guard.as_mut() {
            if let Err(err) = f(index) {
                warn!(error = %err, "preference averages out of sync, rebuilding lazily");
                *guard = None;
            }
        }
    }

    /// Rebuilds the index from the data model.
    pub(crate) fn rebuild(&self) {
        let rebuilt = AverageIndex::build(self.data_model.as_ref());
        let mut guard = self.index.write();
        match rebuilt {
            Ok(index) => *guard = Some(index),
            Err(err) => {
                warn!(error = %err, "failed to rebuild preference averages");
                *guard = None;
            }
        }
    }
}
