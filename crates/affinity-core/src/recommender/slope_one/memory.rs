//! In-memory diff storage.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use super::{DiffStat, DiffStorage, PreferenceChange};
use crate::common::{
    FullRunningAverage, FullRunningAverageAndStdDev, RefreshLock, Refreshable, RunningAverage,
    RunningAverageAndStdDev,
};
use crate::error::{Error, Result};
use crate::model::{DataModel, Item, ItemId, Preference, User, UserId};
use crate::recommender::unrated_items;

/// Running statistic behind one diff or item average.
#[derive(Debug, Clone)]
enum DiffAverage {
    Plain(FullRunningAverage),
    WithStdDev(FullRunningAverageAndStdDev),
}

impl DiffAverage {
    fn new(std_dev: bool) -> Self {
        if std_dev {
            Self::WithStdDev(FullRunningAverageAndStdDev::new())
        } else {
            Self::Plain(FullRunningAverage::new())
        }
    }

    fn as_running(&mut self) -> &mut dyn RunningAverage {
        match self {
            Self::Plain(avg) => avg as &mut dyn RunningAverage,
            Self::WithStdDev(avg) => avg as &mut dyn RunningAverage,
        }
    }

    fn stat(&self) -> DiffStat {
        match self {
            Self::Plain(avg) => DiffStat {
                average: avg.average(),
                count: avg.count(),
                std_dev: f64::NAN,
            },
            Self::WithStdDev(avg) => DiffStat {
                average: avg.average(),
                count: avg.count(),
                std_dev: avg.standard_deviation(),
            },
        }
    }
}

/// Diffs keyed by `(first, second)` with `first < second`; each holds the
/// average of `pref(second) - pref(first)`.
#[derive(Debug, Default)]
struct DiffTable {
    diffs: FxHashMap<ItemId, FxHashMap<ItemId, DiffAverage>>,
    item_averages: FxHashMap<ItemId, DiffAverage>,
    entries: usize,
}

impl DiffTable {
    fn stat(&self, from: &ItemId, to: &ItemId) -> Option<DiffStat> {
        if from == to {
            return None;
        }
        if from < to {
            self.diffs.get(from)?.get(to).map(DiffAverage::stat)
        } else {
            let stat = self.diffs.get(to)?.get(from)?.stat();
            Some(DiffStat {
                average: -stat.average,
                ..stat
            })
        }
    }

    /// Slot for the ordered pair, created while under `max_entries`.
    fn slot(
        &mut self,
        first: &ItemId,
        second: &ItemId,
        std_dev: bool,
        max_entries: usize,
    ) -> Option<&mut DiffAverage> {
        let row = self.diffs.entry(first.clone()).or_default();
        if !row.contains_key(second) {
            if self.entries >= max_entries {
                return None;
            }
            self.entries += 1;
            row.insert(second.clone(), DiffAverage::new(std_dev));
        }
        row.get_mut(second)
    }
}

/// Keeps every diff and item average in memory.
///
/// The table is built eagerly on construction and rebuilt on refresh. At
/// most `max_entries` item pairs are tracked; pairs seen after the limit is
/// reached are ignored. After a build, pairs whose average magnitude is
/// below `1 / num_items^3` are dropped.
pub struct MemoryDiffStorage {
    data_model: Arc<dyn DataModel>,
    std_dev: bool,
    max_entries: usize,
    table: RwLock<DiffTable>,
    refresh_lock: RefreshLock,
}

impl MemoryDiffStorage {
    /// Builds the diff table for `data_model`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `max_entries` is zero, or any error from the
    /// data model.
    pub fn new(data_model: Arc<dyn DataModel>, std_dev: bool, max_entries: usize) -> Result<Self> {
        if max_entries == 0 {
            return Err(Error::invalid("max_entries must be positive"));
        }
        let table = build(data_model.as_ref(), std_dev, max_entries)?;
        Ok(Self {
            data_model,
            std_dev,
            max_entries,
            table: RwLock::new(table),
            refresh_lock: RefreshLock::new(),
        })
    }

    /// Number of tracked item pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().entries
    }

    /// Whether no item pair is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply(&self, user_prefs: &[Preference], item: &ItemId, change: PreferenceChange) -> Result<()> {
        let mut table = self.table.write();
        for other in user_prefs.iter().filter(|pref| &pref.item_id != item) {
            let (first, second, sign) = if item < &other.item_id {
                (item, &other.item_id, -1.0)
            } else {
                (&other.item_id, item, 1.0)
            };
            // Stored datum is pref(second) - pref(first).
            let datum = |value: f64| sign * (value - other.value);
            match change {
                PreferenceChange::Set { old: Some(old), value } => {
                    if let Some(avg) = table.diffs.get_mut(first).and_then(|row| row.get_mut(second)) {
                        avg.as_running().change_datum(sign * (value - old))?;
                    }
                }
                PreferenceChange::Set { old: None, value } => {
                    if let Some(avg) = table.slot(first, second, self.std_dev, self.max_entries) {
                        avg.as_running().add_datum(datum(value));
                    }
                }
                PreferenceChange::Remove { old } => {
                    let Some(row) = table.diffs.get_mut(first) else {
                        continue;
                    };
                    let Some(avg) = row.get_mut(second) else {
                        continue;
                    };
                    avg.as_running().remove_datum(datum(old))?;
                    if avg.as_running().count() == 0 {
                        row.remove(second);
                        table.entries -= 1;
                    }
                }
            }
        }

        let std_dev = self.std_dev;
        let average = table
            .item_averages
            .entry(item.clone())
            .or_insert_with(|| DiffAverage::new(std_dev))
            .as_running();
        match change {
            PreferenceChange::Set { old: Some(old), value } => average.change_datum(value - old),
            PreferenceChange::Set { old: None, value } => {
                average.add_datum(value);
                Ok(())
            }
            PreferenceChange::Remove { old } => average.remove_datum(old),
        }
    }
}

fn build(data_model: &dyn DataModel, std_dev: bool, max_entries: usize) -> Result<DiffTable> {
    info!("building average diffs");
    let mut table = DiffTable::default();
    for user in data_model.users()?.iter() {
        debug!(user = %user.id(), "processing preferences");
        let prefs = user.preferences();
        for (i, a) in prefs.iter().enumerate() {
            for b in &prefs[i + 1..] {
                if let Some(avg) = table.slot(&a.item_id, &b.item_id, std_dev, max_entries) {
                    avg.as_running().add_datum(b.value - a.value);
                }
            }
            table
                .item_averages
                .entry(a.item_id.clone())
                .or_insert_with(|| DiffAverage::new(std_dev))
                .as_running()
                .add_datum(a.value);
        }
    }

    let num_items = data_model.num_items()? as f64;
    if num_items > 0.0 {
        let threshold = 1.0 / (num_items * num_items * num_items);
        let mut pruned = 0;
        for row in table.diffs.values_mut() {
            let before = row.len();
            row.retain(|_, avg| avg.stat().average.abs() >= threshold);
            pruned += before - row.len();
        }
        table.diffs.retain(|_, row| !row.is_empty());
        table.entries -= pruned;
    }
    info!(pairs = table.entries, "average diffs ready");
    Ok(table)
}

impl DiffStorage for MemoryDiffStorage {
    fn diff(&self, from: &ItemId, to: &ItemId) -> Option<DiffStat> {
        self.table.read().stat(from, to)
    }

    fn diffs(&self, user: &User, item: &ItemId) -> Vec<Option<DiffStat>> {
        let table = self.table.read();
        user.preferences()
            .iter()
            .map(|pref| table.stat(&pref.item_id, item))
            .collect()
    }

    fn average_item_pref(&self, item: &ItemId) -> Option<f64> {
        self.table
            .read()
            .item_averages
            .get(item)
            .map(|avg| avg.stat().average)
            .filter(|average| !average.is_nan())
    }

    fn update_item_pref(
        &self,
        user_prefs: &[Preference],
        item: &ItemId,
        change: PreferenceChange,
    ) -> Result<()> {
        if self.std_dev && matches!(change, PreferenceChange::Set { .. }) {
            return Err(Error::Unsupported(
                "setting preferences when standard deviation is tracked".into(),
            ));
        }
        if let Err(err) = self.apply(user_prefs, item, change) {
            warn!(error = %err, item = %item, "diff update failed, rebuilding");
            *self.table.write() = build(self.data_model.as_ref(), self.std_dev, self.max_entries)?;
        }
        Ok(())
    }

    fn recommendable_items(&self, user: &UserId) -> Result<Vec<Arc<Item>>> {
        let user = self.data_model.user(user)?;
        unrated_items(&user, self.data_model.as_ref())
    }
}

impl Refreshable for MemoryDiffStorage {
    fn refresh(&self) {
        self.refresh_lock.run(|| {
            self.data_model.refresh();
            match build(self.data_model.as_ref(), self.std_dev, self.max_entries) {
                Ok(table) => *self.table.write() = table,
                Err(err) => warn!(error = %err, "failed to rebuild average diffs"),
            }
        });
    }
}

impl std::fmt::Debug for MemoryDiffStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDiffStorage")
            .field("std_dev", &self.std_dev)
            .field("max_entries", &self.max_entries)
            .field("pairs", &self.len())
            .finish_non_exhaustive()
    }
}
