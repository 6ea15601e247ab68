//! Precomputed item-item correlation table.

use rustc_hash::FxHashMap;
use tracing::info;

use super::ItemCorrelation;
use crate::common::Refreshable;
use crate::error::{Error, Result};
use crate::model::{DataModel, ItemId};

/// One precomputed correlation between two items.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemItemCorrelation {
    /// First item.
    pub item1: ItemId,
    /// Second item.
    pub item2: ItemId,
    /// Correlation in `[-1, 1]`.
    pub value: f64,
}

impl ItemItemCorrelation {
    /// Creates a correlation entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `value` is NaN or outside `[-1, 1]`.
    pub fn new(item1: impl Into<ItemId>, item2: impl Into<ItemId>, value: f64) -> Result<Self> {
        if value.is_nan() || !(-1.0..=1.0).contains(&value) {
            return Err(Error::invalid(format!("illegal correlation value: {value}")));
        }
        Ok(Self {
            item1: item1.into(),
            item2: item2.into(),
            value,
        })
    }
}

/// Item correlation answered from a fixed table.
///
/// Pairs are order-insensitive. An item always correlates 1.0 with itself
/// and an unknown pair is NaN. The table never changes, so refresh is a
/// no-op.
#[derive(Debug, Default, Clone)]
pub struct GenericItemCorrelation {
    table: FxHashMap<(ItemId, ItemId), f64>,
}

fn ordered(a: &ItemId, b: &ItemId) -> (ItemId, ItemId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

impl GenericItemCorrelation {
    /// Builds the table from explicit entries. Later entries for the same
    /// pair override earlier ones; self-pairs are ignored.
    pub fn new(correlations: impl IntoIterator<Item = ItemItemCorrelation>) -> Self {
        let mut table = FxHashMap::default();
        for entry in correlations {
            if entry.item1 != entry.item2 {
                table.insert(ordered(&entry.item1, &entry.item2), entry.value);
            }
        }
        Self { table }
    }

    /// Builds the table by evaluating `other` over every item pair of
    /// `data_model`. NaN correlations are left out.
    pub fn from_correlation(other: &dyn ItemCorrelation, data_model: &dyn DataModel) -> Result<Self> {
        let items = data_model.items()?;
        let ids: Vec<ItemId> = items.iter().map(|item| item.id().clone()).collect();
        info!(items = ids.len(), "precomputing item-item correlations");

        let row = |i: usize| -> Result<Vec<((ItemId, ItemId), f64)>> {
            let mut out = Vec::new();
            for j in (i + 1)..ids.len() {
                let value = other.item_correlation(&ids[i], &ids[j])?;
                if !value.is_nan() {
                    out.push(((ids[i].clone(), ids[j].clone()), value));
                }
            }
            Ok(out)
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<_> = {
            use rayon::prelude::*;
            (0..ids.len()).into_par_iter().map(row).collect::<Result<_>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let rows: Vec<_> = (0..ids.len()).map(row).collect::<Result<_>>()?;

        let table: FxHashMap<_, _> = rows.into_iter().flatten().collect();
        info!(pairs = table.len(), "item-item correlations ready");
        Ok(Self { table })
    }

    /// Number of stored pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no pairs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Every stored pair, in no particular order.
    pub fn correlations(&self) -> impl Iterator<Item = ItemItemCorrelation> + '_ {
        self.table
            .iter()
            .map(|((item1, item2), &value)| ItemItemCorrelation {
                item1: item1.clone(),
                item2: item2.clone(),
                value,
            })
    }
}

impl ItemCorrelation for GenericItemCorrelation {
    fn item_correlation(&self, a: &ItemId, b: &ItemId) -> Result<f64> {
        if a == b {
            return Ok(1.0);
        }
        Ok(self.table.get(&ordered(a, b)).copied().unwrap_or(f64::NAN))
    }
}

impl Refreshable for GenericItemCorrelation {
    fn refresh(&self) {}
}
