//! Incrementally maintained averages.
//!
//! Used by the diff-based and average-based recommenders to keep per-item
//! statistics current as preferences are added, removed or changed.

use crate::error::{Error, Result};

/// An average that can be updated one datum at a time.
pub trait RunningAverage {
    /// Adds a datum.
    fn add_datum(&mut self, datum: f64);

    /// Removes a datum previously added.
    ///
    /// Fails with `InvalidState` when nothing has been added.
    fn remove_datum(&mut self, datum: f64) -> Result<()>;

    /// Shifts one existing datum by `delta`.
    fn change_datum(&mut self, delta: f64) -> Result<()>;

    /// Number of data currently averaged.
    fn count(&self) -> usize;

    /// Current average, NaN when empty.
    fn average(&self) -> f64;
}

/// A running average that also tracks the sample standard deviation.
pub trait RunningAverageAndStdDev: RunningAverage {
    /// Sample standard deviation, NaN with fewer than two data.
    fn standard_deviation(&self) -> f64;
}

/// Exact running average over `f64` data.
#[derive(Debug, Clone)]
pub struct FullRunningAverage {
    count: usize,
    average: f64,
}

impl Default for FullRunningAverage {
    fn default() -> Self {
        Self {
            count: 0,
            average: f64::NAN,
        }
    }
}

impl FullRunningAverage {
    /// Creates an empty average.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunningAverage for FullRunningAverage {
    fn add_datum(&mut self, datum: f64) {
        self.count += 1;
        if self.count == 1 {
            self.average = datum;
        } else {
            let n = self.count as f64;
            self.average = self.average * ((n - 1.0) / n) + datum / n;
        }
    }

    fn remove_datum(&mut self, datum: f64) -> Result<()> {
        if self.count == 0 {
            return Err(Error::InvalidState(
                "cannot remove a datum from an empty average".into(),
            ));
        }
        self.count -= 1;
        if self.count == 0 {
            self.average = f64::NAN;
        } else {
            let n = self.count as f64;
            self.average = self.average * ((n + 1.0) / n) - datum / n;
        }
        Ok(())
    }

    fn change_datum(&mut self, delta: f64) -> Result<()> {
        if self.count == 0 {
            return Err(Error::InvalidState(
                "cannot change a datum of an empty average".into(),
            ));
        }
        self.average += delta / self.count as f64;
        Ok(())
    }

    fn count(&self) -> usize {
        self.count
    }

    fn average(&self) -> f64 {
        self.average
    }
}

/// Running average plus sample standard deviation.
///
/// `change_datum` is not supported: the sum of squares cannot be updated
/// from a delta alone.
#[derive(Debug, Clone)]
pub struct FullRunningAverageAndStdDev {
    inner: FullRunningAverage,
    sum_x2: f64,
    std_dev: f64,
}

impl Default for FullRunningAverageAndStdDev {
    fn default() -> Self {
        Self {
            inner: FullRunningAverage::default(),
            sum_x2: 0.0,
            std_dev: f64::NAN,
        }
    }
}

impl FullRunningAverageAndStdDev {
    /// Creates an empty average.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn recompute_std_dev(&mut self) {
        let count = self.inner.count();
        if count > 1 {
            let n = count as f64;
            let average = self.inner.average();
            let variance = (self.sum_x2 - average * average * n) / (n - 1.0);
            self.std_dev = variance.max(0.0).sqrt();
        } else {
            self.std_dev = f64::NAN;
        }
    }
}

impl RunningAverage for FullRunningAverageAndStdDev {
    fn add_datum(&mut self, datum: f64) {
        self.inner.add_datum(datum);
        self.sum_x2 += datum * datum;
        self.recompute_std_dev();
    }

    fn remove_datum(&mut self, datum: f64) -> Result<()> {
        self.inner.remove_datum(datum)?;
        self.sum_x2 -= datum * datum;
        self.recompute_std_dev();
        Ok(())
    }

    fn change_datum(&mut self, _delta: f64) -> Result<()> {
        Err(Error::Unsupported(
            "change_datum on a running average with standard deviation".into(),
        ))
    }

    fn count(&self) -> usize {
        self.inner.count()
    }

    fn average(&self) -> f64 {
        self.inner.average()
    }
}

impl RunningAverageAndStdDev for FullRunningAverageAndStdDev {
    fn standard_deviation(&self) -> f64 {
        self.std_dev
    }
}

/// Running average where each datum carries a weight.
///
/// The unweighted `RunningAverage` methods use a weight of 1.0.
#[derive(Debug, Clone)]
pub struct WeightedRunningAverage {
    total_weight: f64,
    average: f64,
}

impl Default for WeightedRunningAverage {
    fn default() -> Self {
        Self {
            total_weight: 0.0,
            average: f64::NAN,
        }
    }
}

impl WeightedRunningAverage {
    /// Creates an empty average.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `datum` with the given non-negative `weight`.
    pub fn add_weighted_datum(&mut self, datum: f64, weight: f64) {
        let old_total = self.total_weight;
        self.total_weight += weight;
        if old_total <= 0.0 {
            self.average = datum;
        } else {
            self.average = (self.average * old_total + datum * weight) / self.total_weight;
        }
    }

    /// Removes `datum` previously added with `weight`.
    pub fn remove_weighted_datum(&mut self, datum: f64, weight: f64) -> Result<()> {
        if self.total_weight <= 0.0 {
            return Err(Error::InvalidState(
                "cannot remove a datum from an empty average".into(),
            ));
        }
        let old_total = self.total_weight;
        self.total_weight -= weight;
        if self.total_weight <= 0.0 {
            self.total_weight = 0.0;
            self.average = f64::NAN;
        } else {
            self.average = (self.average * old_total - datum * weight) / self.total_weight;
        }
        Ok(())
    }

    /// Shifts a datum of the given `weight` by `delta`.
    pub fn change_weighted_datum(&mut self, delta: f64, weight: f64) -> Result<()> {
        if weight > self.total_weight {
            return Err(Error::invalid(format!(
                "weight {weight} exceeds total weight {}",
                self.total_weight
            )));
        }
        self.average += delta * weight / self.total_weight;
        Ok(())
    }

    /// Sum of the weights currently averaged.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }
}

impl RunningAverage for WeightedRunningAverage {
    fn add_datum(&mut self, datum: f64) {
        self.add_weighted_datum(datum, 1.0);
    }

    fn remove_datum(&mut self, datum: f64) -> Result<()> {
        self.remove_weighted_datum(datum, 1.0)
    }

    fn change_datum(&mut self, delta: f64) -> Result<()> {
        self.change_weighted_datum(delta, 1.0)
    }

    fn count(&self) -> usize {
        self.total_weight as usize
    }

    fn average(&self) -> f64 {
        self.average
    }
}
