//! Accumulated sums for the Pearson product-moment correlation.

/// Raw sums over paired observations.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PairedSums {
    pub count: usize,
    sum_x: f64,
    sum_y: f64,
    sum_x2: f64,
    sum_y2: f64,
    sum_xy: f64,
}

impl PairedSums {
    pub fn add(&mut self, x: f64, y: f64) {
        self.count += 1;
        self.sum_x += x;
        self.sum_y += y;
        self.sum_x2 += x * x;
        self.sum_y2 += y * y;
        self.sum_xy += x * y;
    }

    /// Pearson correlation of the accumulated pairs.
    ///
    /// The centered sums are algebraically equal to summing over
    /// mean-centered series. NaN when empty or when either series has no
    /// variance.
    pub fn correlation(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        let n = self.count as f64;
        let mean_x = self.sum_x / n;
        let mean_y = self.sum_y / n;
        // Grouped so that swapping x and y gives a bit-identical result.
        let centered_xy =
            self.sum_xy - (mean_y * self.sum_x + mean_x * self.sum_y) + n * (mean_x * mean_y);
        let centered_x2 = self.sum_x2 - 2.0 * mean_x * self.sum_x + n * mean_x * mean_x;
        let centered_y2 = self.sum_y2 - 2.0 * mean_y * self.sum_y + n * mean_y * mean_y;

        let denominator = centered_x2.sqrt() * centered_y2.sqrt();
        if denominator == 0.0 {
            return f64::NAN;
        }
        centered_xy / denominator
    }
}

/// Applies evidence weighting and clamps to `[-1, 1]`.
///
/// With `weighted`, `scale = 1 - count / (corpus + 1)` and the result is
/// moved to `1 - scale * (1 - r)` for `r >= 0`, or `-1 + scale * (1 + r)`
/// for `r < 0`. `result` must not be NaN.
pub(crate) fn normalize(result: f64, count: usize, corpus: usize, weighted: bool) -> f64 {
    let mut result = result;
    if weighted {
        let scale = 1.0 - count as f64 / (corpus as f64 + 1.0);
        result = if result < 0.0 {
            -1.0 + scale * (1.0 + result)
        } else {
            1.0 - scale * (1.0 - result)
        };
    }
    result.clamp(-1.0, 1.0)
}
