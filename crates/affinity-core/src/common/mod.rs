//! Shared building blocks: refresh plumbing and running statistics.

mod refresh;
mod running_average;


pub use refresh::{RefreshLock, Refreshable};
pub use running_average::{
    FullRunningAverage, FullRunningAverageAndStdDev, RunningAverage, RunningAverageAndStdDev,
    WeightedRunningAverage,
};
