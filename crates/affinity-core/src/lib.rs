//! # `Affinity` Core
//!
//! Collaborative-filtering recommendation engine written in Rust.
//!
//! `Affinity` estimates how much a user would like items they have not rated
//! and ranks the best of them, using only a graph of users, items and
//! numeric preferences.
//!
//! ## Features
//!
//! - **Correlation engine**: Pearson and Spearman, optional evidence
//!   weighting, preference inference and value transforms
//! - **Neighborhoods**: nearest-N and threshold, with optional sampling
//! - **Recommenders**: user-based, item-based, slope-one and average
//!   baselines, all with rescoring hooks
//! - **Caching**: a memoizing decorator over any recommender, backed by a
//!   bounded LRU map
//! - **Live updates**: preference writes and single-flight refreshes that
//!   never leave readers with a half-built index
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use affinity_core::{build_recommender, AffinityConfig, GenericDataModel, UserId};
//!
//! let model = GenericDataModel::from_preferences(triples)?;
//! let recommender = build_recommender(&AffinityConfig::default(), Arc::new(model))?;
//!
//! for item in recommender.recommend(&UserId::from("alice"), 10)? {
//!     println!("{item}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// =============================================================================
// NUMERIC CAST LINTS
// =============================================================================
// Counts become f64 for averaging and weighting throughout.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
// =============================================================================
// STYLISTIC LINTS - Safe to allow globally (no bug risk)
// =============================================================================
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::float_cmp)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::must_use_candidate)]

pub mod builder;
pub mod cache;
pub mod common;
pub mod config;
pub mod correlation;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod model;
pub mod neighborhood;
pub mod recommender;
#[cfg(test)]
mod test_fixtures;
pub mod top_items;
pub mod transforms;

pub use builder::{build_item_based, build_recommender, build_user_based};
pub use cache::{CacheStats, LruMap, MemoCache, Retriever};
pub use common::{
    FullRunningAverage, FullRunningAverageAndStdDev, RefreshLock, Refreshable, RunningAverage,
    RunningAverageAndStdDev, WeightedRunningAverage,
};
pub use config::{AffinityConfig, ConfigError};
pub use correlation::{
    AveragingPreferenceInferrer, GenericItemCorrelation, ItemCorrelation, ItemItemCorrelation,
    PearsonCorrelation, PreferenceInferrer, SpearmanCorrelation, UserCorrelation,
};
pub use error::{Error, Result};
pub use model::{
    DataModel, FileDataModel, GenericDataModel, Item, ItemId, Preference, User, UserId,
};
pub use neighborhood::{NearestNUserNeighborhood, ThresholdUserNeighborhood, UserNeighborhood};
pub use recommender::slope_one::{DiffStat, DiffStorage, MemoryDiffStorage, PreferenceChange};
pub use recommender::{
    CachingRecommender, Estimator, GenericItemBasedRecommender, GenericUserBasedRecommender,
    ItemAverageRecommender, ItemBasedRecommender, ItemPair, ItemUserAverageRecommender,
    NullRescorer, RecommendedItem, Recommender, Rescorer, SimilarUser, SlopeOneRecommender,
    UserBasedRecommender, UserPair,
};
pub use top_items::{top_item_item_correlations, top_items, top_users, TopK};
pub use transforms::{
    CaseAmplification, CorrelationTransform, InverseUserFrequency, PreferenceTransform, ZScore,
};
