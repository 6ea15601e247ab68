//! Wiring recommenders from an [`AffinityConfig`].

use std::sync::Arc;

use tracing::info;

use crate::config::{
    AffinityConfig, CorrelationConfig, CorrelationMetric, NeighborhoodConfig, NeighborhoodKind,
    RecommenderKind, TransformKind,
};
use crate::correlation::{
    AveragingPreferenceInferrer, GenericItemCorrelation, ItemCorrelation, PearsonCorrelation,
    SpearmanCorrelation, UserCorrelation,
};
use crate::error::Result;
use crate::model::DataModel;
use crate::neighborhood::{NearestNUserNeighborhood, ThresholdUserNeighborhood, UserNeighborhood};
use crate::recommender::slope_one::MemoryDiffStorage;
use crate::recommender::{
    CachingRecommender, GenericItemBasedRecommender, GenericUserBasedRecommender,
    ItemAverageRecommender, ItemUserAverageRecommender, Recommender, SlopeOneRecommender,
};
use crate::transforms::{CaseAmplification, InverseUserFrequency, ZScore};

/// Builds the configured recommender over `data_model`.
///
/// The result is wrapped in a [`CachingRecommender`] when
/// `recommender.cache` is set.
///
/// # Errors
///
/// `Config` when the configuration does not validate, or any construction
/// error from the components.
pub fn build_recommender(
    config: &AffinityConfig,
    data_model: Arc<dyn DataModel>,
) -> Result<Arc<dyn Recommender>> {
    config.validate()?;
    info!(
        kind = ?config.recommender.kind,
        cache = config.recommender.cache,
        "building recommender"
    );

    let recommender: Arc<dyn Recommender> = match config.recommender.kind {
        RecommenderKind::UserBased => build_user_based(config, data_model)?,
        RecommenderKind::ItemBased => build_item_based(config, data_model)?,
        RecommenderKind::SlopeOne => {
            let slope_one = &config.slope_one;
            let storage = MemoryDiffStorage::new(
                Arc::clone(&data_model),
                slope_one.std_dev_weighted,
                slope_one.max_entries.unwrap_or(usize::MAX),
            )?;
            Arc::new(SlopeOneRecommender::with_storage(
                data_model,
                slope_one.weighted,
                slope_one.std_dev_weighted,
                Arc::new(storage),
            )?)
        }
        RecommenderKind::ItemAverage => Arc::new(ItemAverageRecommender::new(data_model)),
        RecommenderKind::ItemUserAverage => Arc::new(ItemUserAverageRecommender::new(data_model)),
    };

    if config.recommender.cache {
        Ok(Arc::new(CachingRecommender::new(recommender)?))
    } else {
        Ok(recommender)
    }
}

/// Builds a user-based recommender from the correlation and neighborhood
/// sections, ignoring `recommender.kind`.
///
/// # Errors
///
/// Same as [`build_recommender`].
pub fn build_user_based(
    config: &AffinityConfig,
    data_model: Arc<dyn DataModel>,
) -> Result<Arc<GenericUserBasedRecommender>> {
    config.validate()?;
    let correlation = user_correlation(&config.correlation, &data_model)?;
    let neighborhood = neighborhood(
        &config.neighborhood,
        Arc::clone(&correlation),
        Arc::clone(&data_model),
    )?;
    Ok(Arc::new(GenericUserBasedRecommender::new(
        data_model,
        neighborhood,
        correlation,
    )))
}

/// Builds an item-based recommender from the correlation section, ignoring
/// `recommender.kind`.
///
/// # Errors
///
/// Same as [`build_recommender`].
pub fn build_item_based(
    config: &AffinityConfig,
    data_model: Arc<dyn DataModel>,
) -> Result<Arc<GenericItemBasedRecommender>> {
    config.validate()?;
    let pearson = pearson(&config.correlation, &data_model, false)?;
    let correlation: Arc<dyn ItemCorrelation> = if config.correlation.precompute_items {
        Arc::new(GenericItemCorrelation::from_correlation(
            &pearson,
            data_model.as_ref(),
        )?)
    } else {
        Arc::new(pearson)
    };
    Ok(Arc::new(GenericItemBasedRecommender::new(
        data_model,
        correlation,
    )))
}

fn user_correlation(
    config: &CorrelationConfig,
    data_model: &Arc<dyn DataModel>,
) -> Result<Arc<dyn UserCorrelation>> {
    let pearson = pearson(config, data_model, true)?;
    let correlation: Arc<dyn UserCorrelation> = match config.metric {
        CorrelationMetric::Pearson => Arc::new(pearson),
        CorrelationMetric::Spearman => {
            Arc::new(SpearmanCorrelation::with_correlation(Arc::new(pearson)))
        }
    };
    Ok(correlation)
}

/// Pearson correlation with every configured hook. Inference only applies
/// to user-user comparisons.
fn pearson(
    config: &CorrelationConfig,
    data_model: &Arc<dyn DataModel>,
    for_users: bool,
) -> Result<PearsonCorrelation> {
    let mut pearson = PearsonCorrelation::new(Arc::clone(data_model)).weighted(config.weighted);
    if for_users && config.infer_preferences {
        pearson = pearson.with_inferrer(Arc::new(AveragingPreferenceInferrer::new(
            Arc::clone(data_model),
        )?));
    }
    match config.transform {
        TransformKind::None => {}
        TransformKind::Zscore => {
            pearson = pearson.with_preference_transform(Arc::new(ZScore::new(Arc::clone(
                data_model,
            ))?));
        }
        TransformKind::InverseUserFrequency => {
            pearson = pearson.with_preference_transform(Arc::new(InverseUserFrequency::new(
                Arc::clone(data_model),
                config.log_base,
            )?));
        }
    }
    if let Some(factor) = config.case_amplification {
        pearson = pearson.with_correlation_transform(Arc::new(CaseAmplification::new(factor)?));
    }
    Ok(pearson)
}

fn neighborhood(
    config: &NeighborhoodConfig,
    correlation: Arc<dyn UserCorrelation>,
    data_model: Arc<dyn DataModel>,
) -> Result<Arc<dyn UserNeighborhood>> {
    let neighborhood: Arc<dyn UserNeighborhood> = match config.kind {
        NeighborhoodKind::NearestN => Arc::new(NearestNUserNeighborhood::with_sampling(
            config.size,
            correlation,
            data_model,
            config.sampling_rate,
            config.seed,
        )?),
        NeighborhoodKind::Threshold => Arc::new(ThresholdUserNeighborhood::with_sampling(
            config.threshold,
            correlation,
            data_model,
            config.sampling_rate,
            config.seed,
        )?),
    };
    Ok(neighborhood)
}
