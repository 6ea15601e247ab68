//! Tests for the item-average and item-user-average recommenders.

use std::sync::Arc;

use super::*;
use crate::test_fixtures::{assert_close, iid, item_ids, model, uid, user};

fn data() -> Arc<dyn DataModel> {
    model(vec![
        user("a", &[1.0, 2.0]),
        user("b", &[3.0, 4.0, 5.0]),
        user("c", &[2.0, 3.0, 4.0, 1.0]),
    ])
}

// ============================================================================
// ItemAverageRecommender
// ============================================================================

#[test]
fn test_item_average_estimate() {
    let recommender = ItemAverageRecommender::new(data());

    // item "2" was rated 5.0 and 4.0
    assert_close(recommender.estimate_preference(&uid("a"), &iid("2")).unwrap(), 4.5);
}

#[test]
fn test_item_average_returns_explicit_preference() {
    let recommender = ItemAverageRecommender::new(data());

    assert_close(recommender.estimate_preference(&uid("a"), &iid("1")).unwrap(), 2.0);
}

#[test]
fn test_item_average_recommends_by_mean() {
    let recommender = ItemAverageRecommender::new(data());

    let recommended = recommender.recommend(&uid("a"), 2).unwrap();

    assert_eq!(item_ids(&recommended), vec!["2", "3"]);
    assert_close(recommended[1].value, 1.0);
}

#[test]
fn test_item_average_tracks_writes() {
    // Arrange
    let recommender = ItemAverageRecommender::new(data());
    assert_close(recommender.estimate_preference(&uid("a"), &iid("3")).unwrap(), 1.0);

    // Act
    recommender.set_preference(&uid("b"), &iid("3"), 3.0).unwrap();
    let after_add = recommender.estimate_preference(&uid("a"), &iid("3")).unwrap();
    recommender.set_preference(&uid("b"), &iid("3"), 5.0).unwrap();
    let after_change = recommender.estimate_preference(&uid("a"), &iid("3")).unwrap();
    recommender.remove_preference(&uid("c"), &iid("3")).unwrap();
    let after_remove = recommender.estimate_preference(&uid("a"), &iid("3")).unwrap();

    // Assert
    assert_close(after_add, 2.0);
    assert_close(after_change, 3.0);
    assert_close(after_remove, 5.0);
}

#[test]
fn test_item_average_refresh_matches_incremental_state() {
    // Arrange
    let recommender = ItemAverageRecommender::new(data());
    recommender.set_preference(&uid("a"), &iid("3"), 3.0).unwrap();
    let incremental = recommender.estimate_preference(&uid("b"), &iid("3")).unwrap();

    // Act
    recommender.refresh();
    let rebuilt = recommender.estimate_preference(&uid("b"), &iid("3")).unwrap();

    // Assert
    assert_close(incremental, 2.0);
    assert_close(rebuilt, 2.0);
}

#[test]
fn test_item_average_unknown_item_is_nan() {
    let recommender = ItemAverageRecommender::new(data());

    assert!(recommender.estimate_preference(&uid("a"), &iid("9")).unwrap().is_nan());
}

// ============================================================================
// ItemUserAverageRecommender
// ============================================================================

#[test]
fn test_item_user_average_estimate() {
    // overall mean = 25 / 9, user a mean = 1.5, item "2" mean = 4.5
    let recommender = ItemUserAverageRecommender::new(data());

    let estimate = recommender.estimate_preference(&uid("a"), &iid("2")).unwrap();

    assert_close(estimate, 4.5 + (1.5 - 25.0 / 9.0));
}

#[test]
fn test_item_user_average_unknown_user_not_found() {
    let recommender = ItemUserAverageRecommender::new(data());

    assert!(recommender
        .estimate_preference(&uid("ghost"), &iid("2"))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_item_user_average_user_without_data_is_nan() {
    let data = model(vec![user("a", &[1.0]), user("empty", &[])]);
    let recommender = ItemUserAverageRecommender::new(data);

    assert!(recommender.estimate_preference(&uid("empty"), &iid("0")).unwrap().is_nan());
}

#[test]
fn test_item_user_average_tracks_new_user() {
    // Arrange
    let recommender = ItemUserAverageRecommender::new(data());
    recommender.estimate_preference(&uid("a"), &iid("2")).unwrap();

    // Act
    recommender.set_preference(&uid("d"), &iid("0"), 7.0).unwrap();
    let estimate = recommender.estimate_preference(&uid("d"), &iid("1")).unwrap();

    // Assert: item "1" mean 3.0, user d mean 7.0, overall 32 / 10
    assert_close(estimate, 3.0 + (7.0 - 3.2));
}

#[test]
fn test_item_user_average_recommend_excludes_rated() {
    let recommender = ItemUserAverageRecommender::new(data());

    let recommended = recommender.recommend(&uid("b"), 5).unwrap();

    assert_eq!(item_ids(&recommended), vec!["3"]);
}
