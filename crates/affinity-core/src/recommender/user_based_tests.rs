//! Tests for `GenericUserBasedRecommender`.

use std::sync::Arc;

use super::*;
use crate::correlation::PearsonCorrelation;
use crate::neighborhood::NearestNUserNeighborhood;
use crate::test_fixtures::{
    assert_close, iid, item_ids, mock_model, model, uid, user, ReversingRescorer,
};

fn build(data: Arc<dyn DataModel>, n: usize) -> GenericUserBasedRecommender {
    let correlation = Arc::new(PearsonCorrelation::new(Arc::clone(&data)));
    let neighborhood = Arc::new(
        NearestNUserNeighborhood::new(n, correlation.clone(), Arc::clone(&data)).unwrap(),
    );
    GenericUserBasedRecommender::new(data, neighborhood, correlation)
}

fn five_users() -> Arc<dyn DataModel> {
    model(vec![
        user("test1", &[0.1, 0.2]),
        user("test2", &[0.2, 0.3, 0.3, 0.6]),
        user("test3", &[0.4, 0.4, 0.5, 0.9]),
        user("test4", &[0.1, 0.4, 0.5, 0.8, 0.9, 1.0]),
        user("test5", &[0.2, 0.3, 0.6, 0.7, 0.1, 0.2]),
    ])
}

#[test]
fn test_recommends_neighbor_item() {
    let recommender = build(mock_model(), 1);

    let recommended = recommender.recommend(&uid("test1"), 1).unwrap();

    assert_eq!(item_ids(&recommended), vec!["2"]);
    assert_close(recommended[0].value, 0.3);
}

#[test]
fn test_estimate_from_neighborhood() {
    let recommender = build(mock_model(), 1);

    assert_close(recommender.estimate_preference(&uid("test1"), &iid("2")).unwrap(), 0.3);
}

#[test]
fn test_estimate_returns_explicit_preference() {
    let recommender = build(mock_model(), 1);

    assert_close(recommender.estimate_preference(&uid("test1"), &iid("0")).unwrap(), 0.1);
}

#[test]
fn test_fewer_is_prefix_of_more() {
    let recommender = build(five_users(), 2);

    let few = recommender.recommend(&uid("test1"), 2).unwrap();
    let more = recommender.recommend(&uid("test1"), 4).unwrap();

    assert!(few.len() <= more.len());
    assert_eq!(item_ids(&few), item_ids(&more)[..few.len()].to_vec());
}

#[test]
fn test_never_recommends_rated_items() {
    let recommender = build(five_users(), 4);

    let recommended = recommender.recommend(&uid("test1"), 10).unwrap();

    assert!(recommended
        .iter()
        .all(|r| r.item_id().as_str() != "0" && r.item_id().as_str() != "1"));
}

#[test]
fn test_rescorer_reverses_order() {
    // Arrange
    let data = model(vec![
        user("test1", &[0.1, 0.2]),
        user("test2", &[0.2, 0.3, 0.3, 0.6]),
        user("test3", &[0.4, 0.4, 0.5, 0.9]),
    ]);
    let recommender = build(data, 1);

    // Act
    let original = recommender.recommend(&uid("test1"), 2).unwrap();
    let reversed = recommender
        .recommend_with_rescorer(&uid("test1"), 2, &ReversingRescorer)
        .unwrap();

    // Assert
    assert_eq!(item_ids(&original), vec!["3", "2"]);
    assert_eq!(item_ids(&reversed), vec!["2", "3"]);
}

#[test]
fn test_most_similar_users() {
    let recommender = build(mock_model(), 1);

    let similar = recommender.most_similar_users(&uid("test1"), 2).unwrap();

    assert_eq!(similar.len(), 2);
    assert_eq!(similar[0].user.id().as_str(), "test2");
    assert_close(similar[0].similarity, 1.0);
    assert!(["test3", "test4"].contains(&similar[1].user.id().as_str()));
}

#[test]
fn test_isolated_user_has_no_similar_users() {
    let data = model(vec![
        user("test1", &[0.1, 0.2]),
        user("test2", &[0.2, 0.3, 0.3, 0.6]),
        user("test3", &[0.4, 0.4, 0.5, 0.9]),
        user("test4", &[]),
    ]);
    let recommender = build(data, 3);

    assert!(recommender.most_similar_users(&uid("test4"), 3).unwrap().is_empty());
}

#[test]
fn test_empty_neighborhood_gives_empty_result() {
    let data = model(vec![user("test1", &[0.1, 0.2]), user("test2", &[])]);
    let recommender = build(data, 1);

    assert!(recommender.recommend(&uid("test1"), 3).unwrap().is_empty());
}

#[test]
fn test_zero_how_many_rejected() {
    let recommender = build(mock_model(), 1);

    let err = recommender.recommend(&uid("test1"), 0).unwrap_err();

    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_unknown_user_not_found() {
    let recommender = build(mock_model(), 1);

    assert!(recommender.recommend(&uid("ghost"), 1).unwrap_err().is_not_found());
    assert!(recommender
        .estimate_preference(&uid("ghost"), &iid("0"))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_set_preference_then_refresh_changes_neighborhood() {
    // Arrange
    let recommender = build(mock_model(), 1);
    assert_eq!(item_ids(&recommender.recommend(&uid("test1"), 1).unwrap()), vec!["2"]);

    // Act
    recommender.set_preference(&uid("test1"), &iid("2"), 0.5).unwrap();
    recommender.refresh();

    // Assert
    assert!(recommender.recommend(&uid("test1"), 1).unwrap().is_empty());
    assert_close(recommender.estimate_preference(&uid("test1"), &iid("2")).unwrap(), 0.5);
}

#[test]
fn test_set_nan_preference_rejected() {
    let recommender = build(mock_model(), 1);

    let result = recommender.set_preference(&uid("test1"), &iid("2"), f64::NAN);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}
