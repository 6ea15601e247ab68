//! Shared fixtures for unit tests.

use std::sync::Arc;

use crate::model::{DataModel, GenericDataModel, Item, ItemId, User, UserId};

/// Tolerance used when comparing computed scores.
pub(crate) const EPSILON: f64 = 1e-5;

pub(crate) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

/// A user whose i-th value is a preference for item `"i"`.
pub(crate) fn user(id: &str, values: &[f64]) -> User {
    User::new(
        id,
        values
            .iter()
            .enumerate()
            .map(|(idx, &value)| (ItemId::from(idx.to_string()), value)),
    )
    .unwrap()
}

pub(crate) fn model(users: Vec<User>) -> Arc<dyn DataModel> {
    Arc::new(GenericDataModel::new(users))
}

pub(crate) fn model_with_items(users: Vec<User>, items: Vec<Item>) -> Arc<dyn DataModel> {
    Arc::new(GenericDataModel::with_items(users, items))
}

/// Four users over items `"0"`, `"1"` and `"2"`.
pub(crate) fn mock_users() -> Vec<User> {
    vec![
        user("test1", &[0.1, 0.3]),
        user("test2", &[0.2, 0.3, 0.3]),
        user("test3", &[0.4, 0.3, 0.5]),
        user("test4", &[0.7, 0.3, 0.8]),
    ]
}

pub(crate) fn mock_model() -> Arc<dyn DataModel> {
    model(mock_users())
}

pub(crate) fn uid(id: &str) -> UserId {
    UserId::from(id)
}

pub(crate) fn iid(id: &str) -> ItemId {
    ItemId::from(id)
}

/// User correlation that is the inverse distance between first preferences.
#[derive(Debug, Default)]
pub(crate) struct DummyCorrelation;

impl crate::correlation::UserCorrelation for DummyCorrelation {
    fn user_correlation(&self, a: &User, b: &User) -> crate::error::Result<f64> {
        let first = |u: &User| u.preferences().first().map_or(f64::NAN, |p| p.value);
        Ok(1.0 / (first(a) - first(b)).abs())
    }
}

impl crate::common::Refreshable for DummyCorrelation {
    fn refresh(&self) {}
}

pub(crate) fn ids(users: &[Arc<User>]) -> Vec<&str> {
    users.iter().map(|u| u.id().as_str()).collect()
}

/// Negates every score, keeping NaN.
#[derive(Debug, Default)]
pub(crate) struct ReversingRescorer;

impl<T: ?Sized> crate::recommender::Rescorer<T> for ReversingRescorer {
    fn rescore(&self, _thing: &T, original: f64) -> f64 {
        -original
    }
}

pub(crate) fn item_ids(items: &[crate::recommender::RecommendedItem]) -> Vec<&str> {
    items.iter().map(|r| r.item_id().as_str()).collect()
}
