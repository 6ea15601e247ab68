//! Tests for `PearsonCorrelation`.

use std::sync::Arc;

use super::*;
use crate::common::Refreshable;
use crate::model::User;
use crate::test_fixtures::{assert_close, iid, mock_model, model, user};
use crate::transforms::{CaseAmplification, ZScore};

fn user_corr(u1: &User, u2: &User, weighted: bool) -> f64 {
    let data = model(vec![u1.clone(), u2.clone()]);
    PearsonCorrelation::new(data)
        .weighted(weighted)
        .user_correlation(u1, u2)
        .unwrap()
}

fn item_corr(users: Vec<User>, weighted: bool) -> f64 {
    PearsonCorrelation::new(model(users))
        .weighted(weighted)
        .item_correlation(&iid("0"), &iid("1"))
        .unwrap()
}

// ============================================================================
// User-user
// ============================================================================

#[test]
fn test_full_correlation() {
    let u1 = user("test1", &[3.0, -2.0]);
    let u2 = user("test2", &[3.0, -2.0]);

    assert_close(user_corr(&u1, &u2, false), 1.0);
    assert_close(user_corr(&u1, &u2, true), 1.0);
}

#[test]
fn test_zero_variance_is_nan() {
    let u1 = user("test1", &[3.0, 3.0]);
    let u2 = user("test2", &[3.0, 3.0]);

    assert!(user_corr(&u1, &u2, false).is_nan());
}

#[test]
fn test_single_identical_rating_is_nan() {
    // Fully overlapping, zero variance: the zero-denominator guard applies.
    let u1 = user("a", &[4.0]);
    let u2 = user("b", &[4.0]);

    assert!(user_corr(&u1, &u2, false).is_nan());
}

#[test]
fn test_inverse_correlation() {
    let u1 = user("test1", &[3.0, -2.0]);
    let u2 = user("test2", &[-3.0, 2.0]);

    assert_close(user_corr(&u1, &u2, false), -1.0);
    assert_close(user_corr(&u1, &u2, true), -1.0);

    let u3 = user("test3", &[90.0, 80.0, 70.0]);
    let u4 = user("test4", &[70.0, 80.0, 90.0]);
    assert_close(user_corr(&u3, &u4, false), -1.0);
}

#[test]
fn test_disjoint_users_are_nan() {
    let u1 = User::new("test1", [("1", 1.0)]).unwrap();
    let u2 = User::new("test2", [("2", 1.0)]).unwrap();

    assert!(user_corr(&u1, &u2, false).is_nan());
}

#[test]
fn test_empty_user_is_nan() {
    let u1 = User::new("test1", Vec::<(&str, f64)>::new()).unwrap();
    let u2 = user("test2", &[1.0, 2.0]);

    assert!(user_corr(&u1, &u2, false).is_nan());
}

#[test]
fn test_simple() {
    let u1 = user("test1", &[1.0, 2.0, 3.0]);
    let u2 = user("test2", &[2.0, 5.0, 6.0]);

    assert_close(user_corr(&u1, &u2, false), 0.960_768_922_830_522_7);
}

#[test]
fn test_simple_weighted() {
    let u1 = user("test1", &[1.0, 2.0, 3.0]);
    let u2 = user("test2", &[2.0, 5.0, 6.0]);

    assert_close(user_corr(&u1, &u2, true), 0.990_192_230_707_630_6);
}

#[test]
fn test_inferrer_fills_one_sided_keys() {
    // Arrange: test2 has no rating for item "2"; its average is 3.0.
    let u1 = user("test1", &[1.0, 2.0, 3.0, 4.0]);
    let u2 = User::new("test2", [("0", 1.0), ("1", 2.0), ("3", 6.0)]).unwrap();
    let data = model(vec![u1.clone(), u2.clone()]);
    let inferrer = Arc::new(AveragingPreferenceInferrer::new(data.clone()).unwrap());

    // Act
    let plain = PearsonCorrelation::new(data.clone())
        .user_correlation(&u1, &u2)
        .unwrap();
    let inferred = PearsonCorrelation::new(data)
        .with_inferrer(inferrer)
        .user_correlation(&u1, &u2)
        .unwrap();

    // Assert
    assert_close(plain, 8.0 / (42.0_f64 / 9.0 * 14.0).sqrt());
    assert_close(inferred, 8.0 / 70.0_f64.sqrt());
}

#[test]
fn test_correlation_transform_applied() {
    let u1 = user("test1", &[1.0, 2.0, 3.0]);
    let u2 = user("test2", &[2.0, 5.0, 6.0]);
    let data = model(vec![u1.clone(), u2.clone()]);

    let correlation = PearsonCorrelation::new(data)
        .with_correlation_transform(Arc::new(CaseAmplification::new(2.0).unwrap()))
        .user_correlation(&u1, &u2)
        .unwrap();

    assert_close(correlation, 12.0 / 13.0);
}

#[test]
fn test_preference_transform_applied() {
    // z-scores are a linear map per user, so the correlation is unchanged.
    let u1 = user("test1", &[1.0, 2.0, 3.0]);
    let u2 = user("test2", &[2.0, 5.0, 6.0]);
    let data = model(vec![u1.clone(), u2.clone()]);
    let zscore = Arc::new(ZScore::new(data.clone()).unwrap());

    let correlation = PearsonCorrelation::new(data)
        .with_preference_transform(zscore)
        .user_correlation(&u1, &u2)
        .unwrap();

    assert_close(correlation, 0.960_768_922_830_522_7);
}

// ============================================================================
// Item-item
// ============================================================================

#[test]
fn test_full_item_correlation() {
    let users = vec![user("test1", &[3.0, 3.0]), user("test2", &[-2.0, -2.0])];

    assert_close(item_corr(users, false), 1.0);
}

#[test]
fn test_item_zero_variance_is_nan() {
    let users = vec![user("test1", &[3.0, 3.0]), user("test2", &[3.0, 3.0])];

    assert!(item_corr(users, false).is_nan());
}

#[test]
fn test_inverse_item_correlation() {
    let users = vec![user("test1", &[3.0, -3.0]), user("test2", &[-2.0, 2.0])];
    assert_close(item_corr(users, false), -1.0);

    let users = vec![
        user("test1", &[90.0, 70.0]),
        user("test2", &[80.0, 80.0]),
        user("test3", &[70.0, 90.0]),
    ];
    assert_close(item_corr(users, false), -1.0);
}

#[test]
fn test_disjoint_items_are_nan() {
    let data = model(vec![
        User::new("test1", [("1", 1.0)]).unwrap(),
        User::new("test2", [("2", 1.0)]).unwrap(),
    ]);

    let correlation = PearsonCorrelation::new(data)
        .item_correlation(&iid("1"), &iid("2"))
        .unwrap();

    assert!(correlation.is_nan());
}

#[test]
fn test_simple_item() {
    let users = || {
        vec![
            user("test1", &[1.0, 2.0]),
            user("test2", &[2.0, 5.0]),
            user("test3", &[3.0, 6.0]),
        ]
    };

    assert_close(item_corr(users(), false), 0.960_768_922_830_522_7);
    assert_close(item_corr(users(), true), 0.990_192_230_707_630_6);
}

#[test]
fn test_item_self_correlation_is_one() {
    let correlation = PearsonCorrelation::new(mock_model());

    // Item "1" has no variance, yet self-correlation is still 1.0.
    assert_close(correlation.item_correlation(&iid("1"), &iid("1")).unwrap(), 1.0);
    assert_close(correlation.item_correlation(&iid("0"), &iid("0")).unwrap(), 1.0);
}

#[test]
fn test_item_correlation_is_symmetric() {
    let correlation = PearsonCorrelation::new(mock_model());

    let ab = correlation.item_correlation(&iid("0"), &iid("2")).unwrap();
    let ba = correlation.item_correlation(&iid("2"), &iid("0")).unwrap();

    assert_eq!(ab.to_bits(), ba.to_bits());
}

#[test]
fn test_unknown_item_is_not_found() {
    let correlation = PearsonCorrelation::new(mock_model());

    let err = correlation
        .item_correlation(&iid("0"), &iid("missing"))
        .unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn test_refresh() {
    PearsonCorrelation::new(mock_model()).refresh();
}
