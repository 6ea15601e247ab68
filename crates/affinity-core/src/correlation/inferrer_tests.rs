//! Tests for `AveragingPreferenceInferrer`.

use super::*;
use crate::common::Refreshable;
use crate::model::User;
use crate::test_fixtures::{assert_close, iid, model, uid, user};

#[test]
fn test_infers_user_average() {
    // Arrange
    let u = user("test1", &[3.0, -2.0, 5.0]);
    let inferrer = AveragingPreferenceInferrer::new(model(vec![u.clone()])).unwrap();

    // Act
    let inferred = inferrer.infer_preference(&u, &iid("3")).unwrap();

    // Assert
    assert_close(inferred, 2.0);
}

#[test]
fn test_user_without_preferences_infers_zero() {
    let empty = User::new("empty", Vec::<(&str, f64)>::new()).unwrap();
    let inferrer = AveragingPreferenceInferrer::new(model(vec![empty.clone()])).unwrap();

    assert_close(inferrer.infer_preference(&empty, &iid("0")).unwrap(), 0.0);
}

#[test]
fn test_user_outside_model_is_averaged_directly() {
    let inferrer = AveragingPreferenceInferrer::new(model(vec![user("a", &[1.0])])).unwrap();
    let outsider = user("outsider", &[2.0, 4.0]);

    assert_close(inferrer.infer_preference(&outsider, &iid("0")).unwrap(), 3.0);
}

#[test]
fn test_refresh_drops_cached_averages() {
    // Arrange
    let data = model(vec![user("a", &[1.0, 3.0])]);
    let inferrer = AveragingPreferenceInferrer::new(data.clone()).unwrap();
    let a = data.user(&uid("a")).unwrap();
    assert_close(inferrer.infer_preference(&a, &iid("9")).unwrap(), 2.0);

    // Act
    data.set_preference(&uid("a"), &iid("2"), 8.0).unwrap();
    let stale = inferrer.infer_preference(&a, &iid("9")).unwrap();
    inferrer.refresh();
    let fresh = inferrer.infer_preference(&a, &iid("9")).unwrap();

    // Assert
    assert_close(stale, 2.0);
    assert_close(fresh, 4.0);
}
