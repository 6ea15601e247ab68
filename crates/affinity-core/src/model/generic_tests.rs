//! Tests for `GenericDataModel`.

use super::*;
use crate::test_fixtures::{iid, mock_users, uid, user};

#[test]
fn test_users_and_items_are_sorted() {
    // Arrange
    let model = GenericDataModel::new(vec![
        user("b", &[1.0]),
        user("a", &[1.0, 2.0, 3.0]),
    ]);

    // Act
    let users = model.users().unwrap();
    let items = model.items().unwrap();

    // Assert
    let user_ids: Vec<&str> = users.iter().map(|u| u.id().as_str()).collect();
    let item_ids: Vec<&str> = items.iter().map(|i| i.id().as_str()).collect();
    assert_eq!(user_ids, vec!["a", "b"]);
    assert_eq!(item_ids, vec!["0", "1", "2"]);
    assert_eq!(model.num_users().unwrap(), 2);
    assert_eq!(model.num_items().unwrap(), 3);
}

#[test]
fn test_preferences_for_item_sorted_by_user() {
    let model = GenericDataModel::new(mock_users());

    let prefs = model.preferences_for_item(&iid("2")).unwrap();

    let users: Vec<&str> = prefs.iter().map(|p| p.user_id.as_str()).collect();
    assert_eq!(users, vec!["test2", "test3", "test4"]);
}

#[test]
fn test_unknown_ids_are_not_found() {
    let model = GenericDataModel::new(mock_users());

    assert!(model.user(&uid("nobody")).unwrap_err().is_not_found());
    assert!(model.item(&iid("nothing")).unwrap_err().is_not_found());
    assert!(model
        .preferences_for_item(&iid("nothing"))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_registered_items_keep_flags() {
    let model = GenericDataModel::with_items(
        vec![user("a", &[1.0])],
        vec![Item::non_recommendable("0"), Item::new("unrated")],
    );

    assert!(!model.item(&iid("0")).unwrap().is_recommendable());
    assert!(model.item(&iid("unrated")).unwrap().is_recommendable());
    assert!(model.preferences_for_item(&iid("unrated")).unwrap().is_empty());
}

#[test]
fn test_set_preference_updates_both_indexes() {
    // Arrange
    let model = GenericDataModel::new(mock_users());
    let before = model.user(&uid("test1")).unwrap();

    // Act
    model.set_preference(&uid("test1"), &iid("2"), 0.9).unwrap();

    // Assert
    let after = model.user(&uid("test1")).unwrap();
    assert_eq!(after.preference_for(&iid("2")).unwrap().value, 0.9);
    assert!(before.preference_for(&iid("2")).is_none(), "old snapshot untouched");
    let prefs = model.preferences_for_item(&iid("2")).unwrap();
    assert_eq!(prefs[0].user_id, uid("test1"));
}

#[test]
fn test_set_preference_creates_user_and_item() {
    let model = GenericDataModel::new(mock_users());

    model.set_preference(&uid("new"), &iid("fresh"), 1.0).unwrap();

    assert_eq!(model.num_users().unwrap(), 5);
    assert_eq!(model.num_items().unwrap(), 4);
    assert_eq!(
        model.preference_value(&uid("new"), &iid("fresh")).unwrap(),
        Some(1.0)
    );
}

#[test]
fn test_set_preference_rejects_nan() {
    let model = GenericDataModel::new(mock_users());

    let err = model
        .set_preference(&uid("test1"), &iid("0"), f64::NAN)
        .unwrap_err();

    assert_eq!(err.code(), "AFF-001");
}

#[test]
fn test_remove_preference() {
    let model = GenericDataModel::new(mock_users());

    model.remove_preference(&uid("test2"), &iid("0")).unwrap();
    model.remove_preference(&uid("test2"), &iid("0")).unwrap();

    assert_eq!(model.preference_value(&uid("test2"), &iid("0")).unwrap(), None);
    assert_eq!(model.preferences_for_item(&iid("0")).unwrap().len(), 3);
    assert!(model
        .remove_preference(&uid("ghost"), &iid("0"))
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_from_preferences_groups_by_user() {
    let model = GenericDataModel::from_preferences(vec![
        (uid("u1"), iid("a"), 1.0),
        (uid("u2"), iid("a"), 2.0),
        (uid("u1"), iid("b"), 3.0),
    ])
    .unwrap();

    assert_eq!(model.user(&uid("u1")).unwrap().preferences().len(), 2);
    assert_eq!(model.preferences_for_item(&iid("a")).unwrap().len(), 2);
}
