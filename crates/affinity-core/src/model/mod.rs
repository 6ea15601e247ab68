//! Preference repository contract and its in-memory and file-backed
//! implementations.
//!
//! Everything above this module reads users, items and preferences only
//! through [`DataModel`].

mod file;
mod generic;
mod types;

#[cfg(test)]
mod generic_tests;

use std::sync::Arc;

pub use file::FileDataModel;
pub use generic::GenericDataModel;
pub(crate) use types::check_value;
pub use types::{Item, ItemId, Preference, User, UserId};

use crate::common::Refreshable;
use crate::error::Result;

/// Read/write access to the preference graph.
///
/// Users are returned sorted by id, items sorted by id, and per-item
/// preference lists sorted by user id.
pub trait DataModel: Refreshable + Send + Sync {
    /// All users, sorted by id.
    fn users(&self) -> Result<Arc<[Arc<User>]>>;

    /// The user with the given id, or `UserNotFound`.
    fn user(&self, id: &UserId) -> Result<Arc<User>>;

    /// All items, sorted by id.
    fn items(&self) -> Result<Arc<[Arc<Item>]>>;

    /// The item with the given id, or `ItemNotFound`.
    fn item(&self, id: &ItemId) -> Result<Arc<Item>>;

    /// Every preference expressed for `item`, sorted by user id.
    fn preferences_for_item(&self, item: &ItemId) -> Result<Arc<[Preference]>>;

    /// Number of users.
    fn num_users(&self) -> Result<usize>;

    /// Number of items.
    fn num_items(&self) -> Result<usize>;

    /// Sets or replaces a preference.
    fn set_preference(&self, user: &UserId, item: &ItemId, value: f64) -> Result<()>;

    /// Removes a preference. Removing an absent preference is a no-op.
    fn remove_preference(&self, user: &UserId, item: &ItemId) -> Result<()>;

    /// The explicit preference value `user` gave `item`, if any.
    fn preference_value(&self, user: &UserId, item: &ItemId) -> Result<Option<f64>> {
        Ok(self.user(user)?.preference_for(item).map(|p| p.value))
    }
}
