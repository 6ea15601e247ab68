//! In-memory data model with copy-on-write snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use super::types::check_value;
use super::{DataModel, Item, ItemId, Preference, User, UserId};
use crate::common::Refreshable;
use crate::error::{Error, Result};

/// Immutable, fully indexed view of the preference graph.
#[derive(Debug)]
struct Snapshot {
    users: Arc<[Arc<User>]>,
    user_index: FxHashMap<UserId, usize>,
    items: Arc<[Arc<Item>]>,
    item_index: FxHashMap<ItemId, usize>,
    /// Parallel to `items`.
    item_preferences: Vec<Arc<[Preference]>>,
}

impl Snapshot {
    fn build(
        users: BTreeMap<UserId, Arc<User>>,
        known_items: impl IntoIterator<Item = Arc<Item>>,
    ) -> Self {
        let mut items: BTreeMap<ItemId, Arc<Item>> = known_items
            .into_iter()
            .map(|item| (item.id().clone(), item))
            .collect();
        let mut by_item: BTreeMap<ItemId, Vec<Preference>> = BTreeMap::new();

        // Users are visited in id order, so every per-item list comes out
        // sorted by user.
        for user in users.values() {
            for pref in user.preferences() {
                items
                    .entry(pref.item_id.clone())
                    .or_insert_with(|| Arc::new(Item::new(pref.item_id.clone())));
                by_item
                    .entry(pref.item_id.clone())
                    .or_default()
                    .push(pref.clone());
            }
        }

        let users: Arc<[Arc<User>]> = users.into_values().collect();
        let user_index = users
            .iter()
            .enumerate()
            .map(|(idx, user)| (user.id().clone(), idx))
            .collect();

        let items: Arc<[Arc<Item>]> = items.into_values().collect();
        let item_index = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.id().clone(), idx))
            .collect();
        let item_preferences = items
            .iter()
            .map(|item| {
                by_item
                    .remove(item.id())
                    .map_or_else(|| Arc::from(Vec::<Preference>::new()), Arc::from)
            })
            .collect();

        Self {
            users,
            user_index,
            items,
            item_index,
            item_preferences,
        }
    }

    fn user(&self, id: &UserId) -> Result<&Arc<User>> {
        self.user_index
            .get(id)
            .map(|&idx| &self.users[idx])
            .ok_or_else(|| Error::UserNotFound(id.clone()))
    }

    fn users_by_id(&self) -> BTreeMap<UserId, Arc<User>> {
        self.users
            .iter()
            .map(|user| (user.id().clone(), Arc::clone(user)))
            .collect()
    }
}

/// A [`DataModel`] held entirely in memory.
///
/// Readers load the current snapshot without locking. Writers are
/// serialized and publish a rebuilt snapshot, so a reader never observes a
/// half-applied write.
pub struct GenericDataModel {
    snapshot: ArcSwap<Snapshot>,
    write_lock: Mutex<()>,
}

impl GenericDataModel {
    /// Creates a model from users. Items are derived from their preferences.
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self::with_items(users, std::iter::empty())
    }

    /// Creates a model from users plus explicitly registered items.
    ///
    /// Registered items keep their `recommendable` flag and exist even when
    /// no user has rated them.
    pub fn with_items(
        users: impl IntoIterator<Item = User>,
        items: impl IntoIterator<Item = Item>,
    ) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.id().clone(), Arc::new(user)))
            .collect();
        let snapshot = Snapshot::build(users, items.into_iter().map(Arc::new));
        debug!(
            users = snapshot.users.len(),
            items = snapshot.items.len(),
            "built in-memory data model"
        );
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a model from `(user, item, value)` triples.
    ///
    /// A repeated `(user, item)` keeps the last value.
    pub fn from_preferences<I>(triples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (UserId, ItemId, f64)>,
    {
        let mut grouped: BTreeMap<UserId, Vec<(ItemId, f64)>> = BTreeMap::new();
        for (user, item, value) in triples {
            grouped.entry(user).or_default().push((item, value));
        }
        let users = grouped
            .into_iter()
            .map(|(user, prefs)| User::new(user, prefs))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(users))
    }

    fn publish(&self, users: BTreeMap<UserId, Arc<User>>, items: Arc<[Arc<Item>]>) {
        let snapshot = Snapshot::build(users, items.iter().cloned());
        self.snapshot.store(Arc::new(snapshot));
    }
}

impl std::fmt::Debug for GenericDataModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot.load();
        f.debug_struct("GenericDataModel")
            .field("users", &snapshot.users.len())
            .field("items", &snapshot.items.len())
            .finish()
    }
}

impl Refreshable for GenericDataModel {
    fn refresh(&self) {
        trace!("in-memory data model has nothing to refresh");
    }
}

impl DataModel for GenericDataModel {
    fn users(&self) -> Result<Arc<[Arc<User>]>> {
        Ok(Arc::clone(&self.snapshot.load().users))
    }

    fn user(&self, id: &UserId) -> Result<Arc<User>> {
        self.snapshot.load().user(id).cloned()
    }

    fn items(&self) -> Result<Arc<[Arc<Item>]>> {
        Ok(Arc::clone(&self.snapshot.load().items))
    }

    fn item(&self, id: &ItemId) -> Result<Arc<Item>> {
        let snapshot = self.snapshot.load();
        snapshot
            .item_index
            .get(id)
            .map(|&idx| Arc::clone(&snapshot.items[idx]))
            .ok_or_else(|| Error::ItemNotFound(id.clone()))
    }

    fn preferences_for_item(&self, item: &ItemId) -> Result<Arc<[Preference]>> {
        let snapshot = self.snapshot.load();
        snapshot
            .item_index
            .get(item)
            .map(|&idx| Arc::clone(&snapshot.item_preferences[idx]))
            .ok_or_else(|| Error::ItemNotFound(item.clone()))
    }

    fn num_users(&self) -> Result<usize> {
        Ok(self.snapshot.load().users.len())
    }

    fn num_items(&self) -> Result<usize> {
        Ok(self.snapshot.load().items.len())
    }

    fn set_preference(&self, user: &UserId, item: &ItemId, value: f64) -> Result<()> {
        check_value(value)?;
        let _guard = self.write_lock.lock();
        let current = self.snapshot.load_full();

        let updated = match current.user_index.get(user) {
            Some(&idx) => current.users[idx].with_preference(item, value),
            None => User::from_sorted(
                user.clone(),
                vec![Preference {
                    user_id: user.clone(),
                    item_id: item.clone(),
                    value,
                }],
            ),
        };
        let mut users = current.users_by_id();
        users.insert(user.clone(), Arc::new(updated));
        self.publish(users, Arc::clone(&current.items));
        debug!(user = %user, item = %item, value, "preference set");
        Ok(())
    }

    fn remove_preference(&self, user: &UserId, item: &ItemId) -> Result<()> {
        let _guard = self.write_lock.lock();
        let current = self.snapshot.load_full();

        let Some(updated) = current.user(user)?.without_preference(item) else {
            return Ok(());
        };
        let mut users = current.users_by_id();
        users.insert(user.clone(), Arc::new(updated));
        self.publish(users, Arc::clone(&current.items));
        debug!(user = %user, item = %item, "preference removed");
        Ok(())
    }
}
