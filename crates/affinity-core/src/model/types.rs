//! Identities, preferences and users.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Creates an id from any string-like value.
            #[must_use]
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(Arc::from(id.as_ref()))
            }

            /// Returns the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(Arc::from(id))
            }
        }
    };
}

define_id!(
    /// Totally ordered user identity. Cloning is a reference-count bump.
    UserId
);

define_id!(
    /// Totally ordered item identity. Cloning is a reference-count bump.
    ItemId
);

/// An item that users can express preferences for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    recommendable: bool,
}

impl Item {
    /// Creates a recommendable item.
    #[must_use]
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            recommendable: true,
        }
    }

    /// Creates an item that can appear in histories but is never recommended.
    #[must_use]
    pub fn non_recommendable(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            recommendable: false,
        }
    }

    /// Item identity.
    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Whether the item may be returned by `recommend`.
    #[must_use]
    pub fn is_recommendable(&self) -> bool {
        self.recommendable
    }
}

/// A user's preference value for one item. Never NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    /// User expressing the preference.
    pub user_id: UserId,
    /// Item the preference is for.
    pub item_id: ItemId,
    /// Preference strength; zero is neutral.
    pub value: f64,
}

impl Preference {
    /// Creates a preference, rejecting NaN values.
    pub fn new(user_id: UserId, item_id: ItemId, value: f64) -> Result<Self> {
        check_value(value)?;
        Ok(Self {
            user_id,
            item_id,
            value,
        })
    }
}

pub(crate) fn check_value(value: f64) -> Result<()> {
    if value.is_nan() {
        return Err(Error::invalid("preference value must not be NaN"));
    }
    Ok(())
}

/// A user and their preferences, sorted by item id with no duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    preferences: Vec<Preference>,
    /// Set on transient copies whose values no longer match the model.
    derived: bool,
}

impl User {
    /// Builds a user from `(item, value)` pairs.
    ///
    /// Pairs are sorted by item; when an item repeats, the last value wins.
    pub fn new<I, T>(id: impl Into<UserId>, preferences: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, f64)>,
        T: Into<ItemId>,
    {
        let id = id.into();
        let mut prefs = Vec::new();
        for (item, value) in preferences {
            prefs.push(Preference::new(id.clone(), item.into(), value)?);
        }
        // Stable sort keeps input order among equal items; keep the last.
        prefs.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        let mut deduped: Vec<Preference> = Vec::with_capacity(prefs.len());
        for pref in prefs {
            match deduped.last_mut() {
                Some(last) if last.item_id == pref.item_id => *last = pref,
                _ => deduped.push(pref),
            }
        }
        Ok(Self {
            id,
            preferences: deduped,
            derived: false,
        })
    }

    /// Builds a user from preferences already sorted by item with no
    /// duplicates.
    pub(crate) fn from_sorted(id: UserId, preferences: Vec<Preference>) -> Self {
        debug_assert!(preferences
            .windows(2)
            .all(|w| w[0].item_id < w[1].item_id));
        Self {
            id,
            preferences,
            derived: false,
        }
    }

    /// Like [`User::from_sorted`], for a transient copy whose values were
    /// remapped (ranks, for instance). Per-user statistics cached by id
    /// must not be used for it.
    pub(crate) fn derived_view(id: UserId, preferences: Vec<Preference>) -> Self {
        Self {
            derived: true,
            ..Self::from_sorted(id, preferences)
        }
    }

    /// Whether this is a transient copy with remapped values rather than
    /// the user as the data model holds it.
    #[must_use]
    pub fn is_derived_view(&self) -> bool {
        self.derived
    }

    /// User identity.
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Preferences sorted by item id.
    #[must_use]
    pub fn preferences(&self) -> &[Preference] {
        &self.preferences
    }

    /// The user's preference for `item`, if any.
    #[must_use]
    pub fn preference_for(&self, item: &ItemId) -> Option<&Preference> {
        self.preferences
            .binary_search_by(|p| p.item_id.cmp(item))
            .ok()
            .map(|idx| &self.preferences[idx])
    }

    /// Returns a copy with `item` set to `value`, keeping item order.
    pub(crate) fn with_preference(&self, item: &ItemId, value: f64) -> Self {
        let mut preferences = self.preferences.clone();
        match preferences.binary_search_by(|p| p.item_id.cmp(item)) {
            Ok(idx) => preferences[idx].value = value,
            Err(idx) => preferences.insert(
                idx,
                Preference {
                    user_id: self.id.clone(),
                    item_id: item.clone(),
                    value,
                },
            ),
        }
        Self::from_sorted(self.id.clone(), preferences)
    }

    /// Returns a copy without `item`, or `None` if it was not rated.
    pub(crate) fn without_preference(&self, item: &ItemId) -> Option<Self> {
        let idx = self
            .preferences
            .binary_search_by(|p| p.item_id.cmp(item))
            .ok()?;
        let mut preferences = self.preferences.clone();
        preferences.remove(idx);
        Some(Self::from_sorted(self.id.clone(), preferences))
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User[id:{}]", self.id)
    }
}
