//! Per-family object caches and the manager that keeps them in sync.

mod manager;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

pub use manager::{CacheManager, CacheView, ChangeHandler, ManagerBuilder, PollOutcome};

use crate::object::{Action, CacheObject};

/// Lifecycle of one family's cache inside a [`CacheManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheState {
    #[default]
    Uninitialized,
    Populating,
    Live,
    Closed,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheState::Uninitialized => "uninitialized",
            CacheState::Populating => "populating",
            CacheState::Live => "live",
            CacheState::Closed => "closed",
        })
    }
}

/// Objects of one family, keyed by identity.
///
/// Never holds two entries with the same key.
#[derive(Debug, Clone)]
pub struct Cache<O: CacheObject> {
    objects: HashMap<O::Key, O>,
}

impl<O: CacheObject> Default for Cache<O> {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }
}

impl<O: CacheObject> Cache<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the action that actually took effect.
    ///
    /// NEW inserts or overwrites. CHANGE overwrites, and becomes NEW for an
    /// unknown key. DEL removes; deleting an absent key is a no-op that
    /// still reports DEL.
    pub fn apply_event(&mut self, action: Action, object: O) -> Action {
        match action {
            Action::New => {
                self.objects.insert(object.key(), object);
                Action::New
            }
            Action::Change => match self.objects.entry(object.key()) {
                Entry::Occupied(mut slot) => {
                    slot.insert(object);
                    Action::Change
                }
                Entry::Vacant(slot) => {
                    slot.insert(object);
                    Action::New
                }
            },
            Action::Del => {
                self.objects.remove(&object.key());
                Action::Del
            }
        }
    }

    /// Look up an object by key.
    pub fn lookup(&self, key: &O::Key) -> Option<&O> {
        self.objects.get(key)
    }

    pub fn contains(&self, key: &O::Key) -> bool {
        self.objects.contains_key(key)
    }

    /// All objects, ordered by key.
    pub fn snapshot(&self) -> Vec<&O> {
        let mut objects: Vec<_> = self.objects.iter().collect();
        objects.sort_by(|a, b| a.0.cmp(b.0));
        objects.into_iter().map(|(_, o)| o).collect()
    }

    /// All objects, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &O> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.objects.clear();
    }
}
