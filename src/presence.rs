//! Which users currently hold at least one open socket.
//!
//! A user may have several connections at once (tabs, devices). The entry
//! for a user exists exactly while that set is non-empty.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use uuid::Uuid;

/// Identifies one live socket.
pub type ConnId = Uuid;

#[derive(Default)]
pub struct Presence {
    inner: Mutex<PresenceMap>,
}

#[derive(Default)]
struct PresenceMap {
    users: HashMap<String, HashSet<ConnId>>,
    owners: HashMap<ConnId, String>,
}

impl PresenceMap {
    fn remove(&mut self, conn_id: ConnId) -> Option<String> {
        let user_id = self.owners.remove(&conn_id)?;
        let conns = self.users.get_mut(&user_id)?;
        conns.remove(&conn_id);
        if conns.is_empty() {
            self.users.remove(&user_id);
            return Some(user_id);
        }
        None
    }
}

impl Presence {
    pub fn new() -> Presence {
        Presence::default()
    }

    fn map(&self) -> MutexGuard<'_, PresenceMap> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `conn_id` for `user_id`. Returns true when this made the user
    /// come online.
    pub fn register(&self, user_id: &str, conn_id: ConnId) -> bool {
        let mut map = self.map();

        match map.owners.get(&conn_id).cloned() {
            Some(owner) if owner == user_id => return false,
            Some(_) => {
                map.remove(conn_id);
            }
            None => {}
        }

        map.owners.insert(conn_id, user_id.to_owned());
        let conns = map.users.entry(user_id.to_owned()).or_default();
        conns.insert(conn_id);
        conns.len() == 1
    }

    /// Drops `conn_id`. Returns the owning user when it was their last
    /// connection. Unknown ids are ignored.
    pub fn unregister(&self, conn_id: ConnId) -> Option<String> {
        self.map().remove(conn_id)
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.map().users.contains_key(user_id)
    }

    /// Every live connection of `user_id`, e.g. all of their open tabs.
    pub fn connections(&self, user_id: &str) -> Vec<ConnId> {
        self.map()
            .users
            .get(user_id)
            .map(|conns| conns.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn online_status<'a, I>(&self, user_ids: I) -> HashMap<String, bool>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let map = self.map();
        user_ids
            .into_iter()
            .map(|user_id| (user_id.to_owned(), map.users.contains_key(user_id)))
            .collect()
    }

    pub fn online_count(&self) -> usize {
        self.map().users.len()
    }

    pub fn clear(&self) {
        let mut map = self.map();
        map.users.clear();
        map.owners.clear();
    }
}
