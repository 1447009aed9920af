//! Room channels: which sockets listen to which room, and how to reach them.

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{events::ServerEvent, presence::ConnId};

pub type Outbox = mpsc::UnboundedReceiver<ServerEvent>;

#[derive(Default)]
pub struct Hub {
    inner: Mutex<Channels>,
}

#[derive(Default)]
struct Channels {
    conns: HashMap<ConnId, mpsc::UnboundedSender<ServerEvent>>,
    rooms: HashMap<String, HashSet<ConnId>>,
}

impl Hub {
    pub fn new() -> Hub {
        Hub::default()
    }

    fn channels(&self) -> MutexGuard<'_, Channels> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers a new socket and hands back its id and outbound queue.
    pub fn connect(&self) -> (ConnId, Outbox) {
        let conn_id = Uuid::now_v7();
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels().conns.insert(conn_id, tx);
        (conn_id, rx)
    }

    pub fn disconnect(&self, conn_id: ConnId) {
        let mut channels = self.channels();
        channels.conns.remove(&conn_id);
        channels.rooms.retain(|_, conns| {
            conns.remove(&conn_id);
            !conns.is_empty()
        });
    }

    pub fn join_channel(&self, conn_id: ConnId, room_id: &str) {
        let mut channels = self.channels();
        if !channels.conns.contains_key(&conn_id) {
            return;
        }
        channels.rooms.entry(room_id.to_owned()).or_default().insert(conn_id);
    }

    pub fn leave_channel(&self, conn_id: ConnId, room_id: &str) {
        let mut channels = self.channels();
        if let Some(conns) = channels.rooms.get_mut(room_id) {
            conns.remove(&conn_id);
            if conns.is_empty() {
                channels.rooms.remove(room_id);
            }
        }
    }

    pub fn is_subscribed(&self, conn_id: ConnId, room_id: &str) -> bool {
        self.channels()
            .rooms
            .get(room_id)
            .is_some_and(|conns| conns.contains(&conn_id))
    }

    pub fn subscribers(&self, room_id: &str) -> usize {
        self.channels().rooms.get(room_id).map_or(0, HashSet::len)
    }

    /// Sends to every subscriber of `room_id`. Returns how many were reached.
    pub fn to_room(&self, room_id: &str, event: ServerEvent) -> usize {
        self.fan_out(room_id, None, event)
    }

    /// Sends to every subscriber of `room_id` except `sender`.
    pub fn to_room_except(&self, room_id: &str, sender: ConnId, event: ServerEvent) -> usize {
        self.fan_out(room_id, Some(sender), event)
    }

    pub fn to_conn(&self, conn_id: ConnId, event: ServerEvent) -> bool {
        self.channels()
            .conns
            .get(&conn_id)
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    fn fan_out(&self, room_id: &str, skip: Option<ConnId>, event: ServerEvent) -> usize {
        let channels = self.channels();
        let Some(conns) = channels.rooms.get(room_id) else {
            return 0;
        };

        conns
            .iter()
            .filter(|conn_id| Some(**conn_id) != skip)
            .filter_map(|conn_id| channels.conns.get(conn_id))
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }
}
