//! Room hub: tracks which clients sit in which presentation room and fans
//! broadcasts out to them.
//!
//! All membership state lives inside a single task. Callers talk to it
//! through [`RoomHub`], a cloneable handle over a command channel, so there
//! is no shared lock and commands are applied strictly in arrival order.

use std::collections::HashMap;

use log::{debug, info};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::HubConfig;

use super::client::{Client, ClientId, Frame};

/// The hub task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("room hub is not running")]
pub struct HubClosed;

enum HubCommand {
    Register(Client),
    Unregister {
        room_id: String,
        client_id: ClientId,
    },
    Broadcast {
        room_id: String,
        frame: Frame,
    },
    Members {
        room_id: String,
        reply: oneshot::Sender<Vec<ClientId>>,
    },
    RoomCount {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

/// Handle to the hub task.
#[derive(Debug, Clone)]
pub struct RoomHub {
    commands: mpsc::Sender<HubCommand>,
}

impl std::fmt::Debug for HubCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HubCommand::Register(client) => write!(f, "Register({})", client.id),
            HubCommand::Unregister { client_id, .. } => write!(f, "Unregister({client_id})"),
            HubCommand::Broadcast { room_id, .. } => write!(f, "Broadcast({room_id})"),
            HubCommand::Members { room_id, .. } => write!(f, "Members({room_id})"),
            HubCommand::RoomCount { .. } => write!(f, "RoomCount"),
            HubCommand::Shutdown => write!(f, "Shutdown"),
        }
    }
}

impl RoomHub {
    /// Start the hub task.
    ///
    /// The task runs until [`RoomHub::shutdown`] is called or every handle
    /// has been dropped. On exit it closes every client queue.
    pub fn spawn(config: &HubConfig) -> (Self, JoinHandle<()>) {
        let (commands, inbox) = mpsc::channel(config.command_buffer.max(1));
        let task = tokio::spawn(run(inbox));
        (Self { commands }, task)
    }

    async fn send(&self, command: HubCommand) -> Result<(), HubClosed> {
        self.commands.send(command).await.map_err(|_| HubClosed)
    }

    /// Add a client to its room, creating the room if needed.
    pub async fn register(&self, client: Client) -> Result<(), HubClosed> {
        self.send(HubCommand::Register(client)).await
    }

    /// Remove a client. Unknown clients and rooms are ignored.
    pub async fn unregister(&self, room_id: &str, client_id: ClientId) -> Result<(), HubClosed> {
        self.send(HubCommand::Unregister {
            room_id: room_id.to_string(),
            client_id,
        })
        .await
    }

    /// Queue `frame` to every member of `room_id`.
    ///
    /// Never waits on a client: a member whose queue is full is evicted. An
    /// evicted client is not told which frame it missed; its socket is closed
    /// once the frames already queued have been written.
    pub async fn broadcast(&self, room_id: &str, frame: impl Into<Frame>) -> Result<(), HubClosed> {
        self.send(HubCommand::Broadcast {
            room_id: room_id.to_string(),
            frame: frame.into(),
        })
        .await
    }

    /// Current members of a room, sorted by id.
    pub async fn members(&self, room_id: &str) -> Result<Vec<ClientId>, HubClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Members {
            room_id: room_id.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| HubClosed)
    }

    /// Number of rooms with at least one member.
    pub async fn room_count(&self) -> Result<usize, HubClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::RoomCount { reply }).await?;
        rx.await.map_err(|_| HubClosed)
    }

    /// Stop the hub task. Commands already queued ahead of this one still run.
    pub async fn shutdown(&self) {
        let _ = self.send(HubCommand::Shutdown).await;
    }
}

async fn run(mut inbox: mpsc::Receiver<HubCommand>) {
    let mut rooms = Rooms::default();
    info!("Room hub started");

    while let Some(command) = inbox.recv().await {
        match command {
            HubCommand::Register(client) => rooms.register(client),
            HubCommand::Unregister { room_id, client_id } => rooms.unregister(&room_id, client_id),
            HubCommand::Broadcast { room_id, frame } => rooms.broadcast(&room_id, frame),
            HubCommand::Members { room_id, reply } => {
                let _ = reply.send(rooms.members(&room_id));
            }
            HubCommand::RoomCount { reply } => {
                let _ = reply.send(rooms.len());
            }
            HubCommand::Shutdown => break,
        }
    }

    let open = rooms.len();
    rooms.clear();
    info!("Room hub stopped ({} rooms closed)", open);
}

/// Room membership owned by the hub task.
#[derive(Default)]
struct Rooms {
    rooms: HashMap<String, HashMap<ClientId, Client>>,
}

impl Rooms {
    fn register(&mut self, client: Client) {
        debug!("Client {} joined room {}", client.id, client.room_id);
        self.rooms
            .entry(client.room_id.clone())
            .or_default()
            .insert(client.id, client);
    }

    fn unregister(&mut self, room_id: &str, client_id: ClientId) {
        let Some(members) = self.rooms.get_mut(room_id) else {
            return;
        };
        if members.remove(&client_id).is_some() {
            debug!("Client {} left room {}", client_id, room_id);
        }
        if members.is_empty() {
            self.rooms.remove(room_id);
        }
    }

    fn broadcast(&mut self, room_id: &str, frame: Frame) {
        let Some(members) = self.rooms.get_mut(room_id) else {
            debug!("Broadcast to empty room {}", room_id);
            return;
        };

        members.retain(|client_id, client| match client.try_push(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                info!("Evicting client {} from room {}: queue full", client_id, room_id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Dropping disconnected client {} from room {}", client_id, room_id);
                false
            }
        });

        if members.is_empty() {
            self.rooms.remove(room_id);
        }
    }

    fn members(&self, room_id: &str) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .rooms
            .get(room_id)
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    fn len(&self) -> usize {
        self.rooms.len()
    }

    fn clear(&mut self) {
        self.rooms.clear();
    }
}
