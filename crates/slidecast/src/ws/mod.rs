//! Live room fan-out over WebSocket.
//!
//! ```text
//!   vote / slide edit (HTTP)
//!            │
//!            ▼
//!   ┌──────────────────┐  Register / Unregister / Broadcast
//!   │     RoomHub      │◄──────────────── handles (cloneable)
//!   │  (single task)   │
//!   └────────┬─────────┘
//!            │ try_send, evict when full
//!   ┌────────▼─────────┐
//!   │ client queue (N) │──► writer task ──► socket
//!   └──────────────────┘
//! ```

mod client;
mod handler;
mod hub;
mod types;

pub use client::{Client, ClientId, Frame, WriterExit, run_writer};
pub use handler::{WsQuery, ws_handler};
pub use hub::{HubClosed, RoomHub};
pub use types::RoomEvent;
