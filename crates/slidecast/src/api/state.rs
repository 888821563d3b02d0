//! Application state shared across handlers.

use crate::config::{HubConfig, ServerConfig};
use crate::db::Database;
use crate::presentation::PresentationRepository;
use crate::slide::SlideService;
use crate::ws::RoomHub;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub presentations: PresentationRepository,
    pub slides: SlideService,
    /// Live room hub.
    pub hub: RoomHub,
    /// Per-socket queue and keepalive settings.
    pub hub_config: HubConfig,
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Wire repositories and services over one database and one hub.
    pub fn new(db: Database, hub: RoomHub, hub_config: HubConfig, server: &ServerConfig) -> Self {
        Self {
            presentations: PresentationRepository::new(db.clone()),
            slides: SlideService::new(db, hub.clone()),
            hub,
            hub_config,
            cors_origins: server.cors_origins.clone(),
        }
    }
}
