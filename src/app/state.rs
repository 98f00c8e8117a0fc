//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{GameHandle, GameServer};

use super::sessions::SessionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub game: GameHandle,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Build the shared state and the simulation task. The caller spawns
    /// the returned [`GameServer`]; everything else is cheaply cloneable.
    pub fn new(config: Config) -> (Self, GameServer) {
        let config = Arc::new(config);
        let (server, game) = GameServer::new(&config);

        let state = Self {
            config,
            game,
            sessions: Arc::new(SessionRegistry::new()),
        };
        (state, server)
    }
}
