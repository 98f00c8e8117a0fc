//! Authoritative simulation modules

pub mod classes;
pub mod combat;
pub mod entity;
pub mod physics;
pub mod server;
pub mod snapshot;
pub mod world;

pub use server::{GameHandle, GameServer};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

use self::entity::ActionSlot;

/// Commands crossing from the transport tasks into the simulation loop
#[derive(Debug)]
pub enum GameCmd {
    /// A WebSocket session connected; carries its outbound send queue
    Connect {
        session_id: Uuid,
        outbound: mpsc::UnboundedSender<ServerMsg>,
    },
    /// A parsed client message for a connected session
    Message {
        session_id: Uuid,
        msg: ClientMsg,
        received_at: u64,
    },
    /// The session's socket closed
    Disconnect { session_id: Uuid },
}

/// Latest movement/action intent for a session. Superseded by each new
/// input message; only the most recent intent is consumed per tick.
/// The wire-level facing hint is dropped here: authoritative facing
/// derives from the movement axes alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentState {
    pub move_x: f32,
    pub move_y: f32,
    pub attack: bool,
    pub q: bool,
    pub e: bool,
    pub x: bool,
}

impl IntentState {
    /// Whether the given action slot is requested
    pub fn wants(&self, slot: ActionSlot) -> bool {
        match slot {
            ActionSlot::Basic => self.attack,
            ActionSlot::Q => self.q,
            ActionSlot::E => self.e,
            ActionSlot::X => self.x,
        }
    }
}
