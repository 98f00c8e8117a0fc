//! Transport-side session bookkeeping

use dashmap::DashMap;
use uuid::Uuid;

use crate::util::time::unix_millis;

/// Registry of connected WebSocket sessions, maintained by the transport
/// tasks. The simulation loop keeps its own per-session state; this map
/// exists for connection counting and diagnostics.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionHandle>,
}

struct SessionHandle {
    connected_at: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn register(&self, session_id: Uuid) {
        self.sessions.insert(
            session_id,
            SessionHandle {
                connected_at: unix_millis(),
            },
        );
    }

    /// Remove a session, returning its connect timestamp if it was present
    pub fn unregister(&self, session_id: Uuid) -> Option<u64> {
        self.sessions
            .remove(&session_id)
            .map(|(_, handle)| handle.connected_at)
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_unregister_roundtrip() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();

        registry.register(id);
        assert_eq!(registry.count(), 1);

        assert!(registry.unregister(id).is_some());
        assert_eq!(registry.count(), 0);
        assert!(registry.unregister(id).is_none());
    }
}
