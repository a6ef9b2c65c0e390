//! Gemeinsame Identifikationstypen fuer Stillepost
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige ID eines verbundenen Peers am Relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    /// Erstellt eine neue zufaellige PeerId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_id_eindeutig() {
        let a = PeerId::new();
        let b = PeerId::new();
        assert_ne!(a, b, "Zwei neue PeerIds muessen verschieden sein");
    }

    #[test]
    fn peer_id_display() {
        let id = PeerId(Uuid::nil());
        assert!(id.to_string().starts_with("peer:"));
    }

    #[test]
    fn peer_id_ist_serde_kompatibel() {
        let id = PeerId::new();
        let json = serde_json::to_string(&id).unwrap();
        let id2: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, id2);
    }
}
