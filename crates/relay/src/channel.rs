//! RelayChannel – Verwaltet Peer-Mitgliedschaft und Broadcast-Fan-out
//!
//! Der RelayChannel haelt die Send-Queues aller verbundenen Peers und einen
//! eigenen, bei Konstruktion erzeugten Transport-Schluessel. Jede
//! eingehende Nachricht wird genau einmal verschluesselt und der Umschlag
//! an alle Peers verteilt – einschliesslich des Absenders.
//!
//! ## Langsame Peers
//! Die Send-Queue pro Peer ist begrenzt und wird nicht-blockierend
//! beschickt. Ein Peer der nicht mitkommt verliert Nachrichten statt den
//! Broadcast zu verzoegern; ein Peer dessen Queue geschlossen ist wird aus
//! der Mitgliedschaft entfernt.

use std::sync::Arc;

use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use tokio::sync::mpsc;

use stillepost_core::PeerId;
use stillepost_crypto::{verschluesseln, CipherEnvelope, SecretBytes};

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Standard-Groesse der Send-Queue pro Peer
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// Events und Handles
// ---------------------------------------------------------------------------

/// Ereignis das ein Peer aus seiner Empfangs-Queue liest
#[derive(Debug, Clone)]
pub enum RelayEvent {
    /// Verschluesselte Broadcast-Nachricht
    Nachricht {
        umschlag: CipherEnvelope,
        sender: String,
    },
    /// Fehler – wird nur an den verursachenden Peer gestellt
    Fehler { meldung: String },
}

/// Handle auf einen registrierten Peer
///
/// Wird bei `verbinden` ausgegeben und identifiziert den Peer bei
/// `veroeffentlichen` und `trennen`.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    pub peer_id: PeerId,
    pub label: String,
}

/// Send-Queue eines verbundenen Peers
struct PeerSender {
    label: String,
    tx: mpsc::Sender<RelayEvent>,
}

impl PeerSender {
    /// Stellt ein Event nicht-blockierend zu
    ///
    /// Gibt `false` zurueck wenn die Queue geschlossen ist (Peer getrennt).
    fn senden(&self, peer_id: &PeerId, event: RelayEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(peer = %peer_id, label = %self.label,
                    "Send-Queue voll – Nachricht verworfen");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(peer = %peer_id, label = %self.label,
                    "Send-Queue geschlossen (Peer getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RelayChannel
// ---------------------------------------------------------------------------

/// Zentraler Broadcast-Kanal mit eigenem Transport-Schluessel
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
/// Der Transport-Schluessel lebt genau so lange wie die Instanz und wird
/// nie aus E2E/PFS-Material abgeleitet.
#[derive(Clone)]
pub struct RelayChannel {
    inner: Arc<RelayChannelInner>,
}

struct RelayChannelInner {
    transport_schluessel: SecretBytes,
    peers: DashMap<PeerId, PeerSender>,
    queue_groesse: usize,
}

impl RelayChannel {
    /// Erstellt einen neuen RelayChannel mit frischem Transport-Schluessel
    pub fn neu() -> Self {
        Self::mit_queue_groesse(SEND_QUEUE_GROESSE)
    }

    /// Erstellt einen RelayChannel mit expliziter Queue-Groesse
    pub fn mit_queue_groesse(queue_groesse: usize) -> Self {
        let mut schluessel = vec![0u8; 32];
        OsRng.fill_bytes(&mut schluessel);

        Self {
            inner: Arc::new(RelayChannelInner {
                transport_schluessel: SecretBytes::new(schluessel),
                peers: DashMap::new(),
                queue_groesse,
            }),
        }
    }

    /// Registriert einen neuen Peer und gibt Handle + Empfangs-Queue zurueck
    pub fn verbinden(&self, label: &str) -> (PeerHandle, mpsc::Receiver<RelayEvent>) {
        let peer_id = PeerId::new();
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        self.inner.peers.insert(
            peer_id,
            PeerSender {
                label: label.to_string(),
                tx,
            },
        );
        tracing::info!(peer = %peer_id, label, "Peer verbunden");

        (
            PeerHandle {
                peer_id,
                label: label.to_string(),
            },
            rx,
        )
    }

    /// Entfernt einen Peer aus der Mitgliedschaft
    ///
    /// Idempotent: mehrfaches Trennen desselben Handles ist kein Fehler.
    pub fn trennen(&self, handle: &PeerHandle) {
        if self.inner.peers.remove(&handle.peer_id).is_some() {
            tracing::info!(peer = %handle.peer_id, label = %handle.label, "Peer getrennt");
        }
    }

    /// Verschluesselt eine Nachricht und verteilt sie an alle Peers
    ///
    /// Der Absender erhaelt den Broadcast ebenfalls. Schlaegt die
    /// Verschluesselung fehl, wird die Nachricht verworfen und nur der
    /// verursachende Peer bekommt ein Fehler-Event.
    pub fn veroeffentlichen(&self, ursprung: &PeerHandle, inhalt: &str, sender: &str) {
        let umschlag = match verschluesseln(
            inhalt.as_bytes(),
            self.inner.transport_schluessel.as_bytes(),
        ) {
            Ok(u) => u,
            Err(e) => {
                tracing::error!(peer = %ursprung.peer_id, fehler = %e,
                    "Transport-Verschluesselung fehlgeschlagen, Nachricht verworfen");
                self.an_peer_senden(
                    &ursprung.peer_id,
                    RelayEvent::Fehler {
                        meldung: "Nachricht konnte nicht verschluesselt werden".into(),
                    },
                );
                return;
            }
        };

        let mut tote_peers = Vec::new();
        for eintrag in self.inner.peers.iter() {
            let event = RelayEvent::Nachricht {
                umschlag: umschlag.clone(),
                sender: sender.to_string(),
            };
            if !eintrag.value().senden(eintrag.key(), event) {
                tote_peers.push(*eintrag.key());
            }
        }

        // Entfernen erst nach der Iteration (kein Mutieren waehrend iter)
        for peer_id in tote_peers {
            self.inner.peers.remove(&peer_id);
        }
    }

    /// Stellt ein Fehler-Event nur dem verursachenden Peer zu
    ///
    /// Fehlerhafte Eingaben eines Peers duerfen andere Peers nicht stoeren.
    pub fn fehler_melden(&self, handle: &PeerHandle, meldung: &str) {
        self.an_peer_senden(
            &handle.peer_id,
            RelayEvent::Fehler {
                meldung: meldung.to_string(),
            },
        );
    }

    /// Stellt ein Event gezielt einem einzelnen Peer zu
    fn an_peer_senden(&self, peer_id: &PeerId, event: RelayEvent) {
        if let Some(eintrag) = self.inner.peers.get(peer_id) {
            eintrag.value().senden(peer_id, event);
        }
    }

    /// Anzahl aktuell verbundener Peers
    pub fn mitglieder_anzahl(&self) -> usize {
        self.inner.peers.len()
    }

    #[cfg(test)]
    fn transport_schluessel(&self) -> &[u8] {
        self.inner.transport_schluessel.as_bytes()
    }
}

impl Default for RelayChannel {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
