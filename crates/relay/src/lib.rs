//! # stillepost-relay
//!
//! Broadcast-Relay: nimmt Klartext-Nachrichten entgegen, verschluesselt sie
//! unter dem Transport-Schluessel des Relays neu und verteilt sie an alle
//! verbundenen Peers.
//!
//! Der Transport-Schluessel schuetzt ausschliesslich die Strecke
//! Relay <-> Client. Da alle Peers denselben Schluessel kennen, ist das
//! KEINE Ende-zu-Ende-Vertraulichkeit zwischen zwei Chat-Teilnehmern –
//! dafuer existiert die E2E/PFS-Schicht in stillepost-crypto.

pub mod channel;

pub use channel::{PeerHandle, RelayChannel, RelayEvent};
