//! Wire-Events fuer den Realtime-Kanal
//!
//! Definiert die JSON-Ereignisse die zwischen Client und Relay fliessen.
//! Die Zuordnung eingehender Events zu Handlern erfolgt explizit ueber
//! ein `match` auf diesen Enum – keine implizite Event-Emission.

use serde::{Deserialize, Serialize};

/// Vom Client eingehende Ereignisse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Eine Klartext-Chat-Nachricht die das Relay verschluesselt verteilt
    Message {
        content: String,
        /// Anzeigename des Absenders (Standard: "anonym")
        #[serde(default)]
        sender: Option<String>,
    },
}

/// Vom Relay ausgehende Ereignisse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Verschluesselte Broadcast-Nachricht (alle Felder base64)
    Message {
        encrypted: String,
        iv: String,
        tag: String,
        sender: String,
    },
    /// Fehler – geht nur an die verursachende Verbindung
    Error { message: String },
}
