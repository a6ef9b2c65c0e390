//! Realtime-Kanal – WebSocket-Anbindung an den RelayChannel
//!
//! Jede WebSocket-Verbindung wird als Peer am Relay registriert. Ein
//! eigener Task leitet die Empfangs-Queue des Peers an den Socket weiter,
//! waehrend die Leseschleife eingehende Events parst und dispatcht.
//!
//! Fehlerhafte Eingaben (kein JSON, unbekannter Event-Typ) erzeugen ein
//! Fehler-Event ausschliesslich an die verursachende Verbindung.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};

use stillepost_core::{ClientEvent, ServerEvent};
use stillepost_relay::{PeerHandle, RelayChannel, RelayEvent};

use crate::rest::AppState;

/// Absender-Label wenn der Client keines mitschickt
const ANONYM: &str = "anonym";

/// `GET /ws` – Upgrade auf den Realtime-Kanal
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| verbindung_verarbeiten(state, socket))
}

/// Verarbeitet eine einzelne WebSocket-Verbindung bis zum Disconnect
async fn verbindung_verarbeiten(state: AppState, socket: WebSocket) {
    let (handle, mut empfangs_queue) = state.relay.verbinden("ws-client");
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Queue -> Socket: laeuft bis die Queue oder der Socket schliesst
    let handle_fuer_task = handle.clone();
    let sende_task = tokio::spawn(async move {
        while let Some(event) = empfangs_queue.recv().await {
            let wire = event_zu_wire(event);
            let json = match serde_json::to_string(&wire) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(peer = %handle_fuer_task.peer_id, fehler = %e,
                        "Event-Serialisierung fehlgeschlagen");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Socket -> Relay
    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => eingehende_nachricht(&state.relay, &handle, &text),
            Message::Close(_) => break,
            // Ping/Pong beantwortet axum selbst, Binaer wird ignoriert
            _ => {}
        }
    }

    state.relay.trennen(&handle);
    sende_task.abort();
}

/// Parst und dispatcht ein eingehendes Client-Event
fn eingehende_nachricht(relay: &RelayChannel, handle: &PeerHandle, text: &str) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::Message { content, sender }) => {
            let sender = sender.unwrap_or_else(|| ANONYM.to_string());
            relay.veroeffentlichen(handle, &content, &sender);
        }
        Err(e) => {
            tracing::debug!(peer = %handle.peer_id, fehler = %e, "Ungueltiges Client-Event");
            relay.fehler_melden(handle, "Ungueltiges Nachrichtenformat");
        }
    }
}

/// Uebersetzt ein Relay-Event in das Wire-Format (base64-Felder)
fn event_zu_wire(event: RelayEvent) -> ServerEvent {
    use crate::rest::base64_kodieren;

    match event {
        RelayEvent::Nachricht { umschlag, sender } => ServerEvent::Message {
            encrypted: base64_kodieren(&umschlag.ciphertext),
            iv: base64_kodieren(umschlag.nonce.as_bytes()),
            tag: base64_kodieren(umschlag.tag.as_bytes()),
            sender,
        },
        RelayEvent::Fehler { meldung } => ServerEvent::Error { message: meldung },
    }
}
