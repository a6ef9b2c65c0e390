//! Routing-Tabelle der REST- und Realtime-Endpunkte
//!
//! Jede Operation ist hier explizit einem Handler zugeordnet.

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::rest::{handlers, AppState};
use crate::ws;

/// Erstellt den vollstaendigen Router
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    // CORS konfigurieren: entweder spezifische Origins oder Any
    let cors = if cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(tower_http::cors::Any)
    };

    Router::new()
        // Symmetrische Verschluesselung
        .route("/encrypt", post(handlers::encrypt))
        .route("/decrypt", post(handlers::decrypt))
        // E2E-Schluesselaustausch
        .route("/e2e/keypair", post(handlers::e2e_keypair))
        .route("/e2e/derive", post(handlers::e2e_derive))
        // PFS-Sessions
        .route("/pfs/session", post(handlers::pfs_session))
        .route("/pfs/derive", post(handlers::pfs_derive))
        // Realtime-Kanal
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
