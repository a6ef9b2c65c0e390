//! stillepost-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen
//! Einstiegspunkt fuer Integrationstests bereit.

pub mod config;
pub mod rest;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;

use stillepost_core::StillepostError;
use stillepost_crypto::PfsSessionStore;
use stillepost_relay::RelayChannel;

use config::ServerConfig;
use rest::AppState;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. RelayChannel mit frischem Transport-Schluessel konstruieren
    /// 2. PFS-Store konstruieren und Aufraeum-Task starten
    /// 3. REST + Realtime binden
    /// 4. Auf Ctrl-C warten, dann Subsysteme stoppen
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %self.config.api_bind_adresse(),
            "Server startet"
        );

        // Relay und PFS-Store sind explizit konstruierte Instanzen –
        // der Transport-Schluessel lebt genau so lange wie der Server
        let relay = RelayChannel::mit_queue_groesse(self.config.relay.queue_groesse);
        let pfs = Arc::new(PfsSessionStore::neu());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Abgelaufene PFS-Sessions regelmaessig verwerfen
        let aufraeum_task = tokio::spawn(pfs_aufraeum_schleife(
            Arc::clone(&pfs),
            Duration::from_secs(self.config.pfs.aufraeum_intervall_sek),
            Duration::from_secs(self.config.pfs.session_ttl_sek),
            shutdown_rx,
        ));

        let state = AppState { relay, pfs };
        let app = rest::routes::router(state, &self.config.netzwerk.cors_origins);

        let listener = tokio::net::TcpListener::bind(self.config.api_bind_adresse())
            .await
            .map_err(StillepostError::Io)?;
        tracing::info!(adresse = %listener.local_addr()?, "REST + Realtime bereit");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
        let _ = shutdown_tx.send(true);
        let _ = aufraeum_task.await;

        Ok(())
    }
}

/// Wartet auf Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen");
    }
}

/// Periodischer Sweep ueber den PFS-Store
async fn pfs_aufraeum_schleife(
    pfs: Arc<PfsSessionStore>,
    intervall: Duration,
    session_ttl: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(intervall);
    // Erster Tick feuert sofort und wird uebersprungen
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                pfs.abgelaufene_entfernen(session_ttl);
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}
