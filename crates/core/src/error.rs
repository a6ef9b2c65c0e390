//! Fehlertypen fuer Stillepost
//!
//! Zentraler Fehler-Enum fuer Zustaende die nicht kryptografischer Natur
//! sind. Das Krypto-Crate definiert seine eigene Fehler-Taxonomie.

use thiserror::Error;

/// Globaler Result-Alias fuer Stillepost
pub type Result<T> = std::result::Result<T, StillepostError>;

/// Allgemeine Fehler im Stillepost-System
#[derive(Debug, Error)]
pub enum StillepostError {
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}
