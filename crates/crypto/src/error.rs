//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    // Absichtlich ohne Detail-Payload: die Ursache (falscher Schluessel,
    // manipulierter Ciphertext, falscher Tag) darf fuer Aufrufer nicht
    // unterscheidbar sein.
    #[error("Entschluesselung fehlgeschlagen")]
    EntschluesselungFehlgeschlagen,

    #[error("Ungueltiges Schluessel-Format: {0}")]
    UngueltigesSchluesselFormat(String),

    #[error("Ungueltiger Kurvenpunkt")]
    UngueltigerKurvenpunkt,

    #[error("Session nicht gefunden: {0}")]
    SessionNichtGefunden(String),

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Nonce-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeNonceLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Tag-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeTagLaenge { erwartet: usize, erhalten: usize },

    #[error("Zu wenige PBKDF2-Iterationen: mindestens {minimum}, erhalten {erhalten}")]
    ZuWenigeIterationen { minimum: u32, erhalten: u32 },

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),
}

/// Result-Alias fuer das Kryptografie-Subsystem
pub type CryptoResult<T> = Result<T, CryptoError>;
