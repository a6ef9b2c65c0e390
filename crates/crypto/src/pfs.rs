//! Ephemere Session-Schluessel (Perfect Forward Secrecy)
//!
//! Pro Session-ID wird genau ein ephemeres P-256-Paar vorgehalten. Der
//! private Teil bleibt im Prozess; nach aussen geht nur der oeffentliche
//! Teil als SPKI-PEM.
//!
//! ## Zustandsmaschine pro Session-ID
//! ```text
//! NoSession -> KeyGenerated -> SessionKeyDerived
//!                  ^   |
//!                  +---+  (erneutes Erzeugen ueberschreibt den alten Schluessel)
//! ```
//!
//! ## Ueberschreib-Politik
//! `ephemeren_schluessel_erzeugen` auf einer existierenden Session-ID
//! verwirft den alten privaten Schluessel. Laufende Ableitungen gegen den
//! alten oeffentlichen Schluessel werden damit rueckwirkend wertlos.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use p256::ecdh;
use p256::pkcs8::{EncodePublicKey, LineEnding};
use p256::SecretKey;
use rand::rngs::OsRng;

use crate::e2e::{hkdf_ableiten, oeffentlichen_schluessel_parsen};
use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

/// HKDF-Info-Label fuer die Session-Ableitung
///
/// Bewusst verschieden vom E2E-Label, damit beide Ableitungen selbst bei
/// versehentlich wiederverwendeten Kurven-Schluesseln nicht verknuepfbar sind.
const SESSION_INFO: &[u8] = b"session key";

/// Ein gespeicherter ephemerer Schluessel samt Erzeugungszeitpunkt
struct SessionEintrag {
    secret: SecretKey,
    erstellt: Instant,
}

/// Verwaltet ephemere Schluessel-Paare pro Session-ID
///
/// Thread-safe via DashMap. Erzeugen/Ueberschreiben und Ableiten auf
/// derselben Session-ID schliessen sich gegenseitig aus: die Ableitung
/// haelt den Shard-Guard der Map ueber die gesamte ECDH-Berechnung.
#[derive(Default)]
pub struct PfsSessionStore {
    sessions: DashMap<String, SessionEintrag>,
}

impl PfsSessionStore {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Erzeugt ein frisches ephemeres Paar fuer die Session-ID
    ///
    /// Gibt den oeffentlichen Teil als SPKI-PEM zurueck. Existiert die
    /// Session bereits, wird der alte private Schluessel ueberschrieben
    /// und ist danach unwiederbringlich.
    pub fn ephemeren_schluessel_erzeugen(&self, session_id: &str) -> CryptoResult<String> {
        if session_id.is_empty() {
            return Err(CryptoError::UngueltigeEingabe(
                "Session-ID darf nicht leer sein".into(),
            ));
        }

        let secret = SecretKey::random(&mut OsRng);
        let public_pem = secret
            .public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

        let vorher = self.sessions.insert(
            session_id.to_string(),
            SessionEintrag {
                secret,
                erstellt: Instant::now(),
            },
        );
        if vorher.is_some() {
            tracing::debug!(session_id, "Ephemerer Schluessel ueberschrieben");
        }

        Ok(public_pem)
    }

    /// Leitet den Session-Schluessel gegen einen Peer-Public-Key ab
    ///
    /// ECDH + HKDF-SHA256 mit dem Label `"session key"`. Schlaegt mit
    /// `SessionNichtGefunden` fehl wenn die Session nie initialisiert oder
    /// bereits geschlossen wurde.
    pub fn sitzungsschluessel_ableiten(
        &self,
        session_id: &str,
        peer_public_pem: &str,
    ) -> CryptoResult<SecretBytes> {
        let peer = oeffentlichen_schluessel_parsen(peer_public_pem)?;

        // Der Guard bleibt ueber die ECDH-Berechnung bestehen und blockiert
        // ein gleichzeitiges Ueberschreiben derselben Session-ID.
        let eintrag = self
            .sessions
            .get(session_id)
            .ok_or_else(|| CryptoError::SessionNichtGefunden(session_id.to_string()))?;

        let geteilt =
            ecdh::diffie_hellman(eintrag.secret.to_nonzero_scalar(), peer.as_affine());
        hkdf_ableiten(geteilt.raw_secret_bytes().as_slice(), SESSION_INFO)
    }

    /// Schliesst eine Session und verwirft ihren privaten Schluessel
    ///
    /// Idempotent: gibt `false` zurueck wenn die Session nicht (mehr) existiert.
    pub fn sitzung_schliessen(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Entfernt alle Sessions die aelter als `max_alter` sind
    ///
    /// Ohne diesen Sweep wuerden verlassene Sessions unbegrenzt akkumulieren.
    /// Gibt die Anzahl entfernter Sessions zurueck.
    pub fn abgelaufene_entfernen(&self, max_alter: Duration) -> usize {
        let vorher = self.sessions.len();
        self.sessions
            .retain(|_, eintrag| eintrag.erstellt.elapsed() < max_alter);
        let entfernt = vorher - self.sessions.len();
        if entfernt > 0 {
            tracing::info!(entfernt, "Abgelaufene PFS-Sessions entfernt");
        }
        entfernt
    }

    /// Anzahl aktiver Sessions
    pub fn anzahl(&self) -> usize {
        self.sessions.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erzeugen_liefert_public_pem() {
        let store = PfsSessionStore::neu();
        let pem = store.ephemeren_schluessel_erzeugen("s1").unwrap();
        assert!(pem.contains("BEGIN PUBLIC KEY"));
        assert_eq!(store.anzahl(), 1);
    }

    #[test]
    fn leere_session_id_abgelehnt() {
        let store = PfsSessionStore::neu();
        let result = store.ephemeren_schluessel_erzeugen("");
        assert!(matches!(result, Err(CryptoError::UngueltigeEingabe(_))));
    }

    #[test]
    fn ableitung_ist_symmetrisch() {
        // Zwei Parteien, gleiche logische Session, eigene Stores
        let alice = PfsSessionStore::neu();
        let bob = PfsSessionStore::neu();

        let alice_pub = alice.ephemeren_schluessel_erzeugen("s1").unwrap();
        let bob_pub = bob.ephemeren_schluessel_erzeugen("s1").unwrap();

        let k1 = alice.sitzungsschluessel_ableiten("s1", &bob_pub).unwrap();
        let k2 = bob.sitzungsschluessel_ableiten("s1", &alice_pub).unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes());
        assert_eq!(k1.len(), 32);
    }

    #[test]
    fn unbekannte_session_schlaegt_fehl() {
        let store = PfsSessionStore::neu();
        let peer = PfsSessionStore::neu();
        let peer_pub = peer.ephemeren_schluessel_erzeugen("x").unwrap();

        let result = store.sitzungsschluessel_ableiten("unbekannte_session", &peer_pub);
        assert!(matches!(
            result,
            Err(CryptoError::SessionNichtGefunden(_))
        ));
    }

    #[test]
    fn ueberschreiben_entwertet_alten_schluessel() {
        let alice = PfsSessionStore::neu();
        let bob = PfsSessionStore::neu();

        let alice_pub_alt = alice.ephemeren_schluessel_erzeugen("s1").unwrap();
        let bob_pub = bob.ephemeren_schluessel_erzeugen("s1").unwrap();

        // Schluessel gegen das alte Paar
        let alt = bob.sitzungsschluessel_ableiten("s1", &alice_pub_alt).unwrap();

        // Alice ueberschreibt ihr Paar – der alte private Teil ist weg
        let alice_pub_neu = alice.ephemeren_schluessel_erzeugen("s1").unwrap();
        assert_ne!(alice_pub_alt, alice_pub_neu);

        let neu = bob.sitzungsschluessel_ableiten("s1", &alice_pub_neu).unwrap();
        assert_ne!(
            alt.as_bytes(),
            neu.as_bytes(),
            "Ueberschreiben muss altes Schluesselmaterial entwerten"
        );

        // Alices Ableitung passt nur noch zum neuen Paar
        let alice_neu = alice.sitzungsschluessel_ableiten("s1", &bob_pub).unwrap();
        assert_eq!(alice_neu.as_bytes(), neu.as_bytes());
    }

    #[test]
    fn geschlossene_session_nicht_mehr_ableitbar() {
        let store = PfsSessionStore::neu();
        let peer = PfsSessionStore::neu();
        let peer_pub = peer.ephemeren_schluessel_erzeugen("p").unwrap();

        store.ephemeren_schluessel_erzeugen("s1").unwrap();
        assert!(store.sitzung_schliessen("s1"));
        // Idempotent
        assert!(!store.sitzung_schliessen("s1"));

        let result = store.sitzungsschluessel_ableiten("s1", &peer_pub);
        assert!(matches!(
            result,
            Err(CryptoError::SessionNichtGefunden(_))
        ));
    }

    #[test]
    fn sweep_entfernt_nur_abgelaufene() {
        let store = PfsSessionStore::neu();
        store.ephemeren_schluessel_erzeugen("frisch").unwrap();

        // Nichts ist aelter als eine Stunde
        assert_eq!(store.abgelaufene_entfernen(Duration::from_secs(3600)), 0);
        assert_eq!(store.anzahl(), 1);

        // Alles ist aelter als null
        assert_eq!(store.abgelaufene_entfernen(Duration::ZERO), 1);
        assert_eq!(store.anzahl(), 0);
    }

    #[test]
    fn kaputter_peer_key_stoert_session_nicht() {
        let store = PfsSessionStore::neu();
        store.ephemeren_schluessel_erzeugen("s1").unwrap();

        let result = store.sitzungsschluessel_ableiten("s1", "kein PEM");
        assert!(matches!(
            result,
            Err(CryptoError::UngueltigesSchluesselFormat(_))
        ));
        // Session bleibt nutzbar
        assert_eq!(store.anzahl(), 1);
    }
}
