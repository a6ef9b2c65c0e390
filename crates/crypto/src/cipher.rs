//! Symmetrische AES-256-GCM Verschluesselung mit PBKDF2-Schluessel-Ableitung
//!
//! ## Format
//! `verschluesseln` liefert einen [`CipherEnvelope`] mit getrennten Feldern:
//! ```text
//! { ciphertext, nonce(12), tag(16) }
//! ```
//!
//! ## Nonce-Disziplin
//! Jeder Aufruf von `verschluesseln` zieht eine frische 96-Bit-Nonce aus
//! OsRng. Ein (Schluessel, Nonce)-Paar darf sich nie wiederholen.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{AuthTag, CipherEnvelope, Nonce, SecretBytes, SCHLUESSEL_LAENGE, TAG_LAENGE};

/// Mindestanzahl PBKDF2-Iterationen
pub const MIN_ITERATIONEN: u32 = 100_000;

/// Leitet einen 256-Bit-Schluessel aus Passwort und Salt ab (PBKDF2-HMAC-SHA256)
///
/// Deterministisch: gleiche (Passwort, Salt, Iterationen) ergeben immer den
/// gleichen Schluessel. Das Salt muss vom Aufrufer stammen und pro Passwort
/// eindeutig sein.
pub fn schluessel_ableiten(
    passwort: &[u8],
    salt: &[u8],
    iterationen: u32,
) -> CryptoResult<SecretBytes> {
    if iterationen < MIN_ITERATIONEN {
        return Err(CryptoError::ZuWenigeIterationen {
            minimum: MIN_ITERATIONEN,
            erhalten: iterationen,
        });
    }
    if salt.is_empty() {
        return Err(CryptoError::UngueltigeEingabe(
            "Salt darf nicht leer sein".into(),
        ));
    }

    let mut schluessel = vec![0u8; SCHLUESSEL_LAENGE];
    pbkdf2_hmac::<Sha256>(passwort, salt, iterationen, &mut schluessel);
    Ok(SecretBytes::new(schluessel))
}

/// Verschluesselt Klartext unter einem 256-Bit-Schluessel
///
/// Leerer Klartext ist gueltig. Fehler treten nur bei falscher
/// Schluessel-Laenge oder Versagen der Primitive auf.
pub fn verschluesseln(plaintext: &[u8], schluessel: &[u8]) -> CryptoResult<CipherEnvelope> {
    let cipher = cipher_bauen(schluessel)?;
    let nonce = Nonce::zufaellig();

    // aes-gcm haengt den Tag an den Ciphertext an; fuer den Umschlag
    // werden die beiden Teile wieder getrennt
    let mut ct_mit_tag = cipher
        .encrypt(AesNonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    let tag_start = ct_mit_tag.len() - TAG_LAENGE;
    let tag = AuthTag::aus_slice(&ct_mit_tag[tag_start..])?;
    ct_mit_tag.truncate(tag_start);

    Ok(CipherEnvelope {
        ciphertext: ct_mit_tag,
        nonce,
        tag,
    })
}

/// Entschluesselt und verifiziert Ciphertext + Nonce + Tag
///
/// Falscher Schluessel, manipulierter Ciphertext und falscher Tag sind fuer
/// den Aufrufer nicht unterscheidbar – alle enden in dem einheitlichen
/// [`CryptoError::EntschluesselungFehlgeschlagen`] ohne Detail-Payload.
pub fn entschluesseln(
    ciphertext: &[u8],
    schluessel: &[u8],
    nonce: &[u8],
    tag: &[u8],
) -> CryptoResult<Vec<u8>> {
    let cipher = cipher_bauen(schluessel)?;
    let nonce = Nonce::aus_slice(nonce)?;
    let tag = AuthTag::aus_slice(tag)?;

    let mut ct_mit_tag = Vec::with_capacity(ciphertext.len() + TAG_LAENGE);
    ct_mit_tag.extend_from_slice(ciphertext);
    ct_mit_tag.extend_from_slice(tag.as_bytes());

    cipher
        .decrypt(AesNonce::from_slice(nonce.as_bytes()), ct_mit_tag.as_slice())
        .map_err(|_| CryptoError::EntschluesselungFehlgeschlagen)
}

fn cipher_bauen(schluessel: &[u8]) -> CryptoResult<Aes256Gcm> {
    if schluessel.len() != SCHLUESSEL_LAENGE {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: SCHLUESSEL_LAENGE,
            erhalten: schluessel.len(),
        });
    }
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(schluessel)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rand::RngCore;

    fn zufalls_schluessel() -> Vec<u8> {
        let mut key = vec![0u8; 32];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn roundtrip() {
        let key = zufalls_schluessel();
        let plaintext = b"Stille Post geht reihum";

        let env = verschluesseln(plaintext, &key).unwrap();
        let decrypted =
            entschluesseln(&env.ciphertext, &key, env.nonce.as_bytes(), env.tag.as_bytes())
                .unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn leerer_klartext_ist_gueltig() {
        let key = zufalls_schluessel();
        let env = verschluesseln(b"", &key).unwrap();
        let decrypted =
            entschluesseln(&env.ciphertext, &key, env.nonce.as_bytes(), env.tag.as_bytes())
                .unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn falscher_schluessel_schlaegt_fehl() {
        let key1 = zufalls_schluessel();
        let key2 = zufalls_schluessel();

        let env = verschluesseln(b"geheim", &key1).unwrap();
        let result =
            entschluesseln(&env.ciphertext, &key2, env.nonce.as_bytes(), env.tag.as_bytes());

        assert!(matches!(
            result,
            Err(CryptoError::EntschluesselungFehlgeschlagen)
        ));
    }

    #[test]
    fn manipulierter_ciphertext_schlaegt_fehl() {
        let key = zufalls_schluessel();
        let mut env = verschluesseln(b"Original-Nachricht", &key).unwrap();
        env.ciphertext[0] ^= 0x01;

        let result =
            entschluesseln(&env.ciphertext, &key, env.nonce.as_bytes(), env.tag.as_bytes());
        assert!(matches!(
            result,
            Err(CryptoError::EntschluesselungFehlgeschlagen)
        ));
    }

    #[test]
    fn manipulierte_nonce_schlaegt_fehl() {
        let key = zufalls_schluessel();
        let env = verschluesseln(b"Nachricht", &key).unwrap();
        let mut nonce = *env.nonce.as_bytes();
        nonce[11] ^= 0x80;

        let result = entschluesseln(&env.ciphertext, &key, &nonce, env.tag.as_bytes());
        assert!(matches!(
            result,
            Err(CryptoError::EntschluesselungFehlgeschlagen)
        ));
    }

    #[test]
    fn manipulierter_tag_schlaegt_fehl() {
        let key = zufalls_schluessel();
        let env = verschluesseln(b"Nachricht", &key).unwrap();
        let mut tag = *env.tag.as_bytes();
        tag[7] ^= 0x04;

        let result = entschluesseln(&env.ciphertext, &key, env.nonce.as_bytes(), &tag);
        assert!(matches!(
            result,
            Err(CryptoError::EntschluesselungFehlgeschlagen)
        ));
    }

    #[test]
    fn falsche_schluessel_laenge() {
        let result = verschluesseln(b"x", &[0u8; 16]);
        assert!(matches!(
            result,
            Err(CryptoError::UngueltigeSchluesselLaenge { erwartet: 32, erhalten: 16 })
        ));
    }

    #[test]
    fn schluessel_ableitung_deterministisch() {
        let a = schluessel_ableiten(b"passwort", b"salz1234", 100_000).unwrap();
        let b = schluessel_ableiten(b"passwort", b"salz1234", 100_000).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn anderes_salt_anderer_schluessel() {
        let a = schluessel_ableiten(b"passwort", b"salz-a", 100_000).unwrap();
        let b = schluessel_ableiten(b"passwort", b"salz-b", 100_000).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn zu_wenige_iterationen_abgelehnt() {
        let result = schluessel_ableiten(b"pw", b"salz", 1_000);
        assert!(matches!(
            result,
            Err(CryptoError::ZuWenigeIterationen { minimum: 100_000, erhalten: 1_000 })
        ));
    }

    #[test]
    fn leeres_salt_abgelehnt() {
        let result = schluessel_ableiten(b"pw", b"", 100_000);
        assert!(matches!(result, Err(CryptoError::UngueltigeEingabe(_))));
    }

    #[test]
    fn nonces_wiederholen_sich_nicht() {
        use std::collections::HashSet;

        let key = zufalls_schluessel();
        let mut gesehen = HashSet::new();
        for _ in 0..10_000 {
            let env = verschluesseln(b"n", &key).unwrap();
            assert!(
                gesehen.insert(*env.nonce.as_bytes()),
                "Nonce-Wiederholung unter demselben Schluessel"
            );
        }
    }
}
