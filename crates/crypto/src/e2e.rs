//! Statischer P-256 Schluesselaustausch (Ende-zu-Ende)
//!
//! Zwei identifizierte Parteien erzeugen je ein statisches P-256-Paar und
//! leiten via ECDH + HKDF-SHA256 einen gemeinsamen 256-Bit-Schluessel ab.
//!
//! ## Ablauf
//! 1. Beide Seiten: `schluesselpaar_erzeugen()`
//! 2. Oeffentliche Schluessel out-of-band austauschen und verifizieren
//!    (Identitaetsbindung ist NICHT Aufgabe dieses Moduls)
//! 3. Beide Seiten: `gemeinsamen_schluessel_ableiten()` – das Ergebnis ist
//!    auf beiden Seiten identisch
//!
//! Das HKDF-Info-Label `"handshake data"` unterscheidet diese Ableitung von
//! der PFS-Session-Ableitung (`"session key"`, siehe `pfs`).

use hkdf::Hkdf;
use p256::ecdh;
use p256::pkcs8::{
    DecodePrivateKey, DecodePublicKey, Document, EncodePrivateKey, EncodePublicKey, LineEnding,
};
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{KeyPair, SecretBytes, SCHLUESSEL_LAENGE};

/// HKDF-Info-Label fuer die E2E-Ableitung
const E2E_INFO: &[u8] = b"handshake data";

/// Erzeugt ein frisches statisches P-256 Schluessel-Paar
///
/// Privater Teil als PKCS#8-PEM, oeffentlicher Teil als SPKI-PEM.
pub fn schluesselpaar_erzeugen() -> CryptoResult<KeyPair> {
    let secret = SecretKey::random(&mut OsRng);

    let private_key_pem = secret
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?
        .to_string();
    let public_key_pem = secret
        .public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

    Ok(KeyPair {
        private_key_pem,
        public_key_pem,
    })
}

/// Leitet den gemeinsamen E2E-Schluessel ab: ECDH + HKDF-SHA256
///
/// Symmetrisch: `ableiten(a_priv, b_pub) == ableiten(b_priv, a_pub)`.
pub fn gemeinsamen_schluessel_ableiten(
    eigener_private_pem: &str,
    peer_public_pem: &str,
) -> CryptoResult<SecretBytes> {
    let secret = privaten_schluessel_parsen(eigener_private_pem)?;
    let peer = oeffentlichen_schluessel_parsen(peer_public_pem)?;

    let geteilt = ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    hkdf_ableiten(geteilt.raw_secret_bytes().as_slice(), E2E_INFO)
}

/// Parst einen privaten P-256-Schluessel aus PKCS#8-PEM
pub(crate) fn privaten_schluessel_parsen(pem: &str) -> CryptoResult<SecretKey> {
    SecretKey::from_pkcs8_pem(pem)
        .map_err(|e| CryptoError::UngueltigesSchluesselFormat(e.to_string()))
}

/// Parst einen oeffentlichen P-256-Schluessel aus SPKI-PEM
///
/// Zweistufig: kaputtes PEM/DER ist ein Format-Fehler; strukturell gueltiges
/// DER dessen Punkt nicht auf der Kurve liegt (oder das neutrale Element
/// ist) ist ein Kurvenpunkt-Fehler.
pub(crate) fn oeffentlichen_schluessel_parsen(pem: &str) -> CryptoResult<PublicKey> {
    let (_label, doc) = Document::from_pem(pem)
        .map_err(|e| CryptoError::UngueltigesSchluesselFormat(e.to_string()))?;
    PublicKey::from_public_key_der(doc.as_bytes())
        .map_err(|_| CryptoError::UngueltigerKurvenpunkt)
}

/// Expandiert ein rohes ECDH-Geheimnis via HKDF-SHA256 zu 32 Bytes
///
/// Das Info-Label bindet den abgeleiteten Schluessel an seinen Zweck und
/// verhindert Schluessel-Wiederverwendung ueber Protokollgrenzen hinweg.
pub(crate) fn hkdf_ableiten(ikm: &[u8], info: &[u8]) -> CryptoResult<SecretBytes> {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = vec![0u8; SCHLUESSEL_LAENGE];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(SecretBytes::new(okm))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
