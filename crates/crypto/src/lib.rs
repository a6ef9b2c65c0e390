//! # stillepost-crypto
//!
//! Kryptografischer Kern von Stillepost.
//!
//! ## Module
//! - `cipher` - Symmetrische AES-256-GCM Verschluesselung mit PBKDF2-Ableitung
//! - `e2e`    - Statischer P-256 Schluesselaustausch (Ende-zu-Ende)
//! - `pfs`    - Ephemere Session-Schluessel (Perfect Forward Secrecy)
//! - `types`  - Gemeinsame Typen (KeyPair, Nonce, CipherEnvelope, etc.)
//! - `error`  - Fehlertypen
//!
//! ## Vertrauensgrenzen
//! E2E- und PFS-Ableitungen nutzen unterschiedliche HKDF-Info-Labels und
//! sind dadurch kryptografisch nicht verknuepfbar. Der Transport-Schluessel
//! des Relays (siehe stillepost-relay) wird nie aus E2E/PFS-Material
//! abgeleitet.

pub mod cipher;
pub mod e2e;
pub mod error;
pub mod pfs;
pub mod types;

// Bequeme Re-Exports
pub use cipher::{entschluesseln, schluessel_ableiten, verschluesseln};
pub use e2e::{gemeinsamen_schluessel_ableiten, schluesselpaar_erzeugen};
pub use error::{CryptoError, CryptoResult};
pub use pfs::PfsSessionStore;
pub use types::{AuthTag, CipherEnvelope, KeyPair, Nonce, SecretBytes};
