//! REST-Handler fuer die Krypto-Endpunkte
//!
//! Alle Binaerfelder sind base64-kodiert; Schluessel-PEMs werden
//! base64-umhuellt transportiert.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use stillepost_crypto::{
    entschluesseln, gemeinsamen_schluessel_ableiten, schluesselpaar_erzeugen, verschluesseln,
};

use crate::rest::{base64_feld, base64_kodieren, pem_feld, ApiError, ApiJson, AppState};

// ---------------------------------------------------------------------------
// Symmetrische Verschluesselung
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EncryptBody {
    pub key: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct EncryptResponse {
    pub ciphertext: String,
    pub iv: String,
    pub tag: String,
}

/// `POST /encrypt` – verschluesselt Daten unter einem Aufrufer-Schluessel
pub async fn encrypt(
    State(_state): State<AppState>,
    ApiJson(body): ApiJson<EncryptBody>,
) -> Result<Json<EncryptResponse>, ApiError> {
    let key = base64_feld("key", &body.key)?;
    let data = base64_feld("data", &body.data)?;

    let umschlag = verschluesseln(&data, &key)?;

    Ok(Json(EncryptResponse {
        ciphertext: base64_kodieren(&umschlag.ciphertext),
        iv: base64_kodieren(umschlag.nonce.as_bytes()),
        tag: base64_kodieren(umschlag.tag.as_bytes()),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DecryptBody {
    pub key: String,
    pub ciphertext: String,
    pub iv: String,
    pub tag: String,
}

#[derive(Debug, Serialize)]
pub struct DecryptResponse {
    pub data: String,
}

/// `POST /decrypt` – entschluesselt und verifiziert einen Umschlag
pub async fn decrypt(
    State(_state): State<AppState>,
    ApiJson(body): ApiJson<DecryptBody>,
) -> Result<Json<DecryptResponse>, ApiError> {
    let key = base64_feld("key", &body.key)?;
    let ciphertext = base64_feld("ciphertext", &body.ciphertext)?;
    let iv = base64_feld("iv", &body.iv)?;
    let tag = base64_feld("tag", &body.tag)?;

    let klartext = entschluesseln(&ciphertext, &key, &iv, &tag)?;

    Ok(Json(DecryptResponse {
        data: base64_kodieren(&klartext),
    }))
}

// ---------------------------------------------------------------------------
// E2E-Schluesselaustausch
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct KeyPairResponse {
    pub private_key: String,
    pub public_key: String,
}

/// `POST /e2e/keypair` – erzeugt ein statisches P-256-Paar
pub async fn e2e_keypair(
    State(_state): State<AppState>,
) -> Result<Json<KeyPairResponse>, ApiError> {
    let paar = schluesselpaar_erzeugen()?;

    Ok(Json(KeyPairResponse {
        private_key: base64_kodieren(paar.private_key_pem.as_bytes()),
        public_key: base64_kodieren(paar.public_key_pem.as_bytes()),
    }))
}

#[derive(Debug, Deserialize)]
pub struct E2eDeriveBody {
    pub private_key: String,
    pub peer_public_key: String,
}

#[derive(Debug, Serialize)]
pub struct E2eDeriveResponse {
    pub shared_key: String,
}

/// `POST /e2e/derive` – leitet den gemeinsamen E2E-Schluessel ab
pub async fn e2e_derive(
    State(_state): State<AppState>,
    ApiJson(body): ApiJson<E2eDeriveBody>,
) -> Result<Json<E2eDeriveResponse>, ApiError> {
    let private_pem = pem_feld("private_key", &body.private_key)?;
    let peer_pem = pem_feld("peer_public_key", &body.peer_public_key)?;

    let schluessel = gemeinsamen_schluessel_ableiten(&private_pem, &peer_pem)?;

    Ok(Json(E2eDeriveResponse {
        shared_key: base64_kodieren(schluessel.as_bytes()),
    }))
}

// ---------------------------------------------------------------------------
// PFS-Sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PfsSessionBody {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct PfsSessionResponse {
    pub public_key: String,
}

/// `POST /pfs/session` – erzeugt den ephemeren Schluessel einer Session
pub async fn pfs_session(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PfsSessionBody>,
) -> Result<Json<PfsSessionResponse>, ApiError> {
    let public_pem = state.pfs.ephemeren_schluessel_erzeugen(&body.session_id)?;

    Ok(Json(PfsSessionResponse {
        public_key: base64_kodieren(public_pem.as_bytes()),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PfsDeriveBody {
    pub session_id: String,
    pub peer_public_key: String,
}

#[derive(Debug, Serialize)]
pub struct PfsDeriveResponse {
    pub session_key: String,
}

/// `POST /pfs/derive` – leitet den Session-Schluessel gegen einen Peer ab
pub async fn pfs_derive(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PfsDeriveBody>,
) -> Result<Json<PfsDeriveResponse>, ApiError> {
    let peer_pem = pem_feld("peer_public_key", &body.peer_public_key)?;

    let schluessel = state
        .pfs
        .sitzungsschluessel_ableiten(&body.session_id, &peer_pem)?;

    Ok(Json(PfsDeriveResponse {
        session_key: base64_kodieren(schluessel.as_bytes()),
    }))
}
