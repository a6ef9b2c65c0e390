//! REST-Schicht: Zustand, Fehler-Mapping und Routen
//!
//! Die Handler sind duenne Uebersetzer zwischen JSON-DTOs (alle
//! Binaerfelder base64) und dem Krypto-Kern. Die Routing-Tabelle in
//! `routes.rs` ist die einzige Stelle an der Operationen auf Handler
//! abgebildet werden.

pub mod handlers;
pub mod routes;

use std::sync::Arc;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;

use stillepost_crypto::{CryptoError, PfsSessionStore};
use stillepost_relay::RelayChannel;

/// Gemeinsamer Zustand aller REST- und Realtime-Handler
///
/// Relay und PFS-Store werden explizit beim Server-Start konstruiert und
/// hier injiziert – es gibt keinen ambienten globalen Zustand.
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayChannel,
    pub pfs: Arc<PfsSessionStore>,
}

/// Fehler der REST-Schicht mit HTTP-Status-Zuordnung
#[derive(Debug)]
pub enum ApiError {
    /// Fehlendes/fehlerhaftes Request-Feld (z.B. kaputtes base64)
    Eingabe(String),
    /// Fehler aus dem Krypto-Kern
    Krypto(CryptoError),
}

impl From<CryptoError> for ApiError {
    fn from(e: CryptoError) -> Self {
        Self::Krypto(e)
    }
}

impl ApiError {
    /// HTTP-Status zur Fehlerklasse
    ///
    /// Entschluesselungs-Fehler (422) sind bewusst von Eingabe-Fehlern
    /// (400) unterscheidbar, interne Primitive-Fehler werden generisch
    /// als 500 gemeldet.
    fn status(&self) -> StatusCode {
        match self {
            Self::Eingabe(_) => StatusCode::BAD_REQUEST,
            Self::Krypto(e) => match e {
                CryptoError::EntschluesselungFehlgeschlagen => StatusCode::UNPROCESSABLE_ENTITY,
                CryptoError::SessionNichtGefunden(_) => StatusCode::NOT_FOUND,
                CryptoError::UngueltigeEingabe(_)
                | CryptoError::UngueltigesSchluesselFormat(_)
                | CryptoError::UngueltigerKurvenpunkt
                | CryptoError::UngueltigeSchluesselLaenge { .. }
                | CryptoError::UngueltigeNonceLaenge { .. }
                | CryptoError::UngueltigeTagLaenge { .. }
                | CryptoError::ZuWenigeIterationen { .. } => StatusCode::BAD_REQUEST,
                CryptoError::SchluesselGenerierung(_)
                | CryptoError::Verschluesselung(_)
                | CryptoError::KeyDerivation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Interne Fehler landen im Log, nie beim Aufrufer
        let meldung = if status == StatusCode::INTERNAL_SERVER_ERROR {
            if let Self::Krypto(e) = &self {
                tracing::error!(fehler = %e, "Interner Krypto-Fehler");
            }
            "Interner Fehler".to_string()
        } else {
            match &self {
                Self::Eingabe(m) => m.clone(),
                Self::Krypto(e) => e.to_string(),
            }
        };

        (status, Json(json!({ "error": meldung }))).into_response()
    }
}

/// Json-Extractor fuer Request-Bodies
///
/// Deserialisierungs-Fehler (fehlendes Feld, kaputtes JSON) werden als
/// [`ApiError::Eingabe`] gemeldet und landen damit bei 400. Axums
/// Standard-Rejection wuerde 422 liefern – der Status ist hier fuer
/// fehlgeschlagene Entschluesselung reserviert.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(wert) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::Eingabe(e.body_text()))?;
        Ok(Self(wert))
    }
}

/// Dekodiert ein base64-Request-Feld
pub(crate) fn base64_feld(feld: &str, wert: &str) -> Result<Vec<u8>, ApiError> {
    BASE64
        .decode(wert)
        .map_err(|_| ApiError::Eingabe(format!("Feld '{feld}' ist kein gueltiges base64")))
}

/// Dekodiert ein base64-umhuelltes PEM-Feld zu einem String
pub(crate) fn pem_feld(feld: &str, wert: &str) -> Result<String, ApiError> {
    let bytes = base64_feld(feld, wert)?;
    String::from_utf8(bytes)
        .map_err(|_| ApiError::Eingabe(format!("Feld '{feld}' ist kein gueltiges PEM")))
}

/// Kodiert Bytes als base64 fuer Response-Felder
pub(crate) fn base64_kodieren(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entschluesselungs_fehler_ist_422() {
        let e = ApiError::Krypto(CryptoError::EntschluesselungFehlgeschlagen);
        assert_eq!(e.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn eingabe_fehler_ist_400() {
        let e = ApiError::Eingabe("kaputt".into());
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn session_fehler_ist_404() {
        let e = ApiError::Krypto(CryptoError::SessionNichtGefunden("s1".into()));
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn interner_fehler_ist_500() {
        let e = ApiError::Krypto(CryptoError::Verschluesselung("rng kaputt".into()));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn base64_feld_fehler() {
        let result = base64_feld("key", "kein base64 !!");
        assert!(matches!(result, Err(ApiError::Eingabe(_))));
    }

    #[test]
    fn base64_roundtrip() {
        let kodiert = base64_kodieren(b"abc");
        assert_eq!(base64_feld("x", &kodiert).unwrap(), b"abc");
    }

    fn json_request(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/decrypt")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn fehlendes_feld_ist_400_nicht_422() {
        use crate::rest::handlers::DecryptBody;

        // Body ohne "tag" – darf nicht mit dem Auth-Fehler-Status (422)
        // zusammenfallen
        let req = json_request(r#"{"key":"a2V5","ciphertext":"Y3Q=","iv":"aXY="}"#);
        let fehler = ApiJson::<DecryptBody>::from_request(req, &())
            .await
            .err()
            .expect("fehlendes Feld muss abgelehnt werden");

        assert_eq!(fehler.status(), StatusCode::BAD_REQUEST);
        assert_ne!(fehler.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn kaputtes_json_ist_400() {
        use crate::rest::handlers::EncryptBody;

        let req = json_request("kein json");
        let fehler = ApiJson::<EncryptBody>::from_request(req, &())
            .await
            .err()
            .expect("kaputtes JSON muss abgelehnt werden");

        assert!(matches!(fehler, ApiError::Eingabe(_)));
        assert_eq!(fehler.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn vollstaendiger_body_wird_geparst() {
        use crate::rest::handlers::EncryptBody;

        let req = json_request(r#"{"key":"a2V5","data":"ZGF0YQ=="}"#);
        let ApiJson(body) = ApiJson::<EncryptBody>::from_request(req, &())
            .await
            .expect("vollstaendiger Body muss geparst werden");
        assert_eq!(body.key, "a2V5");
    }
}
