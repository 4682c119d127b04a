//! Identity-code verification stub.
//!
//! Shape-only contract: GET describes the capability and returns a sample
//! token, POST answers success or fail against a hardcoded sentinel. A real
//! deployment replaces the sentinel comparison with a registry lookup.

use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const REGISTERED_CID: &str = "testcid";
const SAMPLE_TOKEN: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test_token";
const ISSUED_TOKEN: &str = "dummy_token";

#[derive(Debug, Deserialize)]
pub struct VerifyCidRequest {
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerifyCidResponse {
    Success { token: String },
    Fail { message: String },
}

/// Static capability descriptor plus a sample token
///
/// GET /api/cid/verify
pub async fn verify_info() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "CID API is running",
        "method": "GET",
        "test_token": SAMPLE_TOKEN,
    }))
}

/// Check an identity code; the phone is accepted but not consulted
///
/// POST /api/cid/verify
pub async fn verify_cid(Json(req): Json<VerifyCidRequest>) -> Json<VerifyCidResponse> {
    match req.cid.as_deref() {
        Some(REGISTERED_CID) => Json(VerifyCidResponse::Success {
            token: ISSUED_TOKEN.to_string(),
        }),
        _ => Json(VerifyCidResponse::Fail {
            message: "CID not registered".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(cid: Option<&str>) -> VerifyCidRequest {
        VerifyCidRequest {
            cid: cid.map(|c| c.to_string()),
            phone: Some("010-1111-2222".to_string()),
        }
    }

    #[tokio::test]
    async fn registered_cid_verifies() {
        let Json(response) = verify_cid(Json(request(Some("testcid")))).await;
        match response {
            VerifyCidResponse::Success { token } => assert_eq!(token, "dummy_token"),
            VerifyCidResponse::Fail { .. } => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn unknown_cid_fails() {
        let Json(response) = verify_cid(Json(request(Some("abc123")))).await;
        match response {
            VerifyCidResponse::Fail { message } => assert_eq!(message, "CID not registered"),
            VerifyCidResponse::Success { .. } => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn missing_cid_fails() {
        let Json(response) = verify_cid(Json(request(None))).await;
        assert!(matches!(response, VerifyCidResponse::Fail { .. }));
    }
}
