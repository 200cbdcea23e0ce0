//! App Attest boundary types
//!
//! Wire shapes for the verification API. Binary inputs cross the
//! boundary as base64 strings; responses always carry `valid` and are
//! fail-closed (an error never propagates past the boundary).

use serde::{Deserialize, Serialize};

/// Request to verify a one-time attestation
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VerifyAttestationRequest {
    /// Base64-encoded CBOR attestation object
    pub attestation: String,
    /// Base64-encoded challenge previously issued to the device
    pub challenge: String,
    /// Base64-encoded key identifier from the device
    #[serde(rename = "keyId")]
    pub key_id: String,
    /// App identifier (team ID dot bundle ID)
    #[serde(rename = "appId")]
    pub app_id: String,
}

/// Result of attestation verification
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VerifyAttestationResponse {
    pub valid: bool,
    /// Base64 of the 64-byte x || y public key; persisted by the caller
    /// keyed by the credential ID, alongside an initial counter of 0
    #[serde(rename = "publicKey", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Request to verify a per-request assertion
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VerifyAssertionRequest {
    /// Base64-encoded CBOR assertion object
    pub assertion: String,
    /// The signed client data, verbatim
    #[serde(rename = "clientData")]
    pub client_data: String,
    /// Base64 of the stored 64-byte public key
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Last accepted counter for this credential
    #[serde(rename = "previousCounter")]
    pub previous_counter: u32,
}

/// Result of assertion verification
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VerifyAssertionResponse {
    pub valid: bool,
    /// The new counter; the caller must persist it atomically with
    /// respect to concurrent requests for the same credential
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
