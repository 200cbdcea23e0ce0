//! Attestation verification
//!
//! One-time verification that a key was generated by a genuine app
//! instance on genuine hardware. Every step is a hard fail-closed
//! gate; any single failure aborts the whole verification.

use ring::constant_time;
use ring::digest;

use crate::authenticator_data::AuthenticatorData;
use crate::cbor::{self, CborValue};
use crate::chain::{self, ChainValidator};
use crate::errors::AppAttestError;
use crate::settings::AttestEnvironment;

/// The only attestation format App Attest produces
const EXPECTED_FORMAT: &str = "apple-appattest";

/// Decoded attestation object
#[derive(Debug, Clone)]
pub struct AttestationEnvelope {
    /// Attestation format tag (`fmt`)
    pub format: String,
    /// DER certificate chain, leaf first (`attStmt.x5c`)
    pub certificates: Vec<Vec<u8>>,
    /// Raw authenticator data (`authData`)
    pub auth_data: Vec<u8>,
}

impl AttestationEnvelope {
    /// Decode an attestation object from CBOR bytes
    ///
    /// The attestation statement's `receipt` field is tolerated and
    /// ignored; receipt exchange is not this crate's concern.
    ///
    /// # Errors
    /// Returns a decoder error for malformed CBOR, or `MalformedInput`
    /// if a required field is absent or has the wrong type.
    pub fn decode(bytes: &[u8]) -> Result<Self, AppAttestError> {
        let value = cbor::decode(bytes)?;

        let format = value
            .map_get_text("fmt")
            .and_then(CborValue::as_text)
            .ok_or_else(|| AppAttestError::MalformedInput("missing fmt".into()))?
            .to_string();

        let statement = value
            .map_get_text("attStmt")
            .ok_or_else(|| AppAttestError::MalformedInput("missing attStmt".into()))?;
        let CborValue::Array(chain_values) = statement
            .map_get_text("x5c")
            .ok_or_else(|| AppAttestError::MalformedInput("missing x5c".into()))?
        else {
            return Err(AppAttestError::MalformedInput("x5c is not an array".into()));
        };
        let mut certificates = Vec::with_capacity(chain_values.len());
        for entry in chain_values {
            let der = entry
                .as_bytes()
                .ok_or_else(|| AppAttestError::MalformedInput("x5c entry is not bytes".into()))?;
            certificates.push(der.to_vec());
        }

        let auth_data = value
            .map_get_text("authData")
            .and_then(CborValue::as_bytes)
            .ok_or_else(|| AppAttestError::MalformedInput("missing authData".into()))?
            .to_vec();

        Ok(Self {
            format,
            certificates,
            auth_data,
        })
    }
}

/// A successfully attested credential
#[derive(Debug, Clone)]
pub struct AttestedCredential {
    /// Uncompressed P-256 coordinates, x then y
    pub public_key: [u8; 64],
}

/// Verify an attestation object and extract the credential public key
///
/// The caller persists the returned key material keyed by `key_id`,
/// alongside an initial replay counter of 0.
///
/// # Errors
/// Returns the error kind of the first gate that fails; see
/// [`AppAttestError`] for the full taxonomy.
pub fn verify_attestation(
    validator: &ChainValidator,
    environment: AttestEnvironment,
    attestation_object: &[u8],
    challenge: &[u8],
    key_id: &[u8],
    app_id: &str,
) -> Result<AttestedCredential, AppAttestError> {
    // 1. Decode the envelope and check the format tag
    let envelope = AttestationEnvelope::decode(attestation_object)?;
    if envelope.format != EXPECTED_FORMAT {
        return Err(AppAttestError::FormatMismatch);
    }

    // 2. The chain must hold the credential certificate plus at least
    //    one intermediate
    if envelope.certificates.len() < 2 {
        return Err(AppAttestError::MissingCertificateChain);
    }

    // 3. Parse authenticator data
    let auth = AuthenticatorData::parse(&envelope.auth_data)?;

    // 4. Bind the attestation to this app
    auth.verify_app_id(app_id)?;

    // 5. Extract the EC coordinates from the COSE key
    let credential = auth
        .attested_credential
        .as_ref()
        .ok_or(AppAttestError::MissingPublicKey)?;
    let x = cose_coordinate(&credential.public_key, -2)?;
    let y = cose_coordinate(&credential.public_key, -3)?;

    // 6. Recompute the nonce and compare it against the digest embedded
    //    in the credential certificate
    let challenge_hash = digest::digest(&digest::SHA256, challenge);
    let mut nonce_input = Vec::with_capacity(envelope.auth_data.len() + 32);
    nonce_input.extend_from_slice(&envelope.auth_data);
    nonce_input.extend_from_slice(challenge_hash.as_ref());
    let expected_nonce = digest::digest(&digest::SHA256, &nonce_input);
    let certificate_nonce = chain::extract_nonce(&envelope.certificates[0])?;
    constant_time::verify_slices_are_equal(expected_nonce.as_ref(), &certificate_nonce)
        .map_err(|_| AppAttestError::NonceMismatch)?;

    // 7. Validate the chain against the pinned root
    validator.validate(&envelope.certificates)?;

    // 8. The key identifier is the SHA-256 of the uncompressed public
    //    key point, and must also appear as the credential ID
    let mut point = Vec::with_capacity(65);
    point.push(0x04);
    point.extend_from_slice(x);
    point.extend_from_slice(y);
    let point_hash = digest::digest(&digest::SHA256, &point);
    constant_time::verify_slices_are_equal(point_hash.as_ref(), key_id)
        .map_err(|_| AppAttestError::KeyIdMismatch)?;
    if credential.credential_id != key_id {
        return Err(AppAttestError::KeyIdMismatch);
    }

    // 9. A fresh attestation always carries a zero counter
    if auth.sign_count != 0 {
        return Err(AppAttestError::MalformedInput(
            "attestation counter is not zero".into(),
        ));
    }

    // 10. The AAGUID must match the configured environment
    if !auth.aaguid_matches(environment) {
        return Err(AppAttestError::MalformedInput(
            "unexpected attestation AAGUID".into(),
        ));
    }

    let mut public_key = [0u8; 64];
    public_key[..32].copy_from_slice(x);
    public_key[32..].copy_from_slice(y);
    Ok(AttestedCredential { public_key })
}

/// Fetch a 32-byte coordinate from a COSE key map
fn cose_coordinate(key: &CborValue, label: i64) -> Result<&[u8], AppAttestError> {
    key.map_get_int(label)
        .and_then(CborValue::as_bytes)
        .filter(|bytes| bytes.len() == 32)
        .ok_or(AppAttestError::MissingPublicKey)
}
