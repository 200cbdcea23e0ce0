//! Assertion verification
//!
//! Per-request verification that a signed payload came from a
//! previously attested key, with monotonic-counter replay protection.
//! The verifier never touches storage: the caller supplies the stored
//! public key and last accepted counter, and must persist the returned
//! counter atomically (compare-and-swap against its store) before
//! accepting the request's side effects.

use ring::digest;
use ring::signature::{UnparsedPublicKey, ECDSA_P256_SHA256_ASN1};

use crate::authenticator_data::AuthenticatorData;
use crate::cbor::{self, CborValue};
use crate::errors::AppAttestError;

/// Decoded assertion object
#[derive(Debug, Clone)]
pub struct AssertionEnvelope {
    /// DER-encoded ECDSA signature
    pub signature: Vec<u8>,
    /// Raw authenticator data (37-byte short form)
    pub auth_data: Vec<u8>,
}

impl AssertionEnvelope {
    /// Decode an assertion object from CBOR bytes
    ///
    /// # Errors
    /// Returns a decoder error for malformed CBOR, or `MalformedInput`
    /// if the `signature` or `authenticatorData` field is absent.
    pub fn decode(bytes: &[u8]) -> Result<Self, AppAttestError> {
        let value = cbor::decode(bytes)?;

        let signature = value
            .map_get_text("signature")
            .and_then(CborValue::as_bytes)
            .ok_or_else(|| AppAttestError::MalformedInput("missing signature".into()))?
            .to_vec();
        let auth_data = value
            .map_get_text("authenticatorData")
            .and_then(CborValue::as_bytes)
            .ok_or_else(|| AppAttestError::MalformedInput("missing authenticatorData".into()))?
            .to_vec();

        Ok(Self {
            signature,
            auth_data,
        })
    }
}

/// A successfully verified assertion
#[derive(Debug, Clone, Copy)]
pub struct VerifiedAssertion {
    /// The counter carried by this assertion; becomes the caller's new
    /// `previous_counter`
    pub counter: u32,
}

/// Verify an assertion against a stored public key and replay counter
///
/// `public_key` is the 64-byte x || y value returned by attestation.
///
/// # Errors
/// Returns `ReplayDetected` if the assertion counter is not strictly
/// greater than `previous_counter` (equality rejects counter resets and
/// duplicate signatures alike), `InvalidSignature` if the signature
/// does not verify, and decoder errors for malformed input.
pub fn verify_assertion(
    assertion_object: &[u8],
    client_data: &[u8],
    public_key: &[u8],
    previous_counter: u32,
) -> Result<VerifiedAssertion, AppAttestError> {
    // 1. Decode the envelope
    let envelope = AssertionEnvelope::decode(assertion_object)?;

    // 2. Read the counter from the short-form authenticator data
    let auth = AuthenticatorData::parse(&envelope.auth_data)?;

    // 3. Strict increase is the replay invariant
    if auth.sign_count <= previous_counter {
        return Err(AppAttestError::ReplayDetected);
    }

    // 4. The device signed authenticatorData || SHA256(clientData)
    let client_data_hash = digest::digest(&digest::SHA256, client_data);
    let mut signed_data = Vec::with_capacity(envelope.auth_data.len() + 32);
    signed_data.extend_from_slice(&envelope.auth_data);
    signed_data.extend_from_slice(client_data_hash.as_ref());

    // 5. Reconstruct the uncompressed point and verify the signature
    if public_key.len() != 64 {
        return Err(AppAttestError::MalformedInput(
            "stored public key must be 64 bytes".into(),
        ));
    }
    let mut point = Vec::with_capacity(65);
    point.push(0x04);
    point.extend_from_slice(public_key);
    UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &point)
        .verify(&signed_data, &envelope.signature)
        .map_err(|_| AppAttestError::InvalidSignature)?;

    Ok(VerifiedAssertion {
        counter: auth.sign_count,
    })
}
