//! App Attest error types
//!
//! This module defines the closed set of failure kinds for attestation
//! and assertion verification. Every verification gate maps to exactly
//! one kind so callers and tests can branch on the kind rather than on
//! message text.

use std::fmt;

/// App Attest errors that can occur during verification
#[derive(Debug, PartialEq, Eq)]
pub enum AppAttestError {
    /// Configuration error (e.g., an unparseable root CA)
    ConfigurationError(String),

    /// Input ended before a declared structure was complete
    TruncatedInput,

    /// A CBOR encoding marker outside the understood subset
    UnsupportedEncoding(u8),

    /// Base64 or structural decode failure, or a protocol field with
    /// an impossible value
    MalformedInput(String),

    /// Attestation format tag is not `apple-appattest`
    FormatMismatch,

    /// Fewer than two certificates in the attestation statement
    MissingCertificateChain,

    /// App identifier hash does not match the authenticator data
    OriginMismatch,

    /// COSE key lacks the required coordinate entries or they have the
    /// wrong length
    MissingPublicKey,

    /// Computed nonce does not match the leaf certificate extension
    NonceMismatch,

    /// Certificate chain does not resolve to the pinned root
    ChainValidationFailed(String),

    /// Key identifier does not match the attested public key
    KeyIdMismatch,

    /// Assertion counter not strictly greater than the previous value
    ReplayDetected,

    /// Signature verification failed
    InvalidSignature,
}

impl fmt::Display for AppAttestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppAttestError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            AppAttestError::TruncatedInput => write!(f, "Truncated input"),
            AppAttestError::UnsupportedEncoding(byte) => {
                write!(f, "Unsupported encoding marker: {byte:#04x}")
            }
            AppAttestError::MalformedInput(msg) => write!(f, "Malformed input: {msg}"),
            AppAttestError::FormatMismatch => write!(f, "Unexpected attestation format"),
            AppAttestError::MissingCertificateChain => {
                write!(f, "Attestation certificate chain is missing or too short")
            }
            AppAttestError::OriginMismatch => write!(f, "App identifier hash mismatch"),
            AppAttestError::MissingPublicKey => {
                write!(f, "Credential public key is missing or invalid")
            }
            AppAttestError::NonceMismatch => {
                write!(f, "Attestation nonce does not match certificate")
            }
            AppAttestError::ChainValidationFailed(msg) => {
                write!(f, "Certificate chain validation failed: {msg}")
            }
            AppAttestError::KeyIdMismatch => {
                write!(f, "Key identifier does not match attested key")
            }
            AppAttestError::ReplayDetected => {
                write!(f, "Replay detected: assertion counter did not increase")
            }
            AppAttestError::InvalidSignature => write!(f, "Signature verification failed"),
        }
    }
}

impl std::error::Error for AppAttestError {}
