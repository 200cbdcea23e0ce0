//! Authenticator data parsing
//!
//! Authenticator data is a fixed-layout binary record produced by the
//! device:
//!
//! - 32 bytes: SHA-256 of the app identifier
//! - 1 byte: flags
//! - 4 bytes: big-endian signature counter
//! - variable: attested credential data (only when flag bit 6 is set)
//!   - 16 bytes: AAGUID
//!   - 2 bytes: big-endian credential ID length (L)
//!   - L bytes: credential ID
//!   - variable: COSE public key (CBOR, occupies the remaining bytes)
//!
//! Assertion records carry only the 37-byte fixed header.

use ring::constant_time;
use ring::digest;

use crate::cbor::{self, CborValue};
use crate::errors::AppAttestError;
use crate::settings::AttestEnvironment;

/// Flag bit 6: attested credential data present
const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0x40;

/// Minimum length of any authenticator data record
const FIXED_HEADER_LEN: usize = 37;

/// AAGUID embedded by production attestations
const AAGUID_PRODUCTION: &[u8; 16] = b"appattest\x00\x00\x00\x00\x00\x00\x00";

/// AAGUID embedded by development (sandbox) attestations
const AAGUID_DEVELOPMENT: &[u8; 16] = b"appattestdevelop";

/// Parsed authenticator data
#[derive(Debug, Clone)]
pub struct AuthenticatorData {
    /// SHA-256 of the app identifier this record is bound to
    pub app_id_hash: [u8; 32],
    /// Flags byte
    pub flags: u8,
    /// Signature counter
    pub sign_count: u32,
    /// Attested credential block, present only in attestation records
    pub attested_credential: Option<AttestedCredentialData>,
}

/// The attested credential block of an attestation record
#[derive(Debug, Clone)]
pub struct AttestedCredentialData {
    /// Attestation environment identifier
    pub aaguid: [u8; 16],
    /// Credential ID (the key identifier for App Attest)
    pub credential_id: Vec<u8>,
    /// Decoded COSE public key
    pub public_key: CborValue,
}

impl AuthenticatorData {
    /// Parse authenticator data from raw bytes
    ///
    /// # Errors
    /// Returns `TruncatedInput` if the record is shorter than 37 bytes
    /// or the declared credential ID length exceeds the remaining
    /// buffer, and decoder errors for a malformed COSE key.
    pub fn parse(bytes: &[u8]) -> Result<Self, AppAttestError> {
        if bytes.len() < FIXED_HEADER_LEN {
            return Err(AppAttestError::TruncatedInput);
        }

        let mut app_id_hash = [0u8; 32];
        app_id_hash.copy_from_slice(&bytes[..32]);
        let flags = bytes[32];
        let sign_count = u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);

        let attested_credential = if flags & FLAG_ATTESTED_CREDENTIAL_DATA == 0 {
            None
        } else {
            Some(Self::parse_attested_credential(&bytes[FIXED_HEADER_LEN..])?)
        };

        Ok(Self {
            app_id_hash,
            flags,
            sign_count,
            attested_credential,
        })
    }

    fn parse_attested_credential(rest: &[u8]) -> Result<AttestedCredentialData, AppAttestError> {
        // AAGUID (16 bytes) + credential ID length (2 bytes)
        if rest.len() < 18 {
            return Err(AppAttestError::TruncatedInput);
        }
        let mut aaguid = [0u8; 16];
        aaguid.copy_from_slice(&rest[..16]);

        let id_len = usize::from(u16::from_be_bytes([rest[16], rest[17]]));
        let key_offset = 18usize
            .checked_add(id_len)
            .ok_or(AppAttestError::TruncatedInput)?;
        if rest.len() < key_offset {
            return Err(AppAttestError::TruncatedInput);
        }
        let credential_id = rest[18..key_offset].to_vec();

        // The COSE public key occupies the remaining bytes
        if rest.len() == key_offset {
            return Err(AppAttestError::TruncatedInput);
        }
        let public_key = cbor::decode(&rest[key_offset..])?;

        Ok(AttestedCredentialData {
            aaguid,
            credential_id,
            public_key,
        })
    }

    /// Compare the embedded app identifier hash against `app_id`
    ///
    /// # Errors
    /// Returns `OriginMismatch` if `SHA-256(app_id)` does not equal the
    /// first 32 bytes of the record. The comparison is constant time.
    pub fn verify_app_id(&self, app_id: &str) -> Result<(), AppAttestError> {
        let expected = digest::digest(&digest::SHA256, app_id.as_bytes());
        constant_time::verify_slices_are_equal(expected.as_ref(), &self.app_id_hash)
            .map_err(|_| AppAttestError::OriginMismatch)
    }

    /// Whether the AAGUID matches the expected attestation environment
    #[must_use]
    pub fn aaguid_matches(&self, environment: AttestEnvironment) -> bool {
        let expected: &[u8; 16] = match environment {
            AttestEnvironment::Production => AAGUID_PRODUCTION,
            AttestEnvironment::Development => AAGUID_DEVELOPMENT,
        };
        self.attested_credential
            .as_ref()
            .is_some_and(|cred| &cred.aaguid == expected)
    }
}
