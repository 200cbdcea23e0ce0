//! App Attest service
//!
//! The boundary facade over the attestation and assertion verifiers.
//! Inputs arrive base64-encoded; every failure is mapped to a
//! `valid: false` response with a human-readable error, never an
//! unwound error.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::assertion;
use crate::attestation;
use crate::chain::ChainValidator;
use crate::errors::AppAttestError;
use crate::settings::AppAttestSettings;
use crate::types::{
    VerifyAssertionRequest, VerifyAssertionResponse, VerifyAttestationRequest,
    VerifyAttestationResponse,
};

/// Core App Attest verification service
pub struct AppAttestService {
    settings: AppAttestSettings,
    validator: ChainValidator,
}

impl AppAttestService {
    /// Create a service from settings
    ///
    /// # Errors
    /// Returns `ConfigurationError` if the pinned root CA cannot be
    /// parsed.
    pub fn new(settings: AppAttestSettings) -> Result<Self, AppAttestError> {
        let validator = ChainValidator::new(&settings.root_ca_pem)?;
        Ok(Self {
            settings,
            validator,
        })
    }

    /// Verify a one-time attestation and return the credential public
    /// key for storage
    #[must_use]
    pub fn verify_attestation(
        &self,
        request: &VerifyAttestationRequest,
    ) -> VerifyAttestationResponse {
        match self.process_attestation(request) {
            Ok(public_key) => VerifyAttestationResponse {
                valid: true,
                public_key: Some(public_key),
                error: None,
            },
            Err(e) => {
                log::debug!("Attestation verification failed: {e}");
                VerifyAttestationResponse {
                    valid: false,
                    public_key: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Verify a per-request assertion against the stored public key
    /// and counter
    #[must_use]
    pub fn verify_assertion(&self, request: &VerifyAssertionRequest) -> VerifyAssertionResponse {
        match self.process_assertion(request) {
            Ok(counter) => VerifyAssertionResponse {
                valid: true,
                counter: Some(counter),
                error: None,
            },
            Err(e) => {
                log::debug!("Assertion verification failed: {e}");
                VerifyAssertionResponse {
                    valid: false,
                    counter: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn process_attestation(&self, request: &VerifyAttestationRequest) -> Result<String, AppAttestError> {
        let attestation_object = decode_base64(&request.attestation, "attestation")?;
        let challenge = decode_base64(&request.challenge, "challenge")?;
        let key_id = decode_base64(&request.key_id, "keyId")?;

        let credential = attestation::verify_attestation(
            &self.validator,
            self.settings.environment,
            &attestation_object,
            &challenge,
            &key_id,
            &request.app_id,
        )?;

        Ok(STANDARD.encode(credential.public_key))
    }

    fn process_assertion(&self, request: &VerifyAssertionRequest) -> Result<u32, AppAttestError> {
        let assertion_object = decode_base64(&request.assertion, "assertion")?;
        let public_key = decode_base64(&request.public_key, "publicKey")?;

        let verified = assertion::verify_assertion(
            &assertion_object,
            request.client_data.as_bytes(),
            &public_key,
            request.previous_counter,
        )?;

        Ok(verified.counter)
    }
}

fn decode_base64(value: &str, field: &str) -> Result<Vec<u8>, AppAttestError> {
    STANDARD
        .decode(value)
        .map_err(|_| AppAttestError::MalformedInput(format!("invalid base64 in {field}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::tests::{attested_object, credential_key_id, TestAuthority};
    use crate::settings::AttestEnvironment;

    fn service() -> AppAttestService {
        AppAttestService::new(AppAttestSettings::default()).unwrap()
    }

    #[test]
    fn test_attestation_round_trip_returns_public_key() {
        let authority = TestAuthority::new();
        let key_id = credential_key_id();
        let object = attested_object(
            &authority,
            "T.com.example.app",
            b"one-time-challenge",
            0,
            b"appattest\x00\x00\x00\x00\x00\x00\x00",
            &key_id,
        );
        let service = AppAttestService::new(AppAttestSettings {
            root_ca_pem: authority.root_pem(),
            ..AppAttestSettings::default()
        })
        .unwrap();

        let response = service.verify_attestation(&VerifyAttestationRequest {
            attestation: STANDARD.encode(&object),
            challenge: STANDARD.encode(b"one-time-challenge"),
            key_id: STANDARD.encode(&key_id),
            app_id: "T.com.example.app".to_string(),
        });
        assert!(response.valid);
        assert!(response.error.is_none());
        let stored = STANDARD.decode(response.public_key.unwrap()).unwrap();
        assert_eq!(stored.len(), 64);
    }

    #[test]
    fn test_default_settings_construct() {
        let svc = service();
        assert_eq!(svc.settings.environment, AttestEnvironment::Production);
    }

    #[test]
    fn test_bad_root_ca_is_rejected_at_construction() {
        let settings = AppAttestSettings {
            root_ca_pem: "garbage".to_string(),
            ..AppAttestSettings::default()
        };
        assert!(matches!(
            AppAttestService::new(settings),
            Err(AppAttestError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_invalid_base64_fails_closed() {
        let response = service().verify_attestation(&VerifyAttestationRequest {
            attestation: "!!not base64!!".to_string(),
            challenge: String::new(),
            key_id: String::new(),
            app_id: "T.com.example.app".to_string(),
        });
        assert!(!response.valid);
        assert!(response.public_key.is_none());
        assert!(response.error.unwrap().contains("attestation"));
    }

    #[test]
    fn test_invalid_assertion_base64_fails_closed() {
        let response = service().verify_assertion(&VerifyAssertionRequest {
            assertion: "%%%".to_string(),
            client_data: "{}".to_string(),
            public_key: String::new(),
            previous_counter: 0,
        });
        assert!(!response.valid);
        assert!(response.counter.is_none());
        assert!(response.error.is_some());
    }
}
