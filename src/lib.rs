#![warn(clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! Apple App Attest verification
//!
//! This crate verifies that (a) a key was generated by a genuine,
//! unmodified app instance on genuine Apple hardware (attestation),
//! and (b) each subsequent request carrying an assertion came from
//! that same attested key, with monotonic-counter replay protection.
//!
//! It is a pure library: it performs no I/O and owns no storage. The
//! caller persists the public key returned by attestation (keyed by
//! credential ID, with an initial counter of 0) and must advance the
//! counter returned by assertion verification atomically.

/// Version of the appattest-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod assertion;
pub mod attestation;
pub mod authenticator_data;
pub mod cbor;
pub mod chain;
pub mod errors;
pub mod service;
pub mod settings;
pub mod types;

/// Re-export commonly used items
pub use assertion::{verify_assertion, AssertionEnvelope, VerifiedAssertion};
pub use attestation::{verify_attestation, AttestationEnvelope, AttestedCredential};
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData};
pub use cbor::CborValue;
pub use chain::ChainValidator;
pub use errors::AppAttestError;
pub use service::AppAttestService;
pub use settings::{AppAttestSettings, AttestEnvironment, APPLE_APP_ATTEST_ROOT_CA_PEM};
pub use types::{
    VerifyAssertionRequest, VerifyAssertionResponse, VerifyAttestationRequest,
    VerifyAttestationResponse,
};
