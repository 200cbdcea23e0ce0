//! App Attest settings
//!
//! Verification is configured once at service construction and is
//! immutable afterwards; the pinned root of trust is injected here
//! rather than living in a mutable global.

use serde::{Deserialize, Serialize};

/// The Apple App Attestation Root CA, pinned as the default root of
/// trust for certificate chain validation.
pub const APPLE_APP_ATTEST_ROOT_CA_PEM: &str = "-----BEGIN CERTIFICATE-----
MIICITCCAaegAwIBAgIQC/O+DvHN0uD7jG5yH2IXmDAKBggqhkjOPQQDAzBSMSYw
JAYDVQQDDB1BcHBsZSBBcHAgQXR0ZXN0YXRpb24gUm9vdCBDQTETMBEGA1UECgwK
QXBwbGUgSW5jLjETMBEGA1UECAwKQ2FsaWZvcm5pYTAeFw0yMDAzMTgxODMyNTNa
Fw00NTAzMTUwMDAwMDBaMFIxJjAkBgNVBAMMHUFwcGxlIEFwcCBBdHRlc3RhdGlv
biBSb290IENBMRMwEQYDVQQKDApBcHBsZSBJbmMuMRMwEQYDVQQIDApDYWxpZm9y
bmlhMHYwEAYHKoZIzj0CAQYFK4EEACIDYgAERTHhmLW07ATaFQIEVwTtT4dyctdh
NbJhFs/Ii2FdCgAHGbpphY3+d8qjuDngIN3WVhQUBHAoMeQ/cLiP1sOUtgjqK9au
Yen1mMEvRq9Sk3Jm5X8U62H+xTD3FE9TgS41o0IwQDAPBgNVHRMBAf8EBTADAQH/
MB0GA1UdDgQWBBSskRBTM72+aEH/pwyp5frq5eWKoTAOBgNVHQ8BAf8EBAMCAQYw
CgYIKoZIzj0EAwMDaAAwZQIwQgFGnByvsiVbpTKwSga0kP0e8EeDS4+sQmTvb7vn
53O5+FRXgeLhpJ06ysC5PrOyAjEAp5U4xDgEgllF7En3VcE3iexZZtKeYnpqtijV
oyFraWVIyd/dganmrduC1bmTBGwD
-----END CERTIFICATE-----";

/// Which attestation environment generated the keys being verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestEnvironment {
    /// App Store / TestFlight builds
    Production,
    /// Development (sandbox) builds
    Development,
}

/// App Attest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppAttestSettings {
    /// Expected attestation environment
    pub environment: AttestEnvironment,
    /// Pinned root CA for certificate chain validation, in PEM
    pub root_ca_pem: String,
}

impl Default for AppAttestSettings {
    fn default() -> Self {
        Self {
            environment: AttestEnvironment::Production,
            root_ca_pem: APPLE_APP_ATTEST_ROOT_CA_PEM.to_string(),
        }
    }
}
