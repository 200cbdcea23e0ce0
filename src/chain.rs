//! Certificate chain validation
//!
//! Validates that the leaf certificate of an attestation statement
//! chains to the pinned root CA (signature linking and validity
//! windows, via OpenSSL's store verification), and extracts the nonce
//! Apple embeds in the leaf certificate's `1.2.840.113635.100.8.2`
//! extension. Checking that each entry begins with the DER SEQUENCE
//! tag is kept only as a cheap precondition before handing the bytes
//! to the DER parsers; it is not the validation itself.

use der_parser::ber::{parse_ber, BerObjectContent};
use der_parser::oid::Oid;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::{X509StoreContext, X509};
use x509_parser::prelude::{parse_x509_certificate, X509Extension};

use crate::errors::AppAttestError;

/// DER tag for SEQUENCE; every X.509 certificate starts with it
const DER_SEQUENCE_TAG: u8 = 0x30;

/// Apple's credential certificate extension carrying the attestation
/// nonce: OID 1.2.840.113635.100.8.2
const NONCE_EXTENSION_OID: &[u64] = &[1, 2, 840, 113_635, 100, 8, 2];

/// Validates certificate chains against an injected, immutable root
pub struct ChainValidator {
    root: X509,
}

impl ChainValidator {
    /// Create a validator pinned to the given PEM root certificate
    ///
    /// # Errors
    /// Returns `ConfigurationError` if the PEM cannot be parsed.
    pub fn new(root_ca_pem: &str) -> Result<Self, AppAttestError> {
        let root = X509::from_pem(root_ca_pem.as_bytes())
            .map_err(|e| AppAttestError::ConfigurationError(format!("invalid root CA: {e}")))?;
        Ok(Self { root })
    }

    /// Validate a leaf-first chain of DER certificates against the
    /// pinned root
    ///
    /// # Errors
    /// Returns `ChainValidationFailed` if any certificate cannot be
    /// parsed or the chain does not verify back to the root.
    pub fn validate(&self, certificates: &[Vec<u8>]) -> Result<(), AppAttestError> {
        self.validate_with_flags(certificates, X509VerifyFlags::empty())
    }

    fn validate_with_flags(
        &self,
        certificates: &[Vec<u8>],
        flags: X509VerifyFlags,
    ) -> Result<(), AppAttestError> {
        if certificates.is_empty() {
            return Err(AppAttestError::MissingCertificateChain);
        }
        if certificates
            .iter()
            .any(|der| der.first() != Some(&DER_SEQUENCE_TAG))
        {
            return Err(AppAttestError::ChainValidationFailed(
                "certificate is not a DER SEQUENCE".to_string(),
            ));
        }

        let mut certs = Vec::with_capacity(certificates.len());
        for der in certificates {
            let cert = X509::from_der(der).map_err(|e| {
                AppAttestError::ChainValidationFailed(format!("unparseable certificate: {e}"))
            })?;
            certs.push(cert);
        }

        let chain_error =
            |e: openssl::error::ErrorStack| AppAttestError::ChainValidationFailed(e.to_string());

        let mut store_builder = X509StoreBuilder::new().map_err(chain_error)?;
        store_builder
            .add_cert(self.root.clone())
            .map_err(chain_error)?;
        store_builder.set_flags(flags).map_err(chain_error)?;
        let store = store_builder.build();

        let mut intermediates = Stack::new().map_err(chain_error)?;
        for cert in certs.iter().skip(1) {
            intermediates.push(cert.clone()).map_err(chain_error)?;
        }

        let mut context = X509StoreContext::new().map_err(chain_error)?;
        let verdict = context
            .init(&store, &certs[0], &intermediates, |ctx| {
                if ctx.verify_cert()? {
                    Ok(None)
                } else {
                    Ok(Some(ctx.error().error_string().to_string()))
                }
            })
            .map_err(chain_error)?;

        match verdict {
            None => Ok(()),
            Some(reason) => Err(AppAttestError::ChainValidationFailed(reason)),
        }
    }
}

/// Extract the 32-byte attestation nonce from the leaf certificate's
/// Apple extension
///
/// The extension value is `SEQUENCE { [1] { OCTET STRING } }` with the
/// nonce as the octet string contents.
///
/// # Errors
/// Returns `NonceMismatch` if the extension is absent or does not have
/// the expected shape, and `ChainValidationFailed` if the certificate
/// itself cannot be parsed.
pub fn extract_nonce(leaf_der: &[u8]) -> Result<[u8; 32], AppAttestError> {
    let (_, cert) = parse_x509_certificate(leaf_der).map_err(|_| {
        AppAttestError::ChainValidationFailed("unparseable leaf certificate".to_string())
    })?;

    let oid = Oid::from(NONCE_EXTENSION_OID)
        .map_err(|_| AppAttestError::ConfigurationError("invalid extension OID".to_string()))?;

    let extensions: &[X509Extension] = cert.extensions();
    let value = extensions
        .iter()
        .find(|ext| ext.oid == oid)
        .ok_or(AppAttestError::NonceMismatch)?
        .value;

    let (_, outer) = parse_ber(value).map_err(|_| AppAttestError::NonceMismatch)?;
    let BerObjectContent::Sequence(items) = &outer.content else {
        return Err(AppAttestError::NonceMismatch);
    };

    // The single element is a context-specific [1] wrapper whose
    // contents are the DER of the nonce octet string
    for item in items {
        if let BerObjectContent::Unknown(wrapped) = &item.content {
            let (_, inner) = parse_ber(wrapped.data).map_err(|_| AppAttestError::NonceMismatch)?;
            if let BerObjectContent::OctetString(nonce) = inner.content {
                return <[u8; 32]>::try_from(nonce).map_err(|_| AppAttestError::NonceMismatch);
            }
        }
    }
    Err(AppAttestError::NonceMismatch)
}
