//! Envelope normalization.
//!
//! Turns each signature of a DSSE envelope into a [`CertificateInfo`]: the
//! leaf certificate, the intermediate chain (declared plus timestamp
//! authorities) and the timestamps that could be read. Failures are local. A
//! bad certificate or token is logged, recorded as a [`Diagnostic`] and left
//! out, and every other signature and token is still processed.

use std::fmt;

use anyhow::Result;
use serde::Serialize;

use crate::{
    certificate::{parse_certificate, ParsedCertificate},
    config::NormalizeOptions,
    dsse::{Envelope, Signature},
    encoding::{certificate_der_from_field, decode_base64},
    errors::InspectError,
    timestamp::{parse_timestamp_token, TimestampInfo, TimestampToken},
};

/// Where a soft failure happened within one signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticScope {
    LeafCertificate,
    /// Index into the signature's `timestamps`
    Timestamp(usize),
}

impl fmt::Display for DiagnosticScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticScope::LeafCertificate => write!(f, "leaf certificate"),
            DiagnosticScope::Timestamp(index) => write!(f, "timestamp {}", index + 1),
        }
    }
}

/// A failure that was converted into an absent field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub scope: DiagnosticScope,
    pub message: String,
}

/// Display model of one signature that carries a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    pub keyid: String,
    /// The signature as it appears in the envelope
    pub signature: String,
    /// Base64 PEM leaf certificate as it appears in the envelope
    pub leaf_cert: String,
    /// Declared intermediates followed by timestamp authority certificates, all base64 PEM
    pub intermediates: Vec<String>,
    pub timestamps: Vec<TimestampInfo>,
    /// The decoded leaf certificate; `None` when it could not be parsed
    pub certificate: Option<ParsedCertificate>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CertificateInfo {
    /// Parses every intermediate certificate. A bad entry does not affect the others.
    pub fn intermediate_certificates(&self) -> Vec<Result<ParsedCertificate, InspectError>> {
        self.intermediates
            .iter()
            .map(|field| ParsedCertificate::from_base64_pem(field))
            .collect()
    }
}

/// Result of normalizing an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "certificates", rename_all = "camelCase")]
pub enum NormalizedEnvelope {
    /// One entry per signature with a certificate, in envelope order
    Certificates(Vec<CertificateInfo>),
    /// The envelope has no signature with a certificate
    NoCertificate,
}

impl NormalizedEnvelope {
    pub fn certificates(&self) -> &[CertificateInfo] {
        match self {
            NormalizedEnvelope::Certificates(certificates) => certificates,
            NormalizedEnvelope::NoCertificate => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizedEnvelope::NoCertificate)
    }
}

/// Builds [`CertificateInfo`] records from envelopes.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Normalizes every signature of an envelope, preserving signature order.
    ///
    /// # Arguments
    /// * `envelope` - the envelope to describe
    ///
    /// # Returns
    /// * `NormalizedEnvelope` - `NoCertificate` when no signature carries a certificate
    pub fn normalize(&self, envelope: &Envelope) -> NormalizedEnvelope {
        let certificates: Vec<CertificateInfo> = envelope
            .signatures
            .iter()
            .enumerate()
            .filter_map(|(index, signature)| self.normalize_signature(index, signature))
            .collect();

        log::debug!(
            "normalized {} of {} signatures",
            certificates.len(),
            envelope.signatures.len()
        );

        if certificates.is_empty() {
            NormalizedEnvelope::NoCertificate
        } else {
            NormalizedEnvelope::Certificates(certificates)
        }
    }

    /// Normalizes one signature. Returns `None` for signatures without a certificate.
    ///
    /// # Arguments
    /// * `index` - position of the signature in its envelope, used in log messages
    /// * `signature` - the signature to describe
    pub fn normalize_signature(&self, index: usize, signature: &Signature) -> Option<CertificateInfo> {
        let Some(leaf_cert) = signature.certificate.as_ref() else {
            log::info!("No leaf certificate found for signature {}", index + 1);
            return None;
        };

        let mut diagnostics = Vec::new();

        let certificate = match self.parse_leaf(leaf_cert) {
            Ok(certificate) => Some(certificate),
            Err(e) => {
                log::warn!("Unable to parse leaf certificate of signature {}: {e}", index + 1);
                diagnostics.push(Diagnostic {
                    scope: DiagnosticScope::LeafCertificate,
                    message: e.to_string(),
                });
                None
            }
        };

        let mut intermediates = signature.intermediates.clone();
        let mut timestamps = Vec::new();

        for (timestamp_index, timestamp) in signature.timestamps.iter().enumerate() {
            let Some(data) = timestamp.data.as_deref() else {
                log::trace!(
                    "timestamp {} of signature {} has no data",
                    timestamp_index + 1,
                    index + 1
                );
                continue;
            };

            let token = match self.parse_timestamp(data) {
                Ok(token) => token,
                Err(e) => {
                    log::warn!(
                        "Unable to parse timestamp {} of signature {}: {e}",
                        timestamp_index + 1,
                        index + 1
                    );
                    diagnostics.push(Diagnostic {
                        scope: DiagnosticScope::Timestamp(timestamp_index),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if let Some(info) = token.timestamp_info() {
                log::debug!(
                    "Timestamp {} for signature {}: {}, Issuer: {}",
                    timestamp_index + 1,
                    index + 1,
                    info.date,
                    info.issuer
                );
                timestamps.push(info);
            }

            if self.options.merge_timestamp_authority_certs {
                intermediates.extend(token.authority_certificate_field());
            }
        }

        Some(CertificateInfo {
            keyid: signature.keyid.clone(),
            signature: signature.sig.clone(),
            leaf_cert: leaf_cert.clone(),
            intermediates,
            timestamps,
            certificate,
            diagnostics,
        })
    }

    fn parse_leaf(&self, field: &str) -> Result<ParsedCertificate, InspectError> {
        let der = certificate_der_from_field(field)?;
        Ok(parse_certificate(&der, self.options.max_depth)?)
    }

    fn parse_timestamp(&self, data: &str) -> Result<TimestampToken, InspectError> {
        let der = decode_base64(data.trim(), false)?;
        Ok(parse_timestamp_token(&der, &self.options)?)
    }
}

/// Normalizes an envelope with default options.
pub fn normalize(envelope: &Envelope) -> NormalizedEnvelope {
    Normalizer::default().normalize(envelope)
}

/// Parses envelope JSON and normalizes it with default options.
///
/// Only a malformed envelope (bad JSON or payload base64) is an error; bad
/// certificates and tokens inside it are reported through diagnostics.
pub fn normalize_json(json: &str) -> Result<NormalizedEnvelope> {
    let envelope = Envelope::try_from_json_string(json)?;
    Ok(normalize(&envelope))
}
