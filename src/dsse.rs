use std::{convert::TryFrom, fmt, str::FromStr};

use anyhow::{Context, Result};
use base64::engine::{general_purpose::STANDARD as BASE64, Engine};

use crate::models;

/// Dead Simple Signing Envelope (DSSE) carrying an attestation payload.
///
/// Signatures keep the order of the source envelope; the first one is the primary signer.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The type/format of the payload being signed
    pub payload_type: PayloadType,
    /// The raw payload data in bytes
    pub payload: Vec<u8>,
    /// Zero or more signatures over the payload
    pub signatures: Vec<Signature>,
}

impl Envelope {
    /// Converts the envelope into a JSON string representation.
    ///
    /// # Returns
    /// * `Result<String>` - JSON string of the envelope, or error if serialization fails
    pub fn into_json_string(self) -> Result<String> {
        let envelope = models::dsse::Envelope::from(self);
        let s = serde_json::to_string(&envelope)?;

        Ok(s)
    }

    /// Creates an envelope from a JSON string representation.
    ///
    /// # Arguments
    /// * `s` - JSON string to parse
    ///
    /// # Returns
    /// * `Result<Self>` - Parsed envelope, or error if the JSON or the payload base64 is malformed
    pub fn try_from_json_string(s: &str) -> Result<Self> {
        let envelope: models::dsse::Envelope =
            serde_json::from_str(s).context("Failed to parse DSSE envelope JSON")?;
        Self::try_from(envelope)
    }

    /// Parses the payload as JSON, e.g. an in-toto statement.
    pub fn payload_json(&self) -> Result<serde_json::Value> {
        serde_json::from_slice(&self.payload)
            .with_context(|| format!("Payload of type '{}' is not JSON", self.payload_type))
    }
}

/// Payload types seen in attestation envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadType {
    /// in-toto attestation in JSON format
    InTotoJson,
    /// Any other payload type
    Other(String),
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadType::InTotoJson => write!(f, "application/vnd.in-toto+json"),
            PayloadType::Other(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for PayloadType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application/vnd.in-toto+json" => Ok(PayloadType::InTotoJson),
            _ => Ok(PayloadType::Other(s.to_owned())),
        }
    }
}

/// One signer's contribution to an envelope.
///
/// Certificate material stays in its envelope text form (base64 of PEM) so it
/// can be shown and copied unchanged; it is only decoded during normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    /// Key identifier used to create the signature, possibly empty
    pub keyid: String,
    /// The base64 signature as it appears in the envelope
    pub sig: String,
    /// Base64 PEM leaf certificate; `None` for key-only signatures
    pub certificate: Option<String>,
    /// Base64 PEM intermediate certificates, excluding the root
    pub intermediates: Vec<String>,
    pub timestamps: Vec<SignatureTimestamp>,
}

/// A timestamp entry of a signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureTimestamp {
    /// Free-form kind reported by the signer, e.g. `tsp`
    pub timestamp_type: Option<String>,
    /// Base64 DER timestamp token; entries without data are ignored
    pub data: Option<String>,
}

impl TryFrom<models::dsse::Envelope> for Envelope {
    type Error = anyhow::Error;

    fn try_from(envelope: models::dsse::Envelope) -> Result<Self> {
        let models::dsse::Envelope {
            payload_type,
            payload,
            signatures,
        } = envelope;

        let payload_type = PayloadType::from_str(&payload_type)?;

        let payload = BASE64
            .decode(payload)
            .context("Envelope payload is not valid base64")?;

        let signatures = signatures
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(Self {
            payload_type,
            payload,
            signatures,
        })
    }
}

impl From<Envelope> for models::dsse::Envelope {
    fn from(envelope: Envelope) -> Self {
        let Envelope {
            payload_type,
            payload,
            signatures,
        } = envelope;

        let payload_type = payload_type.to_string();
        let payload = BASE64.encode(payload);
        let signatures = Some(signatures.into_iter().map(Into::into).collect());

        Self {
            payload_type,
            payload,
            signatures,
        }
    }
}

impl From<models::dsse::Signature> for Signature {
    fn from(signature: models::dsse::Signature) -> Self {
        let models::dsse::Signature {
            keyid,
            sig,
            certificate,
            intermediates,
            timestamps,
        } = signature;

        // an empty certificate string is the same as no certificate
        let certificate = certificate.filter(|c| !c.trim().is_empty());

        Self {
            keyid: keyid.unwrap_or_default(),
            sig,
            certificate,
            intermediates: intermediates.unwrap_or_default(),
            timestamps: timestamps
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

impl From<Signature> for models::dsse::Signature {
    fn from(signature: Signature) -> Self {
        let Signature {
            keyid,
            sig,
            certificate,
            intermediates,
            timestamps,
        } = signature;

        Self {
            keyid: Some(keyid),
            sig,
            certificate,
            intermediates: (!intermediates.is_empty()).then_some(intermediates),
            timestamps: (!timestamps.is_empty())
                .then(|| timestamps.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<models::dsse::SignatureTimestamp> for SignatureTimestamp {
    fn from(timestamp: models::dsse::SignatureTimestamp) -> Self {
        let models::dsse::SignatureTimestamp {
            timestamp_type,
            data,
        } = timestamp;

        Self {
            timestamp_type,
            data,
        }
    }
}

impl From<SignatureTimestamp> for models::dsse::SignatureTimestamp {
    fn from(timestamp: SignatureTimestamp) -> Self {
        let SignatureTimestamp {
            timestamp_type,
            data,
        } = timestamp;

        Self {
            timestamp_type,
            data,
        }
    }
}
