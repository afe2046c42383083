use serde::{Deserialize, Serialize};

/// Serializable DSSE envelope as returned by the attestation store.
///
/// Optional arrays accept both a missing key and an explicit `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// The type/format of the payload
    pub payload_type: String,
    /// The base64-encoded payload data
    pub payload: String,
    /// Signatures in signing order
    #[serde(default)]
    pub signatures: Option<Vec<Signature>>,
}

/// Serializable signature within a DSSE envelope.
///
/// Besides the key identifier and signature, a signature may carry the
/// signing certificate, its intermediates and RFC 3161 timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// Key identifier used to create the signature
    #[serde(default)]
    pub keyid: Option<String>,
    /// The base64-encoded signature bytes
    #[serde(default)]
    pub sig: String,
    /// Base64 of the PEM leaf certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    /// Base64 of each PEM intermediate certificate, leaf side first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Vec<SignatureTimestamp>>,
}

/// Serializable timestamp attached to a signature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignatureTimestamp {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub timestamp_type: Option<String>,
    /// Base64 of the DER timestamp token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}
