//! Helpers for presenting normalized envelopes.

use anyhow::Result;

use crate::{certificate::ParsedCertificate, normalize::NormalizedEnvelope, timestamp::TimestampInfo};

const UNKNOWN: &str = "Unknown";
const SIGNATURE_PREVIEW_CHARS: usize = 15;

/// `"<issuer O> - <issuer CN>"`, with `Unknown` standing in for a missing part.
pub fn issuer_summary(certificate: &ParsedCertificate) -> String {
    let or_unknown = |s: &str| if s.is_empty() { UNKNOWN.to_owned() } else { s.to_owned() };

    format!(
        "{} - {}",
        or_unknown(&certificate.issuer.organization),
        or_unknown(&certificate.issuer.common_name)
    )
}

/// The first 15 characters of a signature followed by `...`.
pub fn truncated_signature(signature: &str) -> String {
    let preview: String = signature.chars().take(SIGNATURE_PREVIEW_CHARS).collect();
    format!("{preview}...")
}

/// `"<date> (<issuer>)"`, the label shown next to a verified timestamp.
pub fn timestamp_label(timestamp: &TimestampInfo) -> String {
    format!(
        "{} ({})",
        timestamp.date.format("%Y-%m-%d %H:%M:%S UTC"),
        timestamp.issuer
    )
}

/// Serializes a normalized envelope for handoff to the presentation layer.
pub fn to_json_value(normalized: &NormalizedEnvelope) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(normalized)?)
}

/// Serde adapter writing UTC instants as RFC 3339 with a `Z` suffix.
pub(crate) mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::{
        certificate::DistinguishedName,
        dsse::{Envelope, PayloadType, Signature, SignatureTimestamp},
        normalize::normalize,
        test_support::{pem_field, LEAF_CN_ONLY_PEM, LEAF_PEM, TSA_TOKEN_B64},
    };

    fn leaf() -> ParsedCertificate {
        ParsedCertificate::from_base64_pem(&pem_field(LEAF_PEM)).unwrap()
    }

    #[test]
    fn issuer_summary_with_unknown_parts() {
        let mut certificate = leaf();
        assert_eq!(issuer_summary(&certificate), "Testify - Testify Intermediate CA");

        certificate.issuer = DistinguishedName {
            common_name: "Only CN".to_string(),
            ..Default::default()
        };
        assert_eq!(issuer_summary(&certificate), "Unknown - Only CN");

        certificate.issuer = DistinguishedName::default();
        assert_eq!(issuer_summary(&certificate), "Unknown - Unknown");
    }

    #[test]
    fn signature_preview() {
        assert_eq!(
            truncated_signature("MEUCIQDx1y2z3a4b5c6d7e8f"),
            "MEUCIQDx1y2z3a4..."
        );
        assert_eq!(truncated_signature("short"), "short...");
    }

    #[test]
    fn timestamp_labels() {
        let info = TimestampInfo {
            date: Utc.with_ymd_and_hms(2023, 5, 10, 14, 30, 0).unwrap(),
            issuer: "Testify Root CA".to_string(),
        };
        assert_eq!(timestamp_label(&info), "2023-05-10 14:30:00 UTC (Testify Root CA)");
    }

    #[test]
    fn json_handoff() {
        let envelope = Envelope {
            payload_type: PayloadType::InTotoJson,
            payload: b"{}".to_vec(),
            signatures: vec![Signature {
                keyid: "k".to_string(),
                sig: "c2ln".to_string(),
                certificate: Some(pem_field(LEAF_CN_ONLY_PEM)),
                timestamps: vec![SignatureTimestamp {
                    timestamp_type: None,
                    data: Some(TSA_TOKEN_B64.trim().to_string()),
                }],
                ..Default::default()
            }],
        };

        let value = to_json_value(&normalize(&envelope)).unwrap();
        assert_eq!(value["status"], "certificates");

        let info = &value["certificates"][0];
        assert_eq!(info["signature"], "c2ln");
        assert_eq!(info["leafCert"], pem_field(LEAF_CN_ONLY_PEM));
        assert_eq!(
            info["timestamps"],
            json!([{ "date": "2026-10-19T05:43:59Z", "issuer": "Testify Root CA" }])
        );
        assert_eq!(info["certificate"]["issued"], "2024-01-01T00:00:00Z");
        assert_eq!(info["certificate"]["subject"]["commonName"], "keyless-signer");
        assert_eq!(info["certificate"]["subject"]["countryCode"], "");
        assert_eq!(info["certificate"]["keySize"], 520);
        assert_eq!(info["diagnostics"], json!([]));

        let empty = Envelope {
            signatures: vec![],
            ..envelope
        };
        assert_eq!(
            to_json_value(&normalize(&empty)).unwrap(),
            json!({ "status": "noCertificate" })
        );
    }
}
