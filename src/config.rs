//! Options controlling how envelopes are normalized.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::asn1::DEFAULT_MAX_DEPTH;

/// Normalization options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NormalizeOptions {
    /// Maximum ASN.1 nesting accepted in any certificate or timestamp token
    pub max_depth: usize,

    /// Append each timestamp authority's certificate to the signature's intermediates
    pub merge_timestamp_authority_certs: bool,

    /// Accept full RFC 3161 `TimeStampResp` structures in place of bare tokens
    pub accept_timestamp_responses: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            merge_timestamp_authority_certs: true,
            accept_timestamp_responses: true,
        }
    }
}

impl NormalizeOptions {
    /// Loads options from JSON. Missing keys take their defaults; unknown keys are rejected.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(json).context("Failed to parse normalize options")?;

        if options.max_depth == 0 {
            anyhow::bail!("maxDepth must be at least 1");
        }

        Ok(options)
    }
}
