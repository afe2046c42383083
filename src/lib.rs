//! Library for inspecting the certificates and timestamps of signed attestations.
//!
//! This crate takes a DSSE envelope and describes each signer: the leaf
//! certificate (names, validity, serial, key size, SANs), the intermediate
//! chain and any RFC 3161 timestamp tokens. It parses and displays; it does not
//! verify signatures or validate chains against a trust store.

/// Bounded DER reader producing a tagged node tree
pub mod asn1;

/// X.509 certificate model extraction
pub mod certificate;

/// Normalization options
pub mod config;

/// Presentation helpers for normalized envelopes
pub mod display;

/// Dead Simple Signing Envelope (DSSE) model
pub mod dsse;

/// Base64 and PEM encoding helpers
pub mod encoding;

/// Error types
pub mod errors;

/// Serializable wire models
pub mod models;

/// Envelope normalization into per-signature certificate info
pub mod normalize;

/// Shared object identifier table
pub mod oids;

/// RFC 3161 timestamp token extraction
pub mod timestamp;

#[cfg(test)]
mod test_support;

pub use certificate::{DistinguishedName, ParsedCertificate};
pub use config::NormalizeOptions;
pub use errors::{CertificateFormatError, DecodeError, InspectError, ParseError};
pub use normalize::{normalize, normalize_json, CertificateInfo, NormalizedEnvelope, Normalizer};
pub use timestamp::{TimestampInfo, TimestampToken};
