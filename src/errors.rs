//! Errors raised while decoding envelopes, certificates and timestamp tokens.
//!
//! Every error in this crate is local to a single certificate or timestamp.
//! The normalizer catches them and turns them into absent fields plus a
//! diagnostic; nothing here is meant to cross into the presentation layer.

use const_oid::ObjectIdentifier;
use der::{ErrorKind, Tag};
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = InspectError> = std::result::Result<T, E>;

/// Malformed textual input (base64 or PEM).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("PEM block has an empty body")]
    EmptyPem,

    #[error("decoded certificate field is neither PEM text nor DER")]
    NotPemOrDer,
}

/// Malformed DER byte structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty input")]
    Empty,

    #[error("truncated input: {expected} bytes needed, {actual} available")]
    Truncated { expected: u32, actual: u32 },

    #[error("indefinite length is not allowed in DER")]
    IndefiniteLength,

    #[error("structure nested deeper than {0} levels")]
    DepthExceeded(usize),

    #[error("{0} trailing bytes after the top-level element")]
    TrailingData(u32),

    #[error("expected {expected}, found {found}")]
    UnexpectedTag { expected: Tag, found: Tag },

    #[error("expected {expected}, found end of structure")]
    MissingElement { expected: &'static str },

    #[error("unexpected content type {0}")]
    UnexpectedContentType(ObjectIdentifier),

    #[error("timestamp response with status {0} carries no token")]
    NoTimeStampToken(u8),

    #[error("malformed DER: {0}")]
    Der(der::Error),
}

impl From<der::Error> for ParseError {
    fn from(err: der::Error) -> Self {
        match err.kind() {
            ErrorKind::Incomplete {
                expected_len,
                actual_len,
            } => ParseError::Truncated {
                expected: expected_len.into(),
                actual: actual_len.into(),
            },
            ErrorKind::IndefiniteLength => ParseError::IndefiniteLength,
            ErrorKind::TrailingData { remaining, .. } => ParseError::TrailingData(remaining.into()),
            _ => ParseError::Der(err),
        }
    }
}

/// A certificate that could not be read as X.509.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateFormatError {
    /// Well-formed DER that is not shaped like a `Certificate`
    #[error("not an X.509 certificate: {0}")]
    NotCertificate(der::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Any failure raised while inspecting one certificate or timestamp token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InspectError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    CertificateFormat(#[from] CertificateFormatError),
}
