//! X.509 certificate model extraction.
//!
//! Decodes a DER certificate with `x509-cert` and produces a
//! [`ParsedCertificate`]: names, validity window, serial, key size and
//! subject alternative names. The bytes go through the bounded reader in
//! [`crate::asn1`] first. Nothing here verifies signatures or chains.

use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
};

use chrono::{DateTime, Utc};
use der::{
    asn1::{Any, AnyRef, BmpString, Ia5StringRef, PrintableStringRef, Utf8StringRef},
    Decode, Tag, Tagged,
};
use num_bigint::BigInt;
use serde::Serialize;
use sha2::{Digest, Sha256};
use x509_cert::{
    ext::{pkix::name::GeneralName, Extension},
    name::Name,
    time::Time,
    Certificate, Version,
};

use crate::{
    asn1::{parse_der_with_max_depth, Asn1Node, DEFAULT_MAX_DEPTH},
    encoding::certificate_der_from_field,
    errors::{CertificateFormatError, InspectError},
    oids::{algorithm_name, NameAttribute, ID_CE_SUBJECT_ALT_NAME},
};

/// The name fields displayed for a certificate subject or issuer.
///
/// Attributes outside the tracked set are ignored. When an attribute occurs
/// more than once, the last occurrence wins. A tracked attribute that is not
/// a directory string leaves its field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistinguishedName {
    pub common_name: String,
    pub organization: String,
    pub organizational_unit: String,
    pub country_code: String,
    pub state: String,
    pub city: String,
}

impl DistinguishedName {
    /// Collects the tracked attributes of an X.501 `Name`.
    pub fn from_name(name: &Name) -> Self {
        let mut dn = Self::default();

        for rdn in name.0.iter() {
            for attribute in rdn.0.iter() {
                let Some(kind) = NameAttribute::from_oid(&attribute.oid) else {
                    log::trace!("ignoring name attribute {}", attribute.oid);
                    continue;
                };

                match directory_string(&attribute.value) {
                    Some(text) => *dn.field_mut(kind) = text,
                    None => log::debug!(
                        "ignoring {kind} attribute encoded as {}",
                        attribute.value.tag()
                    ),
                }
            }
        }

        dn
    }

    pub fn get(&self, attribute: NameAttribute) -> &str {
        match attribute {
            NameAttribute::CommonName => &self.common_name,
            NameAttribute::Country => &self.country_code,
            NameAttribute::Locality => &self.city,
            NameAttribute::StateOrProvince => &self.state,
            NameAttribute::Organization => &self.organization,
            NameAttribute::OrganizationalUnit => &self.organizational_unit,
        }
    }

    fn field_mut(&mut self, attribute: NameAttribute) -> &mut String {
        match attribute {
            NameAttribute::CommonName => &mut self.common_name,
            NameAttribute::Country => &mut self.country_code,
            NameAttribute::Locality => &mut self.city,
            NameAttribute::StateOrProvince => &mut self.state,
            NameAttribute::Organization => &mut self.organization,
            NameAttribute::OrganizationalUnit => &mut self.organizational_unit,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for DistinguishedName {
    /// Renders the populated fields most specific first, e.g. `CN=leaf, O=Example, C=US`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const ORDER: [NameAttribute; 6] = [
            NameAttribute::CommonName,
            NameAttribute::OrganizationalUnit,
            NameAttribute::Organization,
            NameAttribute::Locality,
            NameAttribute::StateOrProvince,
            NameAttribute::Country,
        ];

        let mut first = true;
        for attribute in ORDER {
            let value = self.get(attribute);
            if value.is_empty() {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{attribute}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Text of a `DirectoryString` or similar string value. `None` for non-string values.
fn directory_string(value: &Any) -> Option<String> {
    let any = AnyRef::from(value);
    let text = match any.tag() {
        Tag::Utf8String => Utf8StringRef::try_from(any).ok()?.to_string(),
        Tag::PrintableString => PrintableStringRef::try_from(any).ok()?.to_string(),
        Tag::Ia5String => Ia5StringRef::try_from(any).ok()?.to_string(),
        Tag::BmpString => BmpString::from_ucs2(any.value()).ok()?.to_string(),
        // Latin-1
        Tag::TeletexString => any.value().iter().copied().map(char::from).collect(),
        Tag::VisibleString | Tag::NumericString => std::str::from_utf8(any.value()).ok()?.to_owned(),
        _ => return None,
    };
    Some(text)
}

/// Display model of one X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCertificate {
    /// X.509 version as displayed (1, 2 or 3)
    pub version: u64,
    /// Serial number in decimal
    pub serial: String,
    /// Serial number in lower-case hex, without a sign octet
    pub serial_hex: String,
    pub signature_algorithm: String,
    pub issuer: DistinguishedName,
    pub subject: DistinguishedName,
    /// notBefore
    #[serde(with = "crate::display::rfc3339")]
    pub issued: DateTime<Utc>,
    /// notAfter
    #[serde(with = "crate::display::rfc3339")]
    pub expires: DateTime<Utc>,
    pub public_key_algorithm: String,
    /// Length of the subjectPublicKey BIT STRING data in bits. For RSA this
    /// counts the DER-encoded key, so it runs slightly above the modulus size.
    pub key_size: usize,
    pub subject_alternative_names: Vec<String>,
    /// Lower-case hex SHA-256 of the certificate DER
    pub fingerprint_sha256: String,
}

/// Decodes an already depth-checked node as an X.509 `Certificate`.
fn decode_certificate(node: &Asn1Node<'_>) -> Result<Certificate, CertificateFormatError> {
    node.expect(Tag::Sequence)?;
    Certificate::from_der(node.raw).map_err(CertificateFormatError::NotCertificate)
}

/// Parses a DER certificate with an explicit nesting bound.
///
/// # Arguments
/// * `der` - DER encoding of a `Certificate`
/// * `max_depth` - ASN.1 nesting bound applied to the certificate and to each extension value
///
/// # Returns
/// * `Result<ParsedCertificate, CertificateFormatError>` - the display model of the certificate
pub fn parse_certificate(
    der: &[u8],
    max_depth: usize,
) -> Result<ParsedCertificate, CertificateFormatError> {
    let root = parse_der_with_max_depth(der, max_depth)?;
    let certificate = decode_certificate(&root)?;
    let tbs = &certificate.tbs_certificate;

    let version = match tbs.version {
        Version::V1 => 1,
        Version::V2 => 2,
        Version::V3 => 3,
    };

    let serial_bytes = tbs.serial_number.as_bytes();
    let serial = BigInt::from_signed_bytes_be(serial_bytes).to_string();
    let serial_hex = match serial_bytes {
        [0, rest @ ..] if !rest.is_empty() => hex::encode(rest),
        _ => hex::encode(serial_bytes),
    };

    let spki = &tbs.subject_public_key_info;
    let subject_alternative_names =
        subject_alternative_names(tbs.extensions.as_deref().unwrap_or(&[]), max_depth)?;

    let parsed = ParsedCertificate {
        version,
        serial,
        serial_hex,
        signature_algorithm: algorithm_name(&tbs.signature.oid),
        issuer: DistinguishedName::from_name(&tbs.issuer),
        subject: DistinguishedName::from_name(&tbs.subject),
        issued: datetime(&tbs.validity.not_before),
        expires: datetime(&tbs.validity.not_after),
        public_key_algorithm: algorithm_name(&spki.algorithm.oid),
        key_size: spki.subject_public_key.raw_bytes().len() * 8,
        subject_alternative_names,
        fingerprint_sha256: hex::encode(Sha256::digest(der)),
    };

    log::trace!(
        "parsed certificate serial {} for '{}'",
        parsed.serial,
        parsed.subject
    );

    Ok(parsed)
}

impl ParsedCertificate {
    /// Parses a DER certificate using the default nesting bound.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateFormatError> {
        parse_certificate(der, DEFAULT_MAX_DEPTH)
    }

    /// Parses an envelope certificate field (base64 of PEM text).
    pub fn from_base64_pem(field: &str) -> Result<Self, InspectError> {
        let der = certificate_der_from_field(field)?;
        Ok(Self::from_der(&der)?)
    }
}

/// Common name of a certificate's issuer, from an already parsed `Certificate` node.
pub(crate) fn issuer_common_name(node: &Asn1Node<'_>) -> Result<String, CertificateFormatError> {
    let certificate = decode_certificate(node)?;
    Ok(DistinguishedName::from_name(&certificate.tbs_certificate.issuer).common_name)
}

fn datetime(time: &Time) -> DateTime<Utc> {
    DateTime::<Utc>::from(time.to_system_time())
}

fn subject_alternative_names(
    extensions: &[Extension],
    max_depth: usize,
) -> Result<Vec<String>, CertificateFormatError> {
    let mut names = Vec::new();

    for extension in extensions {
        if extension.extn_id != ID_CE_SUBJECT_ALT_NAME {
            log::trace!("ignoring extension {}", extension.extn_id);
            continue;
        }

        // decoded entry by entry so that one unsupported form does not hide the rest
        let general_names = parse_der_with_max_depth(extension.extn_value.as_bytes(), max_depth)?;
        for entry in &general_names.expect(Tag::Sequence)?.children {
            match entry.decode::<GeneralName>() {
                Ok(general_name) => match render_general_name(&general_name) {
                    Some(name) => names.push(name),
                    None => log::debug!("skipping {} general name without text form", entry.tag),
                },
                Err(e) => log::debug!("skipping {} general name: {e}", entry.tag),
            }
        }
    }

    Ok(names)
}

fn render_general_name(name: &GeneralName) -> Option<String> {
    match name {
        GeneralName::Rfc822Name(text)
        | GeneralName::DnsName(text)
        | GeneralName::UniformResourceIdentifier(text) => Some(text.as_str().to_owned()),
        GeneralName::DirectoryName(dn) => Some(DistinguishedName::from_name(dn).to_string()),
        GeneralName::IpAddress(address) => {
            let octets = address.as_bytes();
            if let Ok(v4) = <[u8; 4]>::try_from(octets) {
                Some(Ipv4Addr::from(v4).to_string())
            } else if let Ok(v6) = <[u8; 16]>::try_from(octets) {
                Some(Ipv6Addr::from(v6).to_string())
            } else {
                Some(hex::encode(octets))
            }
        }
        GeneralName::RegisteredId(oid) => Some(oid.to_string()),
        GeneralName::OtherName(other) => directory_string(&other.value),
        _ => None,
    }
}
