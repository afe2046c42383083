//! Object identifiers shared by the certificate and timestamp extractors.

use const_oid::{
    db::{rfc5912, rfc8410},
    ObjectIdentifier,
};

pub use const_oid::db::{
    rfc5280::ID_CE_SUBJECT_ALT_NAME,
    rfc5911::{ID_SIGNED_DATA, ID_SIGNING_TIME},
};

// Not in const_oid
pub const ID_CT_TST_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.1.4");

/// Distinguished name attributes mapped onto name fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum NameAttribute {
    #[strum(serialize = "CN")]
    CommonName,
    #[strum(serialize = "C")]
    Country,
    #[strum(serialize = "L")]
    Locality,
    #[strum(serialize = "ST")]
    StateOrProvince,
    #[strum(serialize = "O")]
    Organization,
    #[strum(serialize = "OU")]
    OrganizationalUnit,
}

const NAME_ATTRIBUTES: &[(ObjectIdentifier, NameAttribute)] = &[
    (ObjectIdentifier::new_unwrap("2.5.4.3"), NameAttribute::CommonName),
    (ObjectIdentifier::new_unwrap("2.5.4.6"), NameAttribute::Country),
    (ObjectIdentifier::new_unwrap("2.5.4.7"), NameAttribute::Locality),
    (ObjectIdentifier::new_unwrap("2.5.4.8"), NameAttribute::StateOrProvince),
    (ObjectIdentifier::new_unwrap("2.5.4.10"), NameAttribute::Organization),
    (ObjectIdentifier::new_unwrap("2.5.4.11"), NameAttribute::OrganizationalUnit),
];

impl NameAttribute {
    /// Looks up the attribute for an OID. `None` means the attribute is not tracked.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        NAME_ATTRIBUTES
            .iter()
            .find(|(known, _)| known == oid)
            .map(|(_, attribute)| *attribute)
    }
}

const ALGORITHM_NAMES: &[(ObjectIdentifier, &str)] = &[
    (rfc5912::RSA_ENCRYPTION, "rsaEncryption"),
    (rfc5912::SHA_1_WITH_RSA_ENCRYPTION, "sha1WithRSAEncryption"),
    (rfc5912::ID_RSASSA_PSS, "rsassaPss"),
    (rfc5912::SHA_256_WITH_RSA_ENCRYPTION, "sha256WithRSAEncryption"),
    (rfc5912::SHA_384_WITH_RSA_ENCRYPTION, "sha384WithRSAEncryption"),
    (rfc5912::SHA_512_WITH_RSA_ENCRYPTION, "sha512WithRSAEncryption"),
    (rfc5912::ID_EC_PUBLIC_KEY, "id-ecPublicKey"),
    (rfc5912::ECDSA_WITH_SHA_256, "ecdsa-with-SHA256"),
    (rfc5912::ECDSA_WITH_SHA_384, "ecdsa-with-SHA384"),
    (rfc5912::ECDSA_WITH_SHA_512, "ecdsa-with-SHA512"),
    (rfc8410::ID_ED_25519, "ED25519"),
    (rfc8410::ID_ED_448, "ED448"),
    (rfc5912::ID_SHA_256, "sha256"),
    (rfc5912::ID_SHA_384, "sha384"),
    (rfc5912::ID_SHA_512, "sha512"),
];

/// Friendly name of a signature, key or digest algorithm, or the dotted OID when unknown.
pub fn algorithm_name(oid: &ObjectIdentifier) -> String {
    ALGORITHM_NAMES
        .iter()
        .find(|(known, _)| known == oid)
        .map(|(_, name)| (*name).to_owned())
        .unwrap_or_else(|| oid.to_string())
}
