//! RFC 3161 timestamp token extraction.
//!
//! A token is a CMS `ContentInfo` wrapping `SignedData`. The display model
//! needs two things from it: the `signingTime` signed attribute of the first
//! signer, and the issuer common name of the first embedded certificate (the
//! timestamp authority). The authority certificate is kept as DER so the
//! normalizer can add it to the signature's intermediates.

use chrono::{DateTime, Duration, Utc};
use cms::{
    content_info::ContentInfo,
    signed_data::{SignedAttributes, SignedData},
};
use der::{
    asn1::{GeneralizedTime, IntRef, ObjectIdentifier, UtcTime},
    Decode, DecodeValue, Encode, FixedTag, Header, Length, Reader, SliceReader, Tag, TagNumber,
    Tagged,
};
use num_bigint::BigInt;
use serde::Serialize;

use crate::{
    asn1::{parse_der_with_max_depth, Asn1Node},
    certificate::issuer_common_name,
    config::NormalizeOptions,
    encoding::{certificate_field_from_der, decode_base64},
    errors::{InspectError, ParseError},
    oids::{ID_CT_TST_INFO, ID_SIGNED_DATA, ID_SIGNING_TIME},
};

/// `certificates [0] IMPLICIT CertificateSet` within `SignedData`.
const CERTIFICATES_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};

/// Time and authority of one timestamp, as displayed next to a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampInfo {
    #[serde(with = "crate::display::rfc3339")]
    pub date: DateTime<Utc>,
    /// Issuer common name of the timestamp authority certificate, empty when unavailable
    pub issuer: String,
}

/// Fields of the `TSTInfo` carried as the token's encapsulated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TstInfo {
    pub policy: String,
    pub serial_number: String,
    #[serde(with = "crate::display::rfc3339")]
    pub gen_time: DateTime<Utc>,
    pub nonce: Option<String>,
}

/// Everything extracted from one timestamp token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampToken {
    /// `signingTime` attribute of the first signer, if present
    pub signing_time: Option<DateTime<Utc>>,
    /// Issuer common name of `certificates[0]`
    pub authority_issuer_common_name: Option<String>,
    /// DER of `certificates[0]`
    pub authority_certificate_der: Option<Vec<u8>>,
    pub tst_info: Option<TstInfo>,
}

impl TimestampToken {
    /// Decodes a base64 token blob with default options.
    pub fn from_base64(data: &str) -> Result<Self, InspectError> {
        let der = decode_base64(data.trim(), false)?;
        Ok(Self::from_der(&der)?)
    }

    /// Parses token DER with default options.
    pub fn from_der(der: &[u8]) -> Result<Self, ParseError> {
        parse_timestamp_token(der, &NormalizeOptions::default())
    }

    /// The display model of this token. `None` when the signer carries no `signingTime`.
    pub fn timestamp_info(&self) -> Option<TimestampInfo> {
        self.signing_time.map(|date| TimestampInfo {
            date,
            issuer: self
                .authority_issuer_common_name
                .clone()
                .unwrap_or_default(),
        })
    }

    /// The authority certificate in envelope field form (base64 of PEM text).
    pub fn authority_certificate_field(&self) -> Option<String> {
        self.authority_certificate_der
            .as_deref()
            .map(certificate_field_from_der)
    }
}

/// Parses a timestamp token, or a full `TimeStampResp` when the options allow it.
///
/// # Arguments
/// * `der` - DER of a `ContentInfo`, or of a `TimeStampResp`
/// * `options` - nesting bound and response handling
///
/// # Returns
/// * `Result<TimestampToken, ParseError>` - the extracted token fields
pub fn parse_timestamp_token(
    der: &[u8],
    options: &NormalizeOptions,
) -> Result<TimestampToken, ParseError> {
    let root = parse_der_with_max_depth(der, options.max_depth)?;
    let content_info_node = unwrap_response(&root, options)?;

    let content_info: ContentInfo = content_info_node.decode()?;
    if content_info.content_type != ID_SIGNED_DATA {
        return Err(ParseError::UnexpectedContentType(content_info.content_type));
    }
    let signed_data = SignedData::from_der(&content_info.content.to_der()?)?;

    let signing_time = match signed_data.signer_infos.0.iter().next() {
        Some(signer) => match &signer.signed_attrs {
            Some(attributes) => signing_time(attributes)?,
            None => None,
        },
        None => None,
    };
    if signing_time.is_none() {
        log::debug!("timestamp token carries no signingTime attribute");
    }

    let (authority_issuer_common_name, authority_certificate_der) =
        match first_certificate(content_info_node) {
            Some(certificate) => {
                let issuer = match issuer_common_name(certificate) {
                    Ok(cn) => Some(cn),
                    Err(e) => {
                        log::warn!("unable to read timestamp authority issuer: {e}");
                        None
                    }
                };
                (issuer, Some(certificate.raw.to_vec()))
            }
            None => (None, None),
        };

    let encapsulated = &signed_data.encap_content_info;
    let tst_info = match &encapsulated.econtent {
        Some(econtent) if encapsulated.econtent_type == ID_CT_TST_INFO => {
            if econtent.tag() != Tag::OctetString {
                return Err(ParseError::UnexpectedTag {
                    expected: Tag::OctetString,
                    found: econtent.tag(),
                });
            }
            Some(parse_tst_info(econtent.value(), options.max_depth)?)
        }
        _ => None,
    };

    Ok(TimestampToken {
        signing_time,
        authority_issuer_common_name,
        authority_certificate_der,
        tst_info,
    })
}

/// Returns the `ContentInfo` node, unwrapping a `TimeStampResp` when allowed.
fn unwrap_response<'n, 'a>(
    root: &'n Asn1Node<'a>,
    options: &NormalizeOptions,
) -> Result<&'n Asn1Node<'a>, ParseError> {
    root.expect(Tag::Sequence)?;

    // a ContentInfo starts with an OID, a TimeStampResp with PKIStatusInfo
    match root.children.first() {
        Some(first) if options.accept_timestamp_responses && first.tag == Tag::Sequence => {
            let status: u8 = first.child(0, "PKIStatus")?.decode()?;
            log::trace!("unwrapping TimeStampResp with status {status}");

            root.children
                .get(1)
                .ok_or(ParseError::NoTimeStampToken(status))
        }
        _ => Ok(root),
    }
}

/// `certificates[0]` in wire order, as a node of the token's own tree.
fn first_certificate<'n, 'a>(content_info: &'n Asn1Node<'a>) -> Option<&'n Asn1Node<'a>> {
    let signed_data = content_info.children.get(1)?.children.first()?;
    signed_data
        .children
        .iter()
        .find(|field| field.tag == CERTIFICATES_TAG)?
        .children
        .first()
        .filter(|choice| choice.tag == Tag::Sequence)
}

fn signing_time(attributes: &SignedAttributes) -> Result<Option<DateTime<Utc>>, ParseError> {
    let Some(attribute) = attributes.iter().find(|attribute| attribute.oid == ID_SIGNING_TIME)
    else {
        return Ok(None);
    };

    let value = attribute
        .values
        .iter()
        .next()
        .ok_or(ParseError::MissingElement {
            expected: "signingTime value",
        })?;

    let time = match value.tag() {
        Tag::UtcTime => UtcTime::from_der(&value.to_der()?)?.to_system_time(),
        Tag::GeneralizedTime => GeneralizedTime::from_der(&value.to_der()?)?.to_system_time(),
        found => {
            return Err(ParseError::UnexpectedTag {
                expected: Tag::UtcTime,
                found,
            })
        }
    };

    Ok(Some(DateTime::<Utc>::from(time)))
}

fn parse_tst_info(encoded: &[u8], max_depth: usize) -> Result<TstInfo, ParseError> {
    let root = parse_der_with_max_depth(encoded, max_depth)?;
    let info: EncodedTstInfo<'_> = root.decode()?;
    log::trace!("decoded TSTInfo version {}", info.version);

    Ok(TstInfo {
        policy: info.policy.to_string(),
        serial_number: big_integer(info.serial_number),
        gen_time: info.gen_time.0,
        nonce: info.nonce.map(big_integer),
    })
}

fn big_integer(value: IntRef<'_>) -> String {
    BigInt::from_signed_bytes_be(value.as_bytes()).to_string()
}

/// `TSTInfo` from RFC 3161, read up to the nonce.
///
/// ```text
/// TSTInfo ::= SEQUENCE  {
///     version                      INTEGER  { v1(1) },
///     policy                       TSAPolicyId,
///     messageImprint               MessageImprint,
///     serialNumber                 INTEGER,
///     genTime                      GeneralizedTime,
///     accuracy                     Accuracy                 OPTIONAL,
///     ordering                     BOOLEAN             DEFAULT FALSE,
///     nonce                        INTEGER                  OPTIONAL,
///     tsa                          [0] GeneralName          OPTIONAL,
///     extensions                   [1] IMPLICIT Extensions   OPTIONAL  }
/// ```
struct EncodedTstInfo<'a> {
    version: u8,
    policy: ObjectIdentifier,
    serial_number: IntRef<'a>,
    gen_time: GenTime,
    nonce: Option<IntRef<'a>>,
}

impl<'a> DecodeValue<'a> for EncodedTstInfo<'a> {
    fn decode_value<R: Reader<'a>>(decoder: &mut R, header: Header) -> der::Result<Self> {
        decoder.read_nested(header.length, |decoder| {
            let version = decoder.decode()?;
            let policy = decoder.decode()?;
            let _message_imprint = decoder.tlv_bytes()?;
            let serial_number = decoder.decode()?;
            let gen_time = decoder.decode()?;

            if next_is(decoder, Tag::Sequence)? {
                let _accuracy = decoder.tlv_bytes()?;
            }
            if next_is(decoder, Tag::Boolean)? {
                let _ordering = decoder.tlv_bytes()?;
            }
            let nonce = if next_is(decoder, Tag::Integer)? {
                Some(decoder.decode()?)
            } else {
                None
            };

            // tsa and extensions are not displayed
            let _remaining = decoder.read_slice(decoder.remaining_len())?;

            Ok(Self {
                version,
                policy,
                serial_number,
                gen_time,
                nonce,
            })
        })
    }
}

impl FixedTag for EncodedTstInfo<'_> {
    const TAG: Tag = Tag::Sequence;
}

fn next_is<'a, R: Reader<'a>>(decoder: &R, tag: Tag) -> der::Result<bool> {
    Ok(!decoder.is_finished() && decoder.peek_tag()? == tag)
}

/// `GeneralizedTime` that also accepts the fractional seconds TSAs emit.
///
/// `der::asn1::GeneralizedTime` rejects fractions, so the whole seconds are
/// handed to it and the fraction is added back as nanoseconds.
struct GenTime(DateTime<Utc>);

impl<'a> DecodeValue<'a> for GenTime {
    fn decode_value<R: Reader<'a>>(decoder: &mut R, header: Header) -> der::Result<Self> {
        let text = decoder.read_slice(header.length)?;

        // YYYYMMDDHHMMSS[.fraction]Z
        if text.len() < 15 {
            return Err(Self::TAG.value_error());
        }
        let (whole, rest) = text.split_at(14);
        let Some((&b'Z', fraction)) = rest.split_last() else {
            return Err(Self::TAG.value_error());
        };

        let nanos = match fraction {
            [] => 0,
            [b'.', digits @ ..]
                if !digits.is_empty() && digits.len() <= 9 && digits.iter().all(u8::is_ascii_digit) =>
            {
                let value = digits
                    .iter()
                    .fold(0i64, |acc, digit| acc * 10 + i64::from(digit - b'0'));
                value * 10i64.pow(9 - digits.len() as u32)
            }
            _ => return Err(Self::TAG.value_error()),
        };

        let mut seconds = [b'Z'; 15];
        seconds[..14].copy_from_slice(whole);
        let mut reader = SliceReader::new(&seconds)?;
        let time = GeneralizedTime::decode_value(
            &mut reader,
            Header::new(Tag::GeneralizedTime, Length::new(15))?,
        )?;

        Ok(Self(
            DateTime::<Utc>::from(time.to_system_time()) + Duration::nanoseconds(nanos),
        ))
    }
}

impl FixedTag for GenTime {
    const TAG: Tag = Tag::GeneralizedTime;
}
