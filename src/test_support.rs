//! Builders for DER structures used by unit tests.

pub const LEAF_PEM: &str = include_str!("../testdata/leaf.pem");
pub const LEAF_CN_ONLY_PEM: &str = include_str!("../testdata/leaf_cn_only.pem");
pub const INTERMEDIATE_PEM: &str = include_str!("../testdata/intermediate.pem");
pub const TSA_PEM: &str = include_str!("../testdata/tsa.pem");
pub const TSA_TOKEN_B64: &str = include_str!("../testdata/tsa_token.b64");
pub const TSA_RESPONSE_B64: &str = include_str!("../testdata/tsa_response.b64");

/// A certificate fixture in envelope field form: base64 of the PEM text.
pub fn pem_field(pem: &str) -> String {
    crate::encoding::encode_base64(pem.as_bytes(), false)
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub mod der {
    use ::der::{
        asn1::{AnyRef, BitStringRef, Null, ObjectIdentifier, OctetStringRef, Utf8StringRef},
        Encode, Tag, TagNumber,
    };

    use crate::oids;

    pub fn encode(value: impl Encode) -> Vec<u8> {
        value.to_der().expect("test value should encode")
    }

    /// An element with an arbitrary tag and raw content octets.
    pub fn tlv(tag: Tag, content: &[u8]) -> Vec<u8> {
        encode(AnyRef::new(tag, content).expect("content fits a DER length"))
    }

    pub fn seq(items: &[Vec<u8>]) -> Vec<u8> {
        tlv(Tag::Sequence, &items.concat())
    }

    /// Items must already be in DER SET order.
    pub fn set(items: &[Vec<u8>]) -> Vec<u8> {
        tlv(Tag::Set, &items.concat())
    }

    /// Wraps `inner` in `levels` SEQUENCEs.
    pub fn nested(inner: Vec<u8>, levels: usize) -> Vec<u8> {
        (0..levels).fold(inner, |acc, _| seq(&[acc]))
    }

    /// Constructed context-specific tag.
    pub fn ctx(number: u8, items: &[Vec<u8>]) -> Vec<u8> {
        let tag = Tag::ContextSpecific {
            constructed: true,
            number: TagNumber::new(number),
        };
        tlv(tag, &items.concat())
    }

    /// Primitive context-specific tag.
    pub fn ctx_prim(number: u8, content: &[u8]) -> Vec<u8> {
        let tag = Tag::ContextSpecific {
            constructed: false,
            number: TagNumber::new(number),
        };
        tlv(tag, content)
    }

    pub fn null() -> Vec<u8> {
        encode(Null)
    }

    pub fn boolean(value: bool) -> Vec<u8> {
        encode(value)
    }

    pub fn int(value: u64) -> Vec<u8> {
        encode(value)
    }

    /// An INTEGER with raw content octets, which need not fit any machine type.
    pub fn int_bytes(content: &[u8]) -> Vec<u8> {
        tlv(Tag::Integer, content)
    }

    pub fn object_id(oid: ObjectIdentifier) -> Vec<u8> {
        encode(oid)
    }

    pub fn oid(dotted: &str) -> Vec<u8> {
        object_id(ObjectIdentifier::new_unwrap(dotted))
    }

    /// Content octets of an OBJECT IDENTIFIER, for implicitly tagged OIDs.
    pub fn oid_content(dotted: &str) -> Vec<u8> {
        ObjectIdentifier::new_unwrap(dotted).as_bytes().to_vec()
    }

    pub fn utf8(value: &str) -> Vec<u8> {
        encode(Utf8StringRef::new(value).expect("valid UTF8String"))
    }

    /// Times are built from raw text so malformed and fractional forms can be tested.
    pub fn utc_time(value: &str) -> Vec<u8> {
        tlv(Tag::UtcTime, value.as_bytes())
    }

    pub fn generalized_time(value: &str) -> Vec<u8> {
        tlv(Tag::GeneralizedTime, value.as_bytes())
    }

    pub fn octets(content: &[u8]) -> Vec<u8> {
        encode(OctetStringRef::new(content).expect("valid OCTET STRING"))
    }

    pub fn bit_string(data: &[u8]) -> Vec<u8> {
        encode(BitStringRef::from_bytes(data).expect("valid BIT STRING"))
    }

    pub fn algorithm(dotted: &str) -> Vec<u8> {
        seq(&[oid(dotted)])
    }

    /// One single-valued RDN with an encoded attribute value.
    pub fn rdn(dotted: &str, value: Vec<u8>) -> Vec<u8> {
        set(&[seq(&[oid(dotted), value])])
    }

    /// A Name with one single-valued UTF8String RDN per attribute.
    pub fn name(attributes: &[(&str, &str)]) -> Vec<u8> {
        let rdns: Vec<Vec<u8>> = attributes
            .iter()
            .map(|(dotted, value)| rdn(dotted, utf8(value)))
            .collect();
        seq(&rdns)
    }

    pub fn extension(oid: ObjectIdentifier, critical: bool, value: &[u8]) -> Vec<u8> {
        let mut fields = vec![object_id(oid)];
        if critical {
            fields.push(boolean(true));
        }
        fields.push(octets(value));
        seq(&fields)
    }

    pub fn subject_alt_names(names: &[Vec<u8>]) -> Vec<u8> {
        extension(oids::ID_CE_SUBJECT_ALT_NAME, false, &seq(names))
    }

    /// A minimal X.509 certificate. Contents are structurally valid but unsigned.
    pub struct TestCertificate {
        /// Encoded INTEGER placed inside the `[0]` version field.
        pub version: Vec<u8>,
        pub serial: u64,
        /// Encoded issuer `Name`.
        pub issuer: Vec<u8>,
        /// Encoded subject `Name`.
        pub subject: Vec<u8>,
        /// Encoded time elements placed inside the validity SEQUENCE.
        pub validity: Vec<Vec<u8>>,
        pub public_key: Vec<u8>,
        pub extensions: Vec<Vec<u8>>,
    }

    impl Default for TestCertificate {
        fn default() -> Self {
            Self {
                version: int(2),
                serial: 1,
                issuer: name(&[("2.5.4.10", "Test Org"), ("2.5.4.3", "Test CA")]),
                subject: name(&[("2.5.4.3", "test-leaf")]),
                validity: vec![utc_time("240101000000Z"), utc_time("250101000000Z")],
                public_key: vec![0x04; 65],
                extensions: Vec::new(),
            }
        }
    }

    impl TestCertificate {
        pub fn build(&self) -> Vec<u8> {
            let mut tbs = vec![
                ctx(0, &[self.version.clone()]),
                int(self.serial),
                algorithm("1.2.840.10045.4.3.2"),
                self.issuer.clone(),
                seq(&self.validity),
                self.subject.clone(),
                seq(&[
                    seq(&[oid("1.2.840.10045.2.1"), oid("1.2.840.10045.3.1.7")]),
                    bit_string(&self.public_key),
                ]),
            ];
            if !self.extensions.is_empty() {
                tbs.push(ctx(3, &[seq(&self.extensions)]));
            }

            seq(&[
                seq(&tbs),
                algorithm("1.2.840.10045.4.3.2"),
                bit_string(&[0xde, 0xad, 0xbe, 0xef]),
            ])
        }
    }

    pub fn attribute(oid: ObjectIdentifier, values: &[Vec<u8>]) -> Vec<u8> {
        seq(&[object_id(oid), set(values)])
    }

    pub fn signing_time_attribute(time: Vec<u8>) -> Vec<u8> {
        attribute(oids::ID_SIGNING_TIME, &[time])
    }

    pub fn content_type_attribute() -> Vec<u8> {
        attribute(
            ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3"),
            &[object_id(oids::ID_CT_TST_INFO)],
        )
    }

    /// A CMS ContentInfo carrying SignedData shaped like an RFC 3161 token.
    pub struct TestToken {
        pub content_type: ObjectIdentifier,
        /// `None` omits the signed attributes entirely. Entries must be in DER SET order.
        pub signed_attributes: Option<Vec<Vec<u8>>>,
        pub certificates: Vec<Vec<u8>>,
        /// Encoded TSTInfo placed in the encapsulated content.
        pub tst_info: Option<Vec<u8>>,
    }

    impl Default for TestToken {
        fn default() -> Self {
            Self {
                content_type: oids::ID_SIGNED_DATA,
                signed_attributes: Some(vec![
                    content_type_attribute(),
                    signing_time_attribute(utc_time("230510143000Z")),
                ]),
                certificates: Vec::new(),
                tst_info: None,
            }
        }
    }

    impl TestToken {
        pub fn build(&self) -> Vec<u8> {
            let mut encapsulated = vec![object_id(oids::ID_CT_TST_INFO)];
            if let Some(tst_info) = &self.tst_info {
                encapsulated.push(ctx(0, &[octets(tst_info)]));
            }

            let mut signer_info = vec![
                int(1),
                seq(&[name(&[("2.5.4.3", "Test CA")]), int(1)]),
                algorithm("2.16.840.1.101.3.4.2.1"),
            ];
            if let Some(attributes) = &self.signed_attributes {
                signer_info.push(ctx(0, attributes));
            }
            signer_info.push(algorithm("1.2.840.10045.4.3.2"));
            signer_info.push(octets(&[0x01, 0x02, 0x03]));

            let mut signed_data = vec![
                int(3),
                set(&[algorithm("2.16.840.1.101.3.4.2.1")]),
                seq(&encapsulated),
            ];
            if !self.certificates.is_empty() {
                signed_data.push(ctx(0, &self.certificates));
            }
            signed_data.push(set(&[seq(&signer_info)]));

            seq(&[object_id(self.content_type), ctx(0, &[seq(&signed_data)])])
        }
    }

    /// TSTInfo with a fixed imprint and optional nonce.
    pub fn tst_info(policy: &str, serial: u64, gen_time: &str, nonce: Option<u64>) -> Vec<u8> {
        tst_info_with_version(int(1), policy, serial, gen_time, nonce)
    }

    /// TSTInfo with an encoded version INTEGER.
    pub fn tst_info_with_version(
        version: Vec<u8>,
        policy: &str,
        serial: u64,
        gen_time: &str,
        nonce: Option<u64>,
    ) -> Vec<u8> {
        let mut fields = vec![
            version,
            oid(policy),
            seq(&[algorithm("2.16.840.1.101.3.4.2.1"), octets(&[0xaa; 32])]),
            int(serial),
            generalized_time(gen_time),
        ];
        if let Some(nonce) = nonce {
            fields.push(int(nonce));
        }
        seq(&fields)
    }

    /// An RFC 3161 TimeStampResp with an encoded PKIStatus INTEGER.
    pub fn time_stamp_response(status: Vec<u8>, token: Option<Vec<u8>>) -> Vec<u8> {
        let mut fields = vec![seq(&[status])];
        fields.extend(token);
        seq(&fields)
    }
}
