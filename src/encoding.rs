use base64::engine::{
    general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD as BASE64_URL_NO_PAD},
    Engine,
};

use crate::errors::DecodeError;

/// First line of a PEM-wrapped certificate.
pub const PEM_CERTIFICATE_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
/// Last line of a PEM-wrapped certificate.
pub const PEM_CERTIFICATE_END: &str = "-----END CERTIFICATE-----";

const PEM_LINE_WIDTH: usize = 64;

/// Decodes standard or URL-safe base64.
///
/// URL-safe input has `-` and `_` translated back to `+` and `/`. Missing `=`
/// padding is restored in both modes, so unpadded input decodes the same as
/// padded input.
///
/// # Arguments
/// * `text` - base64 text, without surrounding whitespace
/// * `url_safe` - whether `text` uses the URL-safe alphabet
///
/// # Returns
/// * `Result<Vec<u8>, DecodeError>` - decoded bytes, or `InvalidBase64` on a bad alphabet or length
pub fn decode_base64(text: &str, url_safe: bool) -> Result<Vec<u8>, DecodeError> {
    let mut normalized: String = if url_safe {
        text.chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                c => c,
            })
            .collect()
    } else {
        text.to_owned()
    };

    let remainder = normalized.len() % 4;
    if remainder != 0 {
        normalized.extend(std::iter::repeat('=').take(4 - remainder));
    }

    BASE64
        .decode(normalized)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

/// Encodes bytes as padded standard base64, or unpadded URL-safe base64.
pub fn encode_base64(bytes: &[u8], url_safe: bool) -> String {
    if url_safe {
        BASE64_URL_NO_PAD.encode(bytes)
    } else {
        BASE64.encode(bytes)
    }
}

/// Removes the certificate PEM armor lines and all embedded whitespace,
/// leaving the bare base64 body.
///
/// Applying it to already-stripped input returns the input unchanged.
pub fn strip_pem_headers(pem: &str) -> String {
    pem.replace(PEM_CERTIFICATE_BEGIN, "")
        .replace(PEM_CERTIFICATE_END, "")
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect()
}

/// Decodes a PEM certificate (armored or bare base64 body) to DER bytes.
pub fn pem_to_der(pem: &str) -> Result<Vec<u8>, DecodeError> {
    let body = strip_pem_headers(pem);
    if body.is_empty() {
        return Err(DecodeError::EmptyPem);
    }

    decode_base64(&body, false)
}

/// Wraps DER bytes in certificate PEM armor with 64-column lines.
pub fn der_to_pem(der: &[u8]) -> String {
    let body = BASE64.encode(der);

    let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
    pem.push_str(PEM_CERTIFICATE_BEGIN);
    pem.push('\n');
    // base64 output is ASCII, so byte chunks are valid str slices
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(PEM_CERTIFICATE_END);
    pem.push('\n');

    pem
}

/// Decodes an envelope certificate field to DER.
///
/// Envelope certificate fields are base64 of PEM text. Fields whose decoded
/// bytes are already a DER `SEQUENCE` are accepted as-is.
pub fn certificate_der_from_field(field: &str) -> Result<Vec<u8>, DecodeError> {
    let decoded = decode_base64(field.trim(), false)?;

    if decoded.first() == Some(&0x30) {
        log::trace!("certificate field holds raw DER");
        return Ok(decoded);
    }

    match std::str::from_utf8(&decoded) {
        Ok(pem) => pem_to_der(pem),
        Err(_) => Err(DecodeError::NotPemOrDer),
    }
}

/// Encodes DER certificate bytes the way envelopes carry them: base64 of PEM text.
pub fn certificate_field_from_der(der: &[u8]) -> String {
    encode_base64(der_to_pem(der).as_bytes(), false)
}
