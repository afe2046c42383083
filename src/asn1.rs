//! A bounded DER reader producing a tagged ASN.1 node tree.
//!
//! Headers are read with [`der::Header`] from a [`der::SliceReader`]; this
//! module only adds the tree and a nesting bound. Anything deeper than the
//! configured limit is rejected with [`ParseError::DepthExceeded`] before
//! recursion can exhaust the stack. Typed decoding (certificates, CMS) goes
//! through [`Asn1Node::decode`], so it only ever sees depth-checked input.

use der::{Decode, Header, Reader, SliceReader, Tag};

use crate::errors::ParseError;

/// Default nesting limit for DER structures.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// One TLV element of a parsed DER structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asn1Node<'a> {
    pub tag: Tag,
    /// The complete encoding of this element, header included.
    pub raw: &'a [u8],
    /// The content octets.
    pub content: &'a [u8],
    /// Child elements of a constructed element; empty for primitives.
    pub children: Vec<Asn1Node<'a>>,
}

/// Parses a single DER element spanning all of `bytes`, using [`DEFAULT_MAX_DEPTH`].
pub fn parse_der(bytes: &[u8]) -> Result<Asn1Node<'_>, ParseError> {
    parse_der_with_max_depth(bytes, DEFAULT_MAX_DEPTH)
}

/// Parses a single DER element spanning all of `bytes`.
///
/// # Arguments
/// * `bytes` - DER encoding of exactly one element
/// * `max_depth` - nesting bound; the top-level element is depth 1
///
/// # Returns
/// * `Result<Asn1Node, ParseError>` - the node tree, or the first structural error found
pub fn parse_der_with_max_depth(bytes: &[u8], max_depth: usize) -> Result<Asn1Node<'_>, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut reader = SliceReader::new(bytes)?;
    let node = read_node(&mut reader, 1, max_depth)?;

    if !reader.is_finished() {
        return Err(ParseError::TrailingData(reader.remaining_len().into()));
    }

    Ok(node)
}

fn read_node<'a>(
    reader: &mut SliceReader<'a>,
    depth: usize,
    max_depth: usize,
) -> Result<Asn1Node<'a>, ParseError> {
    if depth > max_depth {
        return Err(ParseError::DepthExceeded(max_depth));
    }

    let raw = reader.tlv_bytes()?;
    let mut tlv = SliceReader::new(raw)?;
    let header = Header::decode(&mut tlv)?;
    let content = tlv.read_slice(header.length)?;

    let mut children = Vec::new();
    if header.tag.is_constructed() {
        let mut inner = SliceReader::new(content)?;
        while !inner.is_finished() {
            children.push(read_node(&mut inner, depth + 1, max_depth)?);
        }
    }

    log::trace!("parsed {} ({} bytes) at depth {depth}", header.tag, content.len());

    Ok(Asn1Node {
        tag: header.tag,
        raw,
        content,
        children,
    })
}

impl<'a> Asn1Node<'a> {
    /// Fails with [`ParseError::UnexpectedTag`] unless this element carries `expected`.
    pub fn expect(&self, expected: Tag) -> Result<&Self, ParseError> {
        if self.tag == expected {
            Ok(self)
        } else {
            Err(ParseError::UnexpectedTag {
                expected,
                found: self.tag,
            })
        }
    }

    /// The child at `index`, or [`ParseError::MissingElement`].
    pub fn child(&self, index: usize, expected: &'static str) -> Result<&Asn1Node<'a>, ParseError> {
        self.children
            .get(index)
            .ok_or(ParseError::MissingElement { expected })
    }

    /// Decodes this element as a typed `der` value.
    pub fn decode<T: Decode<'a>>(&self) -> Result<T, ParseError> {
        Ok(T::from_der(self.raw)?)
    }
}
