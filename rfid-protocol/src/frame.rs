//! Protocol frame structure and line encoding/decoding

use crate::kind::MessageKind;
use std::fmt;

/// Separator between the kind prefix and the payload
pub const KIND_SEPARATOR: char = '_';

/// Separator between the body and the authentication tag
pub const TAG_SEPARATOR: char = '|';

/// Separator between the body and an optional checksum suffix
pub const CHECKSUM_SEPARATOR: char = ';';

/// One decoded protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    kind: MessageKind,
    payload: String,
    tag: Option<String>,
}

impl Frame {
    /// Create a new frame
    pub fn new(kind: MessageKind, payload: impl Into<String>, tag: Option<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
            tag,
        }
    }

    /// Decode a raw line
    ///
    /// The tag is everything after the last `|`. The kind is the text before
    /// the first `_` of the remaining body. Returns `None` when the body has
    /// no `_`, starts with one, or carries an unknown kind prefix.
    pub fn decode(raw_line: &str) -> Option<Self> {
        let line = raw_line.trim_end_matches(['\r', '\n']);

        let (body, tag) = match line.rfind(TAG_SEPARATOR) {
            Some(pos) => (&line[..pos], Some(line[pos + 1..].to_string())),
            None => (line, None),
        };

        let separator = body.find(KIND_SEPARATOR)?;
        if separator == 0 {
            return None;
        }

        let kind = MessageKind::from_prefix(&body[..separator])?;
        let payload = body[separator + 1..].to_string();

        Some(Self { kind, payload, tag })
    }

    /// Encode an untagged line, the form used for every reply
    pub fn encode(kind: MessageKind, payload: &str) -> String {
        format!("{}{}{}", kind.as_str(), KIND_SEPARATOR, payload)
    }

    /// Encode a line carrying an authentication tag
    pub fn encode_tagged(kind: MessageKind, payload: &str, tag: &str) -> String {
        format!("{}{}{}", Self::encode(kind, payload), TAG_SEPARATOR, tag)
    }

    /// Encode an untagged line followed by `;XXXX`
    ///
    /// The suffix is informational: [`Frame::decode`] does not strip or
    /// verify it.
    pub fn encode_with_checksum(kind: MessageKind, payload: &str) -> String {
        let base = Self::encode(kind, payload);
        let sum = checksum(&base);
        format!("{}{}{}", base, CHECKSUM_SEPARATOR, sum)
    }

    /// Get message kind
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Get payload
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Get the tag, if the line carried one
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => f.write_str(&Self::encode_tagged(self.kind, &self.payload, tag)),
            None => f.write_str(&Self::encode(self.kind, &self.payload)),
        }
    }
}

/// Byte sum modulo 65536 as four upper-case hex digits
pub fn checksum(text: &str) -> String {
    let sum = text
        .bytes()
        .fold(0u16, |acc, byte| acc.wrapping_add(u16::from(byte)));
    format!("{:04X}", sum)
}
