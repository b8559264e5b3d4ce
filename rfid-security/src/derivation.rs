//! Tag derivation from static secrets and the counter triple
//!
//! A tag is the first [`TAG_BYTES`] bytes of
//! `SHA-256(secret || init*step || limit+step || step+limit-init)`, where the
//! three numbers are rendered as signed decimal text, encoded as lower-case
//! hex. Any change of the counters changes the tag; computing it requires the
//! secret.

use crate::constants::{
    COUNTER_SEPARATOR, DEFAULT_HANDSHAKE_SECRET, DEFAULT_OPERATIONAL_SECRET,
};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of digest bytes kept in a tag (32 hex characters)
pub const TAG_BYTES: usize = 16;

/// Derive a tag from a secret and a counter triple
pub fn derive_tag(secret: &str, init: u32, step: u32, limit: u32) -> String {
    let (init, step, limit) = (i64::from(init), i64::from(step), i64::from(limit));
    let part1 = init * step;
    let part2 = limit + step;
    let part3 = step + limit - init;

    let material = format!("{}{}{}{}", secret, part1, part2, part3);
    let digest = Sha256::digest(material.as_bytes());
    hex::encode(&digest[..TAG_BYTES])
}

/// Counter triple negotiated by a handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterTriple {
    pub init: u32,
    pub step: u32,
    pub limit: u32,
}

impl CounterTriple {
    /// Create a new counter triple
    pub fn new(init: u32, step: u32, limit: u32) -> Self {
        Self { init, step, limit }
    }

    /// Parse `init:step:limit`
    ///
    /// Requires exactly two separators and three non-empty, all-digit,
    /// strictly positive fields that fit in `u32`. Anything else yields
    /// `None`.
    pub fn parse(text: &str) -> Option<Self> {
        if text.matches(COUNTER_SEPARATOR).count() != 2 {
            return None;
        }

        let mut fields = text.split(COUNTER_SEPARATOR).map(parse_positive);
        let init = fields.next()??;
        let step = fields.next()??;
        let limit = fields.next()??;

        Some(Self { init, step, limit })
    }

    /// Read `init:step:limit` the way the handshake hash is computed
    ///
    /// Each field contributes its leading decimal digits, clamped to `u32`;
    /// a missing or non-numeric field counts as zero. Never fails, so a
    /// claimed handshake hash can be checked before the counters are
    /// validated with [`CounterTriple::parse`].
    pub fn parse_lenient(text: &str) -> Self {
        let mut fields = text.split(COUNTER_SEPARATOR).map(leading_number);
        let mut next = || fields.next().unwrap_or(0);
        let (init, step, limit) = (next(), next(), next());
        Self { init, step, limit }
    }
}

fn leading_number(field: &str) -> u32 {
    field
        .trim_start()
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u32::from(digit - b'0'))
        })
}

fn parse_positive(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u32>().ok().filter(|value| *value > 0)
}

impl fmt::Display for CounterTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.init,
            self.step,
            self.limit,
            sep = COUNTER_SEPARATOR
        )
    }
}

/// Static secret material for tag derivation
///
/// The handshake secret only authenticates handshakes; the operational secret
/// only derives rolling tags. The two are never mixed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretDerivation {
    handshake_secret: String,
    operational_secret: String,
}

impl SecretDerivation {
    /// Create a derivation context from the two secrets
    pub fn new(handshake_secret: impl Into<String>, operational_secret: impl Into<String>) -> Self {
        Self {
            handshake_secret: handshake_secret.into(),
            operational_secret: operational_secret.into(),
        }
    }

    /// Hash a handshake must claim for the given triple
    pub fn handshake_tag(&self, triple: &CounterTriple) -> String {
        derive_tag(&self.handshake_secret, triple.init, triple.step, triple.limit)
    }

    /// Rolling tag for the given counters
    pub fn operational_tag(&self, init: u32, step: u32, limit: u32) -> String {
        derive_tag(&self.operational_secret, init, step, limit)
    }
}

impl Default for SecretDerivation {
    fn default() -> Self {
        Self::new(DEFAULT_HANDSHAKE_SECRET, DEFAULT_OPERATIONAL_SECRET)
    }
}

impl fmt::Debug for SecretDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretDerivation")
            .field("handshake_secret", &"<redacted>")
            .field("operational_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(material: &str) -> String {
        let digest = Sha256::digest(material.as_bytes());
        hex::encode(&digest[..16])
    }

    #[test]
    fn test_derive_tag_material() {
        // 1*2, 3+2, 2+3-1
        assert_eq!(derive_tag("k", 1, 2, 3), reference("k254"));
        // 996*14, 6698+14, 14+6698-996
        assert_eq!(
            derive_tag("secret", 996, 14, 6698),
            reference("secret1394467125716")
        );
    }

    #[test]
    fn test_derive_tag_negative_part() {
        // 10*1, 5+1, 1+5-10
        assert_eq!(derive_tag("k", 10, 1, 5), reference("k106-4"));
    }

    #[test]
    fn test_derive_tag_shape() {
        let tag = derive_tag("k", 10, 5, 100);
        assert_eq!(tag.len(), TAG_BYTES * 2);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_tag_changes_with_counters() {
        assert_ne!(derive_tag("k", 10, 5, 100), derive_tag("k", 15, 5, 100));
        assert_ne!(derive_tag("k", 10, 5, 100), derive_tag("j", 10, 5, 100));
    }

    #[test]
    fn test_parse_counter_triple() {
        assert_eq!(CounterTriple::parse("996:14:6698"), Some(CounterTriple::new(996, 14, 6698)));
        assert_eq!(CounterTriple::parse("10:5:100").unwrap().to_string(), "10:5:100");
    }

    #[test]
    fn test_parse_counter_triple_rejects() {
        for bad in [
            "", "10:5", "10:5:100:1", "10::100", ":5:100", "10:5:", "0:5:100", "10:0:100",
            "10:5:0", "-1:5:100", "+1:5:100", "1a:5:100", " 1:5:100", "10:5:99999999999",
        ] {
            assert_eq!(CounterTriple::parse(bad), None, "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(CounterTriple::parse_lenient("996:14:6698"), CounterTriple::new(996, 14, 6698));
        assert_eq!(CounterTriple::parse_lenient("10:5"), CounterTriple::new(10, 5, 0));
        assert_eq!(CounterTriple::parse_lenient("1a:x:99999999999"), CounterTriple::new(1, 0, u32::MAX));
        assert_eq!(CounterTriple::parse_lenient(""), CounterTriple::new(0, 0, 0));
    }

    #[test]
    fn test_secrets_are_separate() {
        let derivation = SecretDerivation::new("hs", "op");
        let triple = CounterTriple::new(10, 5, 100);
        assert_eq!(derivation.handshake_tag(&triple), derive_tag("hs", 10, 5, 100));
        assert_eq!(derivation.operational_tag(10, 5, 100), derive_tag("op", 10, 5, 100));
        assert_ne!(derivation.handshake_tag(&triple), derivation.operational_tag(10, 5, 100));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", SecretDerivation::new("hs-secret", "op-secret"));
        assert!(!rendered.contains("hs-secret"));
        assert!(!rendered.contains("op-secret"));
    }
}
