#![forbid(unsafe_code)]

//! Certificate thumbprints.

use crate::certificate::X509Certificate;
use std::fmt;
use std::str::FromStr;
use xmlsign_core::Error;

/// Hash the thumbprint was computed with, implied by its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbprintKind {
    Sha1,
    Sha256,
}

/// A normalized certificate thumbprint: upper-case hex of the SHA-1 (or
/// SHA-256) hash of the DER certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Thumbprint {
    hex: String,
    kind: ThumbprintKind,
}

impl Thumbprint {
    pub fn kind(&self) -> ThumbprintKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// Whether `certificate` hashes to this thumbprint.
    pub fn matches(&self, certificate: &X509Certificate) -> bool {
        let actual = match self.kind {
            ThumbprintKind::Sha1 => certificate.thumbprint_sha1(),
            ThumbprintKind::Sha256 => certificate.thumbprint_sha256(),
        };
        actual == self.hex
    }
}

impl FromStr for Thumbprint {
    type Err = Error;

    /// Separators (`:`, whitespace) and U+200E left-to-right marks, which
    /// certificate viewers put in front of copied thumbprints, are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':' && *c != '\u{200E}')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if hex.is_empty() {
            return Err(Error::InvalidThumbprint("empty thumbprint".into()));
        }
        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::InvalidThumbprint(format!(
                "{s:?} contains non-hex character {bad:?}"
            )));
        }
        let kind = match hex.len() {
            40 => ThumbprintKind::Sha1,
            64 => ThumbprintKind::Sha256,
            n => {
                return Err(Error::InvalidThumbprint(format!(
                    "{s:?} has {n} hex digits, expected 40 (SHA-1) or 64 (SHA-256)"
                )))
            }
        };
        Ok(Self { hex, kind })
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}
