//! Stable Identifiers
//!
//! Every entity and asset is named by a 128-bit random identifier that
//! survives save/load. Unlike a generational index it carries no storage
//! position, so it can be written to disk and looked up again later.
//!
//! The all-zero value is reserved: it means "no relationship" and is used
//! as the null parent in the scene hierarchy.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};

use super::error::IdentifierError;

/// A 128-bit random identity (RFC 4122 version 4 layout).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identifier(Uuid);

impl Identifier {
    /// The reserved all-zero identifier.
    pub const NULL: Identifier = Identifier(Uuid::nil());

    /// Draw a fresh identifier from the thread-local random source.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Draw a fresh identifier from the given random source.
    ///
    /// Version and variant bits are fixed, so the result is never `NULL`.
    pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        Identifier(Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Wrap raw bytes without touching version/variant bits.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Identifier(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    /// Parse 32 hex digits, with or without dashes.
    ///
    /// Dashes are stripped wherever they appear; what remains must be
    /// exactly 32 hexadecimal characters.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let digits: String = input.chars().filter(|&c| c != '-').collect();
        if digits.len() != 32 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdentifierError::Malformed(input.to_string()));
        }
        Uuid::try_parse(&digits)
            .map(Identifier)
            .map_err(|_| IdentifierError::Malformed(input.to_string()))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0.hyphenated())
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

// Stored as the canonical 8-4-4-4-12 string
impl Serialize for Identifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Identifier::parse(&text).map_err(serde::de::Error::custom)
    }
}
