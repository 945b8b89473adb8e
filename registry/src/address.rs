//! # Addresses & Content Hashes
//!
//! Identity in Gyro is a 20-byte opaque address. No key material lives in
//! this crate — signature checking (when the network needs it) happens a
//! layer above. Down here an address is just a stable map key with a hex
//! face, which is all the registry and escrow ledger ever ask of it.
//!
//! [`ContentHash`] is the 32-byte digest pinned to each spinner at mint
//! time. The registry treats it as opaque; [`ContentHash::digest`] exists
//! so callers and tests can derive one from raw image bytes the same way
//! the minting pipeline does.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Byte length of an [`Address`].
pub const ADDRESS_LENGTH: usize = 20;

/// Byte length of a [`ContentHash`].
pub const CONTENT_HASH_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account identity.
///
/// Ordered and hashable so it can key the ownership, escrow, and holdings
/// maps. Serialized as a `0x`-prefixed hex string for API transport.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; ADDRESS_LENGTH]);

impl Address {
    /// The null address. Never owns anything; used as the "no approval"
    /// sentinel at the wire boundary and rejected as a transfer recipient.
    pub const NULL: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Returns `true` if this is the null address.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Generates a random address. Test and devnet convenience — real
    /// deployments derive addresses from key material upstream.
    pub fn random() -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes[..]);
        Address(bytes)
    }

    /// Parses an address from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(s)?;
        let bytes: [u8; ADDRESS_LENGTH] = raw
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Address(bytes))
    }

    /// Renders the address as a `0x`-prefixed lowercase hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ContentHash
// ---------------------------------------------------------------------------

/// The 32-byte content digest of a spinner's artwork.
///
/// Opaque to the registry. Equality is all that matters here.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; CONTENT_HASH_LENGTH]);

impl ContentHash {
    /// Hashes raw content bytes with SHA-256.
    pub fn digest(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        ContentHash(hasher.finalize().into())
    }

    /// Parses a content hash from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(s)?;
        let bytes: [u8; CONTENT_HASH_LENGTH] = raw
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(ContentHash(bytes))
    }

    /// Renders the hash as a `0x`-prefixed lowercase hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContentHash::from_hex(&s).map_err(de::Error::custom)
    }
}
