//! Fixed-size byte buffers used to identify nodes, leaves and accounts on the rollup chain.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ParseBufErr;

/// A 32-byte hash identifying a node, a leaf or some opaque protocol commitment.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Buf32(#[serde(with = "hex::serde")] pub [u8; 32]);

impl From<[u8; 32]> for Buf32 {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for Buf32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Buf32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buf32({self})")
    }
}

impl FromStr for Buf32 {
    type Err = ParseBufErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut buf = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut buf)?;
        Ok(Self(buf))
    }
}

/// A 20-byte account address on the settlement chain.
///
/// Stakers, challenge contracts and the rollup contract itself are all identified by an
/// [`Address`].
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(#[serde(with = "hex::serde")] pub [u8; 20]);

impl From<[u8; 20]> for Address {
    fn from(value: [u8; 20]) -> Self {
        Self(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = ParseBufErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut buf = [0u8; 20];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut buf)?;
        Ok(Self(buf))
    }
}
