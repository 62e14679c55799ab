//! Fixed-width signature encoding: `r || s`, big-endian, each scalar at
//! the curve's element width.

use crate::Error;
use alloc::vec::Vec;

/// An ECDSA signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    r: Vec<u8>,
    s: Vec<u8>,
}

impl Signature {
    pub(crate) fn from_scalars(r: Vec<u8>, s: Vec<u8>) -> Self {
        debug_assert_eq!(r.len(), s.len());
        Self { r, s }
    }

    /// Parses `r || s` with both halves at the same width.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.is_empty() || bytes.len() % 2 != 0 {
            return Err(Error::BufferSize);
        }
        let (r, s) = bytes.split_at(bytes.len() / 2);
        Ok(Self {
            r: r.to_vec(),
            s: s.to_vec(),
        })
    }

    /// Serializes as `r || s`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.r.len() * 2);
        out.extend_from_slice(&self.r);
        out.extend_from_slice(&self.s);
        out
    }

    /// The scalar r, big-endian.
    pub fn r(&self) -> &[u8] {
        &self.r
    }

    /// The scalar s, big-endian.
    pub fn s(&self) -> &[u8] {
        &self.s
    }
}
