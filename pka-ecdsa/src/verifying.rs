//! Verifying keys and signature verification.

use crate::signature::Signature;
use crate::signing::load_digest;
use crate::Error;
use alloc::vec::Vec;
use pka_weierstrass::{CurveId, CurveSession};

/// An ECDSA public key: affine coordinates at the curve's element width.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifyingKey {
    curve: CurveId,
    x: Vec<u8>,
    y: Vec<u8>,
}

impl VerifyingKey {
    /// Coordinates straight from the engine, already validated.
    pub(crate) fn from_parts(curve: CurveId, x: Vec<u8>, y: Vec<u8>) -> Self {
        Self { curve, x, y }
    }

    /// Imports and validates a public key.
    pub fn from_coords(curve: CurveId, x: &[u8], y: &[u8]) -> Result<Self, Error> {
        let mut session = CurveSession::open(curve)?;
        if x.len() != session.params().element_bytes() || y.len() != x.len() {
            return Err(Error::BufferSize);
        }
        let q = session.alloc_affine();
        session.load_affine(&q, x, y);
        session.validate_affine(&q).map_err(|_| Error::Key)?;
        Ok(Self::from_parts(curve, x.to_vec(), y.to_vec()))
    }

    /// The curve this key lives on.
    pub fn curve(&self) -> CurveId {
        self.curve
    }

    /// Affine coordinates `(x, y)`, big-endian.
    pub fn coords(&self) -> (&[u8], &[u8]) {
        (&self.x, &self.y)
    }

    /// Verifies a signature over a message digest per FIPS 186-5.
    ///
    /// Every verification failure reports [`Error::Signature`],
    /// malformed and out-of-range encodings and degenerate digests
    /// included; a caller can never tell a malformed signature from a
    /// wrong one.
    pub fn verify_prehash(&self, digest: &[u8], signature: &Signature) -> Result<(), Error> {
        let mut session = CurveSession::open(self.curve)?;
        let width = session.params().element_bytes();
        if signature.r().len() != width || signature.s().len() != width {
            return Err(Error::Signature);
        }

        let r = session.engine().alloc();
        let s = session.engine().alloc();
        session.engine().load_be(&r, signature.r());
        session.engine().load_be(&s, signature.s());
        if !session.is_scalar_in_range(&r) || !session.is_scalar_in_range(&s) {
            return Err(Error::Signature);
        }

        let e = session.engine().alloc();
        load_digest(&mut session, &e, digest).map_err(|_| Error::Signature)?;

        // u1 = e/s, u2 = r/s mod n
        let u1 = session.engine().alloc();
        let u2 = session.engine().alloc();
        session.use_order_modulus();
        {
            let engine = session.engine();
            engine.mod_inverse(&u1, &s);
            engine.mod_mul(&u2, &r, &u1);
            engine.mod_mul(&u1, &e, &u1);
        }

        let q = session.alloc_affine();
        session.load_affine(&q, &self.x, &self.y);
        let g = session.alloc_generator();
        let rp = session.alloc_affine();
        session
            .multiply_add(&rp, &g, &u1, &q, &u2)
            .map_err(|_| Error::Signature)?;

        let v = session.engine().alloc();
        session.reduce_mod_order(&v, rp.x());
        if session.engine().eq(&v, &r) {
            Ok(())
        } else {
            Err(Error::Signature)
        }
    }
}
