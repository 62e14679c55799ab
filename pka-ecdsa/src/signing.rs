//! Signing keys: generation, deterministic derivation and signature
//! creation.

use crate::kdf;
use crate::signature::Signature;
use crate::verifying::VerifyingKey;
use crate::Error;
use alloc::vec;
use alloc::vec::Vec;
use pka_weierstrass::pka_engine::{EntropySource, RandomQuality, VirtReg};
use pka_weierstrass::{CurveId, CurveSession};
use zeroize::Zeroizing;

/// Domain-separation label for private-key derivation.
const KEY_LABEL: &[u8] = b"ECDSA private key";

/// An ECDSA signing key: a secret scalar in `[1, n)`.
///
/// The serialized scalar is held in zeroizing storage; the engine
/// registers it passes through are scrubbed on session teardown.
#[derive(Clone)]
pub struct SigningKey {
    curve: CurveId,
    d: Zeroizing<Vec<u8>>,
}

impl SigningKey {
    /// Generates a fresh key with a uniform scalar in `[1, n)`.
    pub fn random<R: EntropySource + ?Sized>(curve: CurveId, rng: &mut R) -> Result<Self, Error> {
        let mut session = CurveSession::open(curve)?;
        let width = session.params().element_bytes();
        session.use_order_modulus();
        let d = session.engine().alloc();
        session
            .engine()
            .set_random_within_modulus(&d, RandomQuality::Secure, rng)?;
        let mut bytes = Zeroizing::new(vec![0u8; width]);
        session.engine().store_be(&d, &mut bytes);
        Ok(Self { curve, d: bytes })
    }

    /// Derives a key deterministically from a secret seed and a context
    /// string: a counter-mode KDF produces a candidate of the curve's
    /// recommended derivation width (order width plus 64 bits, which
    /// makes the reduction bias negligible per FIPS 186-5 A.2.1), and
    /// the candidate is reduced mod n. A zero result is rejected.
    pub fn derive(curve: CurveId, seed: &[u8], context: &[u8]) -> Result<Self, Error> {
        if seed.is_empty() {
            return Err(Error::Key);
        }
        let mut session = CurveSession::open(curve)?;
        let width = session.params().element_bytes();
        let cand_len = (session.params().keygen_bits / 8) as usize;
        let mut cand = Zeroizing::new(vec![0u8; cand_len]);
        kdf::derive_bytes(seed, KEY_LABEL, context, &mut cand);

        let c = session.engine().alloc();
        let d = session.engine().alloc();
        session.engine().load_be(&c, &cand);
        session.reduce_mod_order(&d, &c);
        if session.engine().is_zero(&d) {
            return Err(Error::Key);
        }

        let mut bytes = Zeroizing::new(vec![0u8; width]);
        session.engine().store_be(&d, &mut bytes);
        Ok(Self { curve, d: bytes })
    }

    /// Restores a key from its serialized scalar, checking the range.
    pub fn from_bytes(curve: CurveId, bytes: &[u8]) -> Result<Self, Error> {
        let mut session = CurveSession::open(curve)?;
        if bytes.len() != session.params().element_bytes() {
            return Err(Error::BufferSize);
        }
        let d = session.engine().alloc();
        session.engine().load_be(&d, bytes);
        if !session.is_scalar_in_range(&d) {
            return Err(Error::Key);
        }
        Ok(Self {
            curve,
            d: Zeroizing::new(bytes.to_vec()),
        })
    }

    /// The curve this key lives on.
    pub fn curve(&self) -> CurveId {
        self.curve
    }

    /// Serialized scalar, big-endian.
    pub fn to_bytes(&self) -> &[u8] {
        &self.d
    }

    /// Derives the public key `Q = d * G`.
    pub fn verifying_key<R: EntropySource + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<VerifyingKey, Error> {
        let mut session = CurveSession::open(self.curve)?;
        let width = session.params().element_bytes();
        let d = session.engine().alloc();
        session.engine().load_be(&d, &self.d);
        if !session.is_scalar_in_range(&d) {
            return Err(Error::Key);
        }
        let g = session.alloc_generator();
        let q = session.alloc_affine();
        session.multiply(&q, &g, &d, rng)?;
        let mut x = vec![0u8; width];
        let mut y = vec![0u8; width];
        session.store_affine(&q, &mut x, &mut y);
        Ok(VerifyingKey::from_parts(self.curve, x, y))
    }

    /// Signs a message digest per FIPS 186-5, drawing a fresh nonce per
    /// attempt until both signature halves are nonzero.
    pub fn sign_prehash<R: EntropySource + ?Sized>(
        &self,
        digest: &[u8],
        rng: &mut R,
    ) -> Result<Signature, Error> {
        let mut session = CurveSession::open(self.curve)?;
        let width = session.params().element_bytes();

        let d = session.engine().alloc();
        session.engine().load_be(&d, &self.d);
        if !session.is_scalar_in_range(&d) {
            return Err(Error::Key);
        }
        let e = session.engine().alloc();
        load_digest(&mut session, &e, digest)?;

        let g = session.alloc_generator();
        let k = session.engine().alloc();
        let kinv = session.engine().alloc();
        let r = session.engine().alloc();
        let s = session.engine().alloc();
        let rp = session.alloc_affine();

        loop {
            session.use_order_modulus();
            session
                .engine()
                .set_random_within_modulus(&k, RandomQuality::Secure, rng)?;
            session.multiply(&rp, &g, &k, rng)?;
            session.reduce_mod_order(&r, rp.x());
            if session.engine().is_zero(&r) {
                continue;
            }
            // s = k^-1 * (e + r*d) mod n
            let engine = session.engine();
            engine.mod_inverse(&kinv, &k);
            engine.mod_mul(&s, &r, &d);
            engine.mod_add(&s, &s, &e);
            engine.mod_mul(&s, &kinv, &s);
            if !engine.is_zero(&s) {
                break;
            }
        }

        // Overwrite the secret registers before teardown.
        let scrub_bits = (width * 8) as u32;
        for reg in [&kinv, &k, &d] {
            if session
                .engine()
                .set_random(reg, scrub_bits, RandomQuality::Fast, rng)
                .is_err()
            {
                session.engine().set_zero(reg);
            }
        }

        let mut rb = vec![0u8; width];
        let mut sb = vec![0u8; width];
        session.engine().store_be(&r, &mut rb);
        session.engine().store_be(&s, &mut sb);
        Ok(Signature::from_scalars(rb, sb))
    }
}

/// Loads a digest as the scalar e: leftmost order-width bytes, reduced
/// mod n. Both supported orders are whole bytes wide, so byte-level
/// truncation matches the bit-level rule. Empty and all-zero digests
/// are rejected.
pub(crate) fn load_digest(
    session: &mut CurveSession,
    e: &VirtReg,
    digest: &[u8],
) -> Result<(), Error> {
    if digest.is_empty() {
        return Err(Error::Hash);
    }
    let width = session.params().element_bytes();
    let take = digest.len().min(width);
    session.engine().load_be(e, &digest[..take]);
    session.reduce_mod_order(e, e);
    if session.engine().is_zero(e) {
        return Err(Error::Hash);
    }
    Ok(())
}
