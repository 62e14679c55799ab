//! Curve descriptors.
//!
//! Constants are big-endian byte strings exactly as they load into engine
//! registers. Both supported curves have cofactor 1 and `a = p - 3`, and
//! their field and order widths coincide.

use hex_literal::hex;

/// Identifier of a supported named curve.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CurveId {
    /// NIST P-256 (secp256r1).
    NistP256,
    /// NIST P-384 (secp384r1).
    NistP384,
}

/// Descriptor of a short-Weierstrass curve `y^2 = x^3 + ax + b` over the
/// prime field GF(p), with base point (gx, gy) of prime order n.
pub struct CurveParams {
    /// Curve identifier.
    pub id: CurveId,
    /// Field size in bits.
    pub bits: u32,
    /// Field prime p.
    pub p: &'static [u8],
    /// Curve coefficient a.
    pub a: &'static [u8],
    /// Curve coefficient b.
    pub b: &'static [u8],
    /// Base-point order n.
    pub n: &'static [u8],
    /// Base-point x coordinate.
    pub gx: &'static [u8],
    /// Base-point y coordinate.
    pub gy: &'static [u8],
    /// Cofactor of the base-point subgroup.
    pub h: u32,
    /// Candidate length for private-key derivation, in bits: the order
    /// width plus 64, per FIPS 186-5 A.2.1.
    pub keygen_bits: u32,
}

const P256: CurveParams = CurveParams {
    id: CurveId::NistP256,
    bits: 256,
    p: &hex!("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff"),
    a: &hex!("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc"),
    b: &hex!("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b"),
    n: &hex!("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551"),
    gx: &hex!("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296"),
    gy: &hex!("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"),
    h: 1,
    keygen_bits: 320,
};

const P384: CurveParams = CurveParams {
    id: CurveId::NistP384,
    bits: 384,
    p: &hex!(
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe"
        "ffffffff0000000000000000ffffffff"
    ),
    a: &hex!(
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe"
        "ffffffff0000000000000000fffffffc"
    ),
    b: &hex!(
        "b3312fa7e23ee7e4988e056be3f82d19181d9c6efe8141120314088f5013875a"
        "c656398d8a2ed19d2a85c8edd3ec2aef"
    ),
    n: &hex!(
        "ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf"
        "581a0db248b0a77aecec196accc52973"
    ),
    gx: &hex!(
        "aa87ca22be8b05378eb1c71ef320ad746e1d3b628ba79b9859f741e082542a38"
        "5502f25dbf55296c3a545e3872760ab7"
    ),
    gy: &hex!(
        "3617de4a96262c6f5d9e98bf9292dc29f8f41dbd289a147ce9da3113b5f0b8c0"
        "0a60b1ce1d7e819d7a431d7c90ea0e5f"
    ),
    h: 1,
    keygen_bits: 448,
};

impl CurveParams {
    /// Descriptor for a named curve.
    pub fn get(id: CurveId) -> &'static CurveParams {
        match id {
            CurveId::NistP256 => &P256,
            CurveId::NistP384 => &P384,
        }
    }

    /// Width of a serialized field element or scalar in bytes.
    pub fn element_bytes(&self) -> usize {
        self.bits.div_ceil(8) as usize
    }
}
