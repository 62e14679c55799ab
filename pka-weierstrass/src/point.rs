//! Point representations and coordinate-level operations.
//!
//! Points own their coordinate registers, so allocation and release
//! follow the engine's LIFO discipline: free points in the reverse order
//! of allocation.

use crate::session::CurveSession;
use crate::Error;
use pka_engine::VirtReg;

/// A point in affine coordinates. Cannot represent the point at infinity.
pub struct AffinePoint {
    pub(crate) x: VirtReg,
    pub(crate) y: VirtReg,
}

impl AffinePoint {
    /// The x-coordinate register.
    pub fn x(&self) -> &VirtReg {
        &self.x
    }

    /// The y-coordinate register.
    pub fn y(&self) -> &VirtReg {
        &self.y
    }
}

/// A point in Jacobian projective coordinates `(X : Y : Z)`, where the
/// affine point is `(X/Z^2, Y/Z^3)` and `Z = 0` marks infinity.
pub struct ProjectivePoint {
    pub(crate) x: VirtReg,
    pub(crate) y: VirtReg,
    pub(crate) z: VirtReg,
}

impl CurveSession {
    /// Allocates an affine point (zero-valued coordinates).
    pub fn alloc_affine(&mut self) -> AffinePoint {
        let x = self.engine.alloc();
        let y = self.engine.alloc();
        AffinePoint { x, y }
    }

    /// Releases an affine point.
    pub fn free_affine(&mut self, pt: AffinePoint) {
        self.engine.free(pt.y);
        self.engine.free(pt.x);
    }

    /// Allocates a Jacobian point (zero-valued, i.e. at infinity).
    pub fn alloc_jacobian(&mut self) -> ProjectivePoint {
        let x = self.engine.alloc();
        let y = self.engine.alloc();
        let z = self.engine.alloc();
        ProjectivePoint { x, y, z }
    }

    /// Releases a Jacobian point.
    pub fn free_jacobian(&mut self, pt: ProjectivePoint) {
        self.engine.free(pt.z);
        self.engine.free(pt.y);
        self.engine.free(pt.x);
    }

    /// Loads big-endian affine coordinates.
    pub fn load_affine(&mut self, pt: &AffinePoint, x: &[u8], y: &[u8]) {
        self.engine.load_be(&pt.x, x);
        self.engine.load_be(&pt.y, y);
    }

    /// Stores affine coordinates as big-endian bytes.
    pub fn store_affine(&mut self, pt: &AffinePoint, x: &mut [u8], y: &mut [u8]) {
        self.engine.store_be(&pt.x, x);
        self.engine.store_be(&pt.y, y);
    }

    /// `dst = src` lifted to Jacobian coordinates (`Z = 1`).
    pub fn to_jacobian(&mut self, dst: &ProjectivePoint, src: &AffinePoint) {
        self.engine.copy(&dst.x, &src.x);
        self.engine.copy(&dst.y, &src.y);
        self.engine.set_word(&dst.z, 1);
    }

    /// Converts back to affine coordinates.
    ///
    /// Fails with [`Error::PointAtInfinity`] when `src` is the point at
    /// infinity, which has no affine representation.
    pub fn to_affine(&mut self, dst: &AffinePoint, src: &ProjectivePoint) -> Result<(), Error> {
        if self.is_infinity(src) {
            return Err(Error::PointAtInfinity);
        }
        self.use_field_modulus();
        let eng = &mut self.engine;
        let zi = eng.alloc();
        let t = eng.alloc();
        eng.mod_inverse(&zi, &src.z);
        eng.mod_mul(&t, &zi, &zi);
        eng.mod_mul(&dst.x, &src.x, &t);
        eng.mod_mul(&t, &t, &zi);
        eng.mod_mul(&dst.y, &src.y, &t);
        eng.free(t);
        eng.free(zi);
        Ok(())
    }

    /// Sets a Jacobian point to infinity.
    pub fn set_infinity(&mut self, pt: &ProjectivePoint) {
        self.engine.set_word(&pt.x, 1);
        self.engine.set_word(&pt.y, 1);
        self.engine.set_zero(&pt.z);
    }

    /// Whether a Jacobian point is at infinity.
    pub fn is_infinity(&mut self, pt: &ProjectivePoint) -> bool {
        self.engine.is_zero(&pt.z)
    }

    /// `dst = src`.
    pub fn copy_jacobian(&mut self, dst: &ProjectivePoint, src: &ProjectivePoint) {
        self.engine.copy(&dst.x, &src.x);
        self.engine.copy(&dst.y, &src.y);
        self.engine.copy(&dst.z, &src.z);
    }

    /// Negates an affine point in place.
    pub fn negate_affine(&mut self, pt: &AffinePoint) {
        self.use_field_modulus();
        self.engine.mod_neg(&pt.y, &pt.y);
    }

    /// Validates a public point per SP 800-186 D.1: both coordinates
    /// must be nonzero reduced field elements and satisfy the curve
    /// equation. Every supported curve has cofactor 1, so membership in
    /// the curve group is membership in the prime-order subgroup and no
    /// `n * P` check is needed.
    pub fn validate_affine(&mut self, pt: &AffinePoint) -> Result<(), Error> {
        debug_assert_eq!(self.params.h, 1);
        {
            let Self { engine, p, .. } = self;
            if engine.is_zero(&pt.x)
                || engine.is_zero(&pt.y)
                || !engine.less_than(&pt.x, p)
                || !engine.less_than(&pt.y, p)
            {
                return Err(Error::PointOutsideField);
            }
        }
        self.use_field_modulus();
        let Self { engine, a, b, .. } = self;
        let lhs = engine.alloc();
        let rhs = engine.alloc();
        eng_curve_rhs(engine, &rhs, &pt.x, a, b);
        engine.mod_mul(&lhs, &pt.y, &pt.y);
        let on_curve = engine.eq(&lhs, &rhs);
        engine.free(rhs);
        engine.free(lhs);
        if on_curve {
            Ok(())
        } else {
            Err(Error::PointNotOnCurve)
        }
    }
}

/// `rhs = x^3 + ax + b` by Horner's rule, field modulus active.
fn eng_curve_rhs(
    engine: &mut pka_engine::PkaEngine,
    rhs: &VirtReg,
    x: &VirtReg,
    a: &VirtReg,
    b: &VirtReg,
) {
    engine.mod_mul(rhs, x, x);
    engine.mod_add(rhs, rhs, a);
    engine.mod_mul(rhs, rhs, x);
    engine.mod_add(rhs, rhs, b);
}
