//! Jacobian point doubling and addition.
//!
//! Doubling follows dbl-1998-cmo-2 and addition add-1998-cmo-2; both run
//! entirely in engine registers with the field modulus active. The
//! degenerate cases of addition (either operand at infinity, equal or
//! opposite inputs) are detected and dispatched explicitly.

use crate::point::{AffinePoint, ProjectivePoint};
use crate::session::CurveSession;
use crate::Error;

impl CurveSession {
    /// `result = p + q` on affine points.
    ///
    /// Fails with [`Error::PointAtInfinity`] when the sum is the point
    /// at infinity (q = -p), which has no affine representation.
    pub fn add_points(
        &mut self,
        result: &AffinePoint,
        p: &AffinePoint,
        q: &AffinePoint,
    ) -> Result<(), Error> {
        let pj = self.alloc_jacobian();
        self.to_jacobian(&pj, p);
        let qj = self.alloc_jacobian();
        self.to_jacobian(&qj, q);
        self.add_jacobian(&pj, &qj);
        let conv = self.to_affine(result, &pj);
        self.free_jacobian(qj);
        self.free_jacobian(pj);
        conv
    }

    /// `result = 2 * p` on affine points.
    pub fn double_point(&mut self, result: &AffinePoint, p: &AffinePoint) -> Result<(), Error> {
        let pj = self.alloc_jacobian();
        self.to_jacobian(&pj, p);
        self.dbl_jacobian(&pj);
        let conv = self.to_affine(result, &pj);
        self.free_jacobian(pj);
        conv
    }

    /// Doubles `pt` in place: `pt = 2 * pt`.
    ///
    /// `Z = 0` is preserved, so doubling the point at infinity stays at
    /// infinity.
    pub(crate) fn dbl_jacobian(&mut self, pt: &ProjectivePoint) {
        self.use_field_modulus();
        let Self { engine, a, .. } = self;
        let t1 = engine.alloc();
        let t2 = engine.alloc();
        let t3 = engine.alloc();

        // M = 3*X^2 + a*Z^4
        engine.mod_mul(&t1, &pt.z, &pt.z);
        engine.mod_mul(&t1, &t1, &t1);
        engine.mod_mul(&t1, a, &t1);
        engine.mod_mul(&t2, &pt.x, &pt.x);
        engine.mod_add(&t3, &t2, &t2);
        engine.mod_add(&t2, &t3, &t2);
        engine.mod_add(&t1, &t1, &t2);

        // Z' = 2*Y*Z, before Y is consumed
        engine.mod_mul(&pt.z, &pt.y, &pt.z);
        engine.mod_add(&pt.z, &pt.z, &pt.z);

        // S = 4*X*Y^2 and 8*Y^4
        engine.mod_mul(&t2, &pt.y, &pt.y);
        engine.mod_mul(&t3, &pt.x, &t2);
        engine.mod_add(&t3, &t3, &t3);
        engine.mod_add(&t3, &t3, &t3);
        engine.mod_mul(&t2, &t2, &t2);
        engine.mod_add(&t2, &t2, &t2);
        engine.mod_add(&t2, &t2, &t2);
        engine.mod_add(&t2, &t2, &t2);

        // X' = M^2 - 2*S
        engine.mod_mul(&pt.x, &t1, &t1);
        engine.mod_sub(&pt.x, &pt.x, &t3);
        engine.mod_sub(&pt.x, &pt.x, &t3);

        // Y' = M*(S - X') - 8*Y^4
        engine.mod_sub(&t3, &t3, &pt.x);
        engine.mod_mul(&t3, &t1, &t3);
        engine.mod_sub(&pt.y, &t3, &t2);

        engine.free(t3);
        engine.free(t2);
        engine.free(t1);
    }

    /// Adds `q` into `acc`: `acc = acc + q`.
    pub(crate) fn add_jacobian(&mut self, acc: &ProjectivePoint, q: &ProjectivePoint) {
        if self.is_infinity(q) {
            return;
        }
        if self.is_infinity(acc) {
            self.copy_jacobian(acc, q);
            return;
        }
        self.use_field_modulus();

        let engine = &mut self.engine;
        let t1 = engine.alloc();
        let t2 = engine.alloc();
        let t3 = engine.alloc();
        let t4 = engine.alloc();

        // U1 = X1*Z2^2, S1 = Y1*Z2^3
        engine.mod_mul(&t1, &q.z, &q.z);
        engine.mod_mul(&t2, &t1, &q.z);
        engine.mod_mul(&t2, &acc.y, &t2);
        engine.mod_mul(&t1, &acc.x, &t1);
        // U2 = X2*Z1^2, S2 = Y2*Z1^3
        engine.mod_mul(&t3, &acc.z, &acc.z);
        engine.mod_mul(&t4, &t3, &acc.z);
        engine.mod_mul(&t4, &q.y, &t4);
        engine.mod_mul(&t3, &q.x, &t3);
        // H = U2 - U1, r = S2 - S1
        engine.mod_sub(&t3, &t3, &t1);
        engine.mod_sub(&t4, &t4, &t2);

        if engine.is_zero(&t3) {
            let r_zero = engine.is_zero(&t4);
            engine.free(t4);
            engine.free(t3);
            engine.free(t2);
            engine.free(t1);
            if r_zero {
                // Same point: fall back to doubling.
                self.dbl_jacobian(acc);
            } else {
                // Opposite points: the sum is the point at infinity.
                self.set_infinity(acc);
            }
            return;
        }

        let t5 = engine.alloc();
        let t6 = engine.alloc();
        // H^2, H^3, U1*H^2, S1*H^3
        engine.mod_mul(&t5, &t3, &t3);
        engine.mod_mul(&t6, &t5, &t3);
        engine.mod_mul(&t1, &t1, &t5);
        engine.mod_mul(&t2, &t2, &t6);
        // X3 = r^2 - H^3 - 2*U1*H^2
        engine.mod_mul(&t5, &t4, &t4);
        engine.mod_sub(&t5, &t5, &t6);
        engine.mod_sub(&t5, &t5, &t1);
        engine.mod_sub(&t5, &t5, &t1);
        // Y3 = r*(U1*H^2 - X3) - S1*H^3
        engine.mod_sub(&t1, &t1, &t5);
        engine.mod_mul(&t1, &t4, &t1);
        engine.mod_sub(&t1, &t1, &t2);
        // Z3 = Z1*Z2*H
        engine.mod_mul(&t6, &acc.z, &q.z);
        engine.mod_mul(&acc.z, &t6, &t3);

        engine.copy(&acc.x, &t5);
        engine.copy(&acc.y, &t1);

        engine.free(t6);
        engine.free(t5);
        engine.free(t4);
        engine.free(t3);
        engine.free(t2);
        engine.free(t1);
    }
}
