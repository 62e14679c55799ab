//! Simultaneous double-scalar multiplication (Shamir's trick).
//!
//! One doubling chain serves both scalars, with P1 + P2 precomputed for
//! the windows where both bits are set. Inputs here are public
//! (verification), so the bit-dependent dispatch is deliberate.

use crate::point::AffinePoint;
use crate::session::CurveSession;
use crate::Error;
use pka_engine::VirtReg;

impl CurveSession {
    /// `result = k1 * p1 + k2 * p2`.
    ///
    /// Both points are validated first. Fails with
    /// [`Error::PointAtInfinity`] when the sum has no affine
    /// representation.
    pub fn multiply_add(
        &mut self,
        result: &AffinePoint,
        p1: &AffinePoint,
        k1: &VirtReg,
        p2: &AffinePoint,
        k2: &VirtReg,
    ) -> Result<(), Error> {
        self.validate_affine(p1)?;
        self.validate_affine(p2)?;

        let p1j = self.alloc_jacobian();
        self.to_jacobian(&p1j, p1);
        let p2j = self.alloc_jacobian();
        self.to_jacobian(&p2j, p2);
        let sum = self.alloc_jacobian();
        self.copy_jacobian(&sum, &p1j);
        self.add_jacobian(&sum, &p2j);
        let acc = self.alloc_jacobian();
        self.set_infinity(&acc);

        let bits = {
            let engine = &mut self.engine;
            engine.get_bit_size(k1).max(engine.get_bit_size(k2))
        };
        for i in (0..bits).rev() {
            self.dbl_jacobian(&acc);
            let b1 = self.engine.bit_test(k1, i);
            let b2 = self.engine.bit_test(k2, i);
            match (b1, b2) {
                (true, true) => self.add_jacobian(&acc, &sum),
                (true, false) => self.add_jacobian(&acc, &p1j),
                (false, true) => self.add_jacobian(&acc, &p2j),
                (false, false) => {}
            }
        }

        let conv = self.to_affine(result, &acc);
        self.free_jacobian(acc);
        self.free_jacobian(sum);
        self.free_jacobian(p2j);
        self.free_jacobian(p1j);
        conv
    }
}
