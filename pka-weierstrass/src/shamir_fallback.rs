//! Double-scalar multiplication without the shared doubling chain, for
//! builds that opt out of the `shamir` feature: two runs of the
//! fixed-pattern window multiplier plus one addition. The scalars here
//! are public (verification), so the runs skip blinding and draw no
//! entropy, but they keep the data-independent code path.

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
        let windows = self.params.bits.div_ceil(2);

        let p1j = self.alloc_jacobian();
        self.to_jacobian(&p1j, p1);
        let p2j = self.alloc_jacobian();
        self.to_jacobian(&p2j, p2);
        let acc = self.alloc_jacobian();
        let tmp = self.alloc_jacobian();

        self.mul_core(&acc, &p1j, k1, windows);
        self.mul_core(&tmp, &p2j, k2, windows);
        self.add_jacobian(&acc, &tmp);

        let conv = self.to_affine(result, &acc);
        self.free_jacobian(tmp);
        self.free_jacobian(acc);
        self.free_jacobian(p2j);
        self.free_jacobian(p1j);
        conv
    }
}
