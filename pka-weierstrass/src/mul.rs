//! Protected scalar multiplication.
//!
//! The scalar is consumed MSB-first in 2-bit windows with a pending
//! borrow, recoded on the fly into addends from {±P, ±2P, ±4P}. Every
//! window executes exactly two doublings and one addition, and the addend
//! is fetched by a constant-time sweep over the whole table, so the
//! operation sequence and access pattern are independent of the scalar.
//!
//! With the `dpa` feature the scalar additionally gets an order-multiple
//! blind and a random multiplicative split before the window loop, so the
//! values the loop walks differ between runs even for the same inputs.

use crate::point::{AffinePoint, ProjectivePoint};
use crate::session::CurveSession;
use crate::Error;
#[cfg(any(feature = "dpa", feature = "dfa"))]
use pka_engine::RandomQuality;
use pka_engine::{EntropySource, PkaEngine, VirtReg};
use subtle::{Choice, ConstantTimeEq};

/// Table entry per `(borrow, digit)` state: 0..3 select P, 2P, 4P, -P and
/// 4..5 select -2P, -4P.
const POINT_SEL: [usize; 8] = [0, 0, 1, 2, 5, 4, 4, 3];
/// Borrow carried into the next window per `(borrow, digit)` state.
const CARRY_NEXT: [usize; 8] = [1, 0, 0, 1, 0, 1, 0, 0];

/// Constant-time fetch of table entry `entry` into `dst`. Entries 0..2
/// are the precomputed points, 3..5 their negations (shared X and Z with
/// a negated Y). All six candidates are touched on every call.
fn select_entry(
    engine: &mut PkaEngine,
    dst: &ProjectivePoint,
    table: &[ProjectivePoint; 3],
    negy: &[VirtReg; 3],
    entry: usize,
) {
    for i in 0..6 {
        let flag = (i as u8).ct_eq(&(entry as u8));
        let src = &table[i % 3];
        engine.copy_if(&dst.x, &src.x, flag);
        engine.copy_if(&dst.z, &src.z, flag);
        if i < 3 {
            engine.copy_if(&dst.y, &src.y, flag);
        } else {
            engine.copy_if(&dst.y, &negy[i - 3], flag);
        }
    }
}

impl CurveSession {
    /// `result = scalar * point`.
    ///
    /// The input point is validated first; the scalar is taken as an
    /// integer (values at or above n wrap, so `n * P` reports
    /// [`Error::PointAtInfinity`]). With the `dfa` feature the pinned
    /// curve constants and the output are revalidated after the loop and
    /// the result is scrubbed on any mismatch.
    pub fn multiply<R: EntropySource + ?Sized>(
        &mut self,
        result: &AffinePoint,
        point: &AffinePoint,
        scalar: &VirtReg,
        rng: &mut R,
    ) -> Result<(), Error> {
        self.validate_affine(point)?;

        let base = self.alloc_jacobian();
        self.to_jacobian(&base, point);
        let kk = self.engine.alloc();
        self.engine.copy(&kk, scalar);
        let acc = self.alloc_jacobian();

        #[cfg(feature = "dpa")]
        let mul_res = self.mul_protected(&acc, &base, &kk, rng);
        #[cfg(not(feature = "dpa"))]
        let mul_res: Result<(), Error> = {
            let _ = &rng;
            let windows = self.params.bits.div_ceil(2);
            self.mul_core(&acc, &base, &kk, windows);
            Ok(())
        };

        let conv = match mul_res {
            Ok(()) => self.to_affine(result, &acc),
            Err(e) => Err(e),
        };

        self.free_jacobian(acc);
        self.engine.free(kk);
        self.free_jacobian(base);

        #[cfg(feature = "dfa")]
        {
            conv?;
            let intact = self.constants_intact();
            let output_ok = self.validate_affine(result).is_ok();
            if !(intact && output_ok) {
                self.scrub_affine(result, rng);
                return Err(Error::Fault);
            }
        }
        #[cfg(not(feature = "dfa"))]
        conv?;

        Ok(())
    }

    /// Blinds and splits the scalar, then runs the window loop on the
    /// pieces: `k' = kk + r*n`, `k' = q*rho + rem`, and
    /// `k'*P = q*(rho*P) + rem*P`.
    #[cfg(feature = "dpa")]
    fn mul_protected<R: EntropySource + ?Sized>(
        &mut self,
        acc: &ProjectivePoint,
        base: &ProjectivePoint,
        kk: &VirtReg,
        rng: &mut R,
    ) -> Result<(), Error> {
        let half = self.params.bits / 2;
        let r32 = self.engine.alloc();
        let rho = self.engine.alloc();
        let drew = self
            .engine
            .set_random(&r32, 32, RandomQuality::Fast, rng)
            .and_then(|()| self.engine.set_random(&rho, half, RandomQuality::Fast, rng));
        if let Err(e) = drew {
            self.engine.free(rho);
            self.engine.free(r32);
            return Err(e.into());
        }
        // Force a top bit so neither value can be zero and the split
        // divisor has a fixed bit length.
        self.engine.set_bit(&r32, 32);
        self.engine.set_bit(&rho, half - 1);

        // kk += r * n. The product stays inside the register headroom.
        {
            let Self { engine, n, .. } = self;
            let t = engine.alloc();
            engine.mul_low(&t, n, &r32);
            engine.add(kk, kk, &t);
            engine.free(t);
        }

        let q = self.engine.alloc();
        let rem = self.engine.alloc();
        self.engine.div(&q, &rem, kk, &rho);

        let s = self.alloc_jacobian();
        self.mul_core(&s, base, &rho, half.div_ceil(2));
        let q_windows = self.engine.get_bit_size(&q).max(1).div_ceil(2);
        self.mul_core(acc, &s, &q, q_windows);
        let w = self.alloc_jacobian();
        let rem_windows = self.engine.get_bit_size(&rem).max(1).div_ceil(2);
        self.mul_core(&w, base, &rem, rem_windows);
        self.add_jacobian(acc, &w);

        self.free_jacobian(w);
        self.free_jacobian(s);
        self.engine.free(rem);
        self.engine.free(q);
        self.engine.free(rho);
        self.engine.free(r32);
        Ok(())
    }

    /// Fixed-pattern window loop: `acc = k * base` over `windows` 2-bit
    /// windows covering the scalar MSB-first.
    pub(crate) fn mul_core(
        &mut self,
        acc: &ProjectivePoint,
        base: &ProjectivePoint,
        k: &VirtReg,
        windows: u32,
    ) {
        debug_assert!(windows > 0);
        self.use_field_modulus();

        let p1 = self.alloc_jacobian();
        self.copy_jacobian(&p1, base);
        let p2 = self.alloc_jacobian();
        self.copy_jacobian(&p2, &p1);
        self.dbl_jacobian(&p2);
        let p4 = self.alloc_jacobian();
        self.copy_jacobian(&p4, &p2);
        self.dbl_jacobian(&p4);
        let engine = &mut self.engine;
        let n1 = engine.alloc();
        let n2 = engine.alloc();
        let n4 = engine.alloc();
        engine.mod_neg(&n1, &p1.y);
        engine.mod_neg(&n2, &p2.y);
        engine.mod_neg(&n4, &p4.y);
        let table = [p1, p2, p4];
        let negy = [n1, n2, n4];
        let sel = self.alloc_jacobian();

        let mut borrow = 0usize;
        for w in (0..windows).rev() {
            let hi = self.engine.bit_test(k, 2 * w + 1);
            let lo = self.engine.bit_test(k, 2 * w);
            let digit = (usize::from(hi) << 1) | usize::from(lo);
            let state = borrow * 4 + digit;
            let entry = POINT_SEL[state];
            borrow = CARRY_NEXT[state];
            if w == windows - 1 {
                // Top window seeds the accumulator directly; the recoded
                // addend is never zero, so no add-to-infinity is needed.
                select_entry(&mut self.engine, acc, &table, &negy, entry);
            } else {
                self.dbl_jacobian(acc);
                self.dbl_jacobian(acc);
                select_entry(&mut self.engine, &sel, &table, &negy, entry);
                self.add_jacobian(acc, &sel);
            }
        }

        // Resolve the pending borrow: always compute acc - P and keep it
        // only when the borrow is set.
        let cor = self.alloc_jacobian();
        self.copy_jacobian(&cor, acc);
        select_entry(&mut self.engine, &sel, &table, &negy, 3);
        self.add_jacobian(&cor, &sel);
        let keep = Choice::from(borrow as u8);
        let engine = &mut self.engine;
        engine.copy_if(&acc.x, &cor.x, keep);
        engine.copy_if(&acc.y, &cor.y, keep);
        engine.copy_if(&acc.z, &cor.z, keep);

        self.free_jacobian(cor);
        self.free_jacobian(sel);
        let engine = &mut self.engine;
        let [n1, n2, n4] = negy;
        engine.free(n4);
        engine.free(n2);
        engine.free(n1);
        let [p1, p2, p4] = table;
        self.free_jacobian(p4);
        self.free_jacobian(p2);
        self.free_jacobian(p1);
    }

    /// Overwrites result coordinates with random garbage after a detected
    /// fault, falling back to zeroing if the entropy source fails too.
    #[cfg(feature = "dfa")]
    fn scrub_affine<R: EntropySource + ?Sized>(&mut self, pt: &AffinePoint, rng: &mut R) {
        let bits = self.params.bits;
        for reg in [&pt.x, &pt.y] {
            if self
                .engine
                .set_random(reg, bits, RandomQuality::Fast, rng)
                .is_err()
            {
                self.engine.set_zero(reg);
            }
        }
    }
}
