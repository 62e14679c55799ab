//! Software model of the accelerator: physical accumulator bank, backing
//! RAM, status flags and the busy-wait micro-operation pipeline.
//!
//! Every micro-operation funnels through [`Accel::begin`]/[`Accel::retire`],
//! which model the single-slot issue pipeline: issue waits for a free slot,
//! flag reads wait for drain. A real part would do the same against MMIO
//! status bits; the synchronous contract to callers is identical.
//!
//! Three accumulators are pinned for the modulus slot: the active modulus
//! N, its Barrett reduction tag and a mask of N's bit length used to strip
//! garbage bits left above the reduction width.

use crate::alu;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use subtle::{Choice, ConditionallySelectable};
use zeroize::Zeroize;

/// Number of physical accumulator registers.
pub(crate) const PHYS_REGS: usize = 16;
/// Accumulators available for virtual-register mapping.
pub(crate) const DATA_REGS: usize = PHYS_REGS - 3;
/// Pinned accumulator holding the active modulus N.
pub(crate) const MOD_REG: usize = 13;
/// Pinned accumulator holding the Barrett tag for N.
pub(crate) const BARRETT_REG: usize = 14;
/// Pinned accumulator holding the bit mask of N's bit length.
pub(crate) const MASK_REG: usize = 15;

pub(crate) struct Accel {
    reg_words: usize,
    bank: Vec<u32>,
    ram: Vec<u32>,
    busy: bool,
    carry: bool,
    zero: bool,
    mod_bits: u32,
}

impl Accel {
    pub(crate) fn new(reg_words: usize, ram_words: usize) -> Self {
        Self {
            reg_words,
            bank: vec![0; PHYS_REGS * reg_words],
            ram: vec![0; ram_words],
            busy: false,
            carry: false,
            zero: false,
            mod_bits: 0,
        }
    }

    /// Zeroes the bank, RAM and all tracking state.
    pub(crate) fn clear_all(&mut self) {
        self.bank.zeroize();
        self.ram.zeroize();
        self.busy = false;
        self.carry = false;
        self.zero = false;
        self.mod_bits = 0;
    }

    pub(crate) fn reg(&self, i: usize) -> &[u32] {
        &self.bank[i * self.reg_words..(i + 1) * self.reg_words]
    }

    fn reg_mut(&mut self, i: usize) -> &mut [u32] {
        &mut self.bank[i * self.reg_words..(i + 1) * self.reg_words]
    }

    /// Operand latch: micro-operations fetch both operands before writing.
    fn fetch(&self, i: usize) -> Vec<u32> {
        self.reg(i).to_vec()
    }

    // Pipeline model. The modeled operation completes by the first poll;
    // the wait loops are kept as the synchronization points a real part
    // requires.

    fn poll(&mut self) {
        self.busy = false;
    }

    /// Busy-waits for a free issue slot.
    fn begin(&mut self) {
        while self.busy {
            self.poll();
        }
    }

    fn retire(&mut self) {
        self.busy = true;
    }

    /// Busy-waits for the pipeline to drain. Required before reading
    /// status flags or accessing accumulator words directly.
    pub(crate) fn wait_idle(&mut self) {
        while self.busy {
            self.poll();
        }
    }

    pub(crate) fn flag_carry(&self) -> bool {
        debug_assert!(!self.busy, "flag read while pipeline busy");
        self.carry
    }

    pub(crate) fn flag_zero(&self) -> bool {
        debug_assert!(!self.busy, "flag read while pipeline busy");
        self.zero
    }

    // RAM staging.

    pub(crate) fn load_slot(&mut self, phys: usize, ram_off: usize) {
        self.begin();
        let words = self.reg_words;
        let src = self.ram[ram_off..ram_off + words].to_vec();
        self.reg_mut(phys).copy_from_slice(&src);
        self.retire();
    }

    /// Scrubs a RAM range without going through the bank.
    pub(crate) fn clear_ram(&mut self, ram_off: usize, words: usize) {
        self.begin();
        self.ram[ram_off..ram_off + words].fill(0);
        self.retire();
    }

    pub(crate) fn store_slot(&mut self, phys: usize, ram_off: usize) {
        self.begin();
        let words = self.reg_words;
        let src = self.fetch(phys);
        self.ram[ram_off..ram_off + words].copy_from_slice(&src);
        self.retire();
    }

    /// Overwrites an accumulator with caller-provided words (zero padded).
    pub(crate) fn load_words(&mut self, phys: usize, words: &[u32]) {
        debug_assert!(words.len() <= self.reg_words);
        self.begin();
        let dst = self.reg_mut(phys);
        dst[..words.len()].copy_from_slice(words);
        dst[words.len()..].fill(0);
        self.retire();
    }

    // Integer micro-operations.

    pub(crate) fn set_zero(&mut self, d: usize) {
        self.begin();
        self.reg_mut(d).fill(0);
        self.retire();
    }

    pub(crate) fn set_word(&mut self, d: usize, w: u32) {
        self.begin();
        let dst = self.reg_mut(d);
        dst.fill(0);
        dst[0] = w;
        self.retire();
    }

    pub(crate) fn copy(&mut self, d: usize, a: usize) {
        self.begin();
        let src = self.fetch(a);
        self.reg_mut(d).copy_from_slice(&src);
        self.retire();
    }

    /// `d = src` when the flag is set, else `d` is rewritten unchanged.
    /// Word-wise constant-time select; the store pattern is identical for
    /// both flag values.
    pub(crate) fn csel(&mut self, d: usize, src: usize, flag: Choice) {
        self.begin();
        let s = self.fetch(src);
        let dst = self.reg_mut(d);
        for (dw, sw) in dst.iter_mut().zip(s.iter()) {
            *dw = u32::conditional_select(dw, sw, flag);
        }
        self.retire();
    }

    pub(crate) fn add(&mut self, d: usize, a: usize, b: usize) {
        self.begin();
        let (x, y) = (self.fetch(a), self.fetch(b));
        self.carry = alu::add(self.reg_mut(d), &x, &y);
        self.zero = alu::is_zero(self.reg(d));
        self.retire();
    }

    pub(crate) fn sub(&mut self, d: usize, a: usize, b: usize) {
        self.begin();
        let (x, y) = (self.fetch(a), self.fetch(b));
        self.carry = alu::sub(self.reg_mut(d), &x, &y);
        self.zero = alu::is_zero(self.reg(d));
        self.retire();
    }

    pub(crate) fn add_word(&mut self, d: usize, a: usize, w: u32) {
        self.begin();
        let x = self.fetch(a);
        let mut y = vec![0u32; self.reg_words];
        y[0] = w;
        self.carry = alu::add(self.reg_mut(d), &x, &y);
        self.zero = alu::is_zero(self.reg(d));
        self.retire();
    }

    pub(crate) fn sub_word(&mut self, d: usize, a: usize, w: u32) {
        self.begin();
        let x = self.fetch(a);
        let mut y = vec![0u32; self.reg_words];
        y[0] = w;
        self.carry = alu::sub(self.reg_mut(d), &x, &y);
        self.zero = alu::is_zero(self.reg(d));
        self.retire();
    }

    /// Two's complement negate: `d = 0 - a` with borrow in the carry flag.
    pub(crate) fn neg(&mut self, d: usize, a: usize) {
        self.begin();
        let x = self.fetch(a);
        let zero = vec![0u32; self.reg_words];
        self.carry = alu::sub(self.reg_mut(d), &zero, &x);
        self.zero = alu::is_zero(self.reg(d));
        self.retire();
    }

    pub(crate) fn and(&mut self, d: usize, a: usize, b: usize) {
        self.bitwise(d, a, b, |x, y| x & y)
    }

    pub(crate) fn or(&mut self, d: usize, a: usize, b: usize) {
        self.bitwise(d, a, b, |x, y| x | y)
    }

    pub(crate) fn xor(&mut self, d: usize, a: usize, b: usize) {
        self.bitwise(d, a, b, |x, y| x ^ y)
    }

    fn bitwise(&mut self, d: usize, a: usize, b: usize, f: impl Fn(u32, u32) -> u32) {
        self.begin();
        let (x, y) = (self.fetch(a), self.fetch(b));
        for (i, dw) in self.reg_mut(d).iter_mut().enumerate() {
            *dw = f(x[i], y[i]);
        }
        self.zero = alu::is_zero(self.reg(d));
        self.retire();
    }

    pub(crate) fn shl(&mut self, d: usize, a: usize, n: u32, fill: bool) {
        self.begin();
        let x = self.fetch(a);
        let dst = self.reg_mut(d);
        dst.copy_from_slice(&x);
        alu::shl(dst, n, fill);
        self.retire();
    }

    pub(crate) fn shr(&mut self, d: usize, a: usize, n: u32, fill: bool) {
        self.begin();
        let x = self.fetch(a);
        let dst = self.reg_mut(d);
        dst.copy_from_slice(&x);
        alu::shr(dst, n, fill);
        self.retire();
    }

    /// Tests bit `i`; the result lands in the zero flag (set when clear).
    pub(crate) fn bit_test(&mut self, a: usize, i: u32) {
        self.begin();
        self.zero = !alu::bit(self.reg(a), i);
        self.retire();
    }

    pub(crate) fn bit_set(&mut self, d: usize, i: u32) {
        self.begin();
        alu::set_bit(self.reg_mut(d), i);
        self.retire();
    }

    pub(crate) fn bit_clear(&mut self, d: usize, i: u32) {
        self.begin();
        alu::clear_bit(self.reg_mut(d), i);
        self.retire();
    }

    /// Comparison: zero flag = equal, carry flag = `a < b`.
    pub(crate) fn cmp(&mut self, a: usize, b: usize) {
        self.begin();
        let ord = alu::cmp(self.reg(a), self.reg(b));
        self.zero = ord == Ordering::Equal;
        self.carry = ord == Ordering::Less;
        self.retire();
    }

    pub(crate) fn mul_low(&mut self, d: usize, a: usize, b: usize) {
        self.begin();
        let wide = alu::mul_wide(self.reg(a), self.reg(b));
        let words = self.reg_words;
        self.reg_mut(d).copy_from_slice(&wide[..words]);
        self.retire();
    }

    pub(crate) fn mul_high(&mut self, d: usize, a: usize, b: usize) {
        self.begin();
        let wide = alu::mul_wide(self.reg(a), self.reg(b));
        let words = self.reg_words;
        self.reg_mut(d).copy_from_slice(&wide[words..2 * words]);
        self.retire();
    }

    /// Long division: quotient and remainder of `a / b`.
    pub(crate) fn div(&mut self, dq: usize, dr: usize, a: usize, b: usize) {
        self.begin();
        let (x, y) = (self.fetch(a), self.fetch(b));
        let (q, r) = alu::div_rem(&x, &y);
        self.reg_mut(dq).copy_from_slice(&q);
        let dst = self.reg_mut(dr);
        dst.fill(0);
        dst[..r.len()].copy_from_slice(&r);
        self.retire();
    }

    // Modulus slot and modular micro-operations.

    pub(crate) fn modulus_bits(&self) -> u32 {
        self.mod_bits
    }

    /// Installs the modulus from an accumulator: copies N, derives the
    /// bit-length mask and computes the Barrett tag `floor(2^(2k) / N)`
    /// with the divider.
    pub(crate) fn install_modulus(&mut self, src: usize) {
        self.begin();
        let n = self.fetch(src);
        debug_assert!(!alu::is_zero(&n), "modulus must be nonzero");
        let k = alu::bits(&n);
        self.reg_mut(MOD_REG).copy_from_slice(&n);
        self.mod_bits = k;

        let mask = self.reg_mut(MASK_REG);
        mask.fill(0);
        for i in 0..k {
            alu::set_bit(mask, i);
        }

        let mut num = vec![0u32; (2 * k) as usize / 32 + 1];
        alu::set_bit(&mut num, 2 * k);
        let (q, _) = alu::div_rem(&num, &n);
        let words = self.reg_words;
        debug_assert!(alu::bits(&q) <= (words * 32) as u32);
        let dst = self.reg_mut(BARRETT_REG);
        dst.fill(0);
        for (i, w) in q.iter().take(words).enumerate() {
            dst[i] = *w;
        }
        self.retire();
    }

    /// Reduction of a (possibly double-width) value against the installed
    /// modulus: Barrett with the bounded conditional-subtraction
    /// correction when the value is within the tag's 2k-bit range, long
    /// division beyond it. The approximation quotient never overshoots,
    /// so the remainder is always nonnegative.
    fn reduce_wide(&self, mut x: Vec<u32>) -> Vec<u32> {
        let k = self.mod_bits;
        debug_assert!(k != 0, "modular operation without a modulus set");
        let n = self.fetch(MOD_REG);
        if alu::bits(&x) > 2 * k {
            let (_, r) = alu::div_rem(&x, &n);
            x.fill(0);
            x[..r.len()].copy_from_slice(&r);
        } else if alu::cmp(&x, &n) != Ordering::Less {
            let mu = self.fetch(BARRETT_REG);
            let mut q1 = x.clone();
            alu::shr(&mut q1, k - 1, false);
            let mut q3 = alu::mul_wide(&q1, &mu);
            alu::shr(&mut q3, k + 1, false);
            let t = alu::mul_wide(&q3, &n);
            let borrow = alu::sub_assign(&mut x, &t);
            debug_assert!(!borrow);
            while alu::cmp(&x, &n) != Ordering::Less {
                alu::sub_assign(&mut x, &n);
            }
        }
        x.truncate(self.reg_words);
        x.resize(self.reg_words, 0);
        // Strip everything above the reduction width.
        let mask = self.fetch(MASK_REG);
        for (xw, mw) in x.iter_mut().zip(mask.iter()) {
            *xw &= mw;
        }
        x
    }

    /// `d = (a + b) mod N`; operands must already be reduced.
    pub(crate) fn mod_add(&mut self, d: usize, a: usize, b: usize) {
        self.begin();
        let (x, y) = (self.fetch(a), self.fetch(b));
        let mut t = vec![0u32; self.reg_words];
        alu::add(&mut t, &x, &y);
        let n = self.fetch(MOD_REG);
        if alu::cmp(&t, &n) != Ordering::Less {
            alu::sub_assign(&mut t, &n);
        }
        self.reg_mut(d).copy_from_slice(&t);
        self.retire();
    }

    /// `d = (a - b) mod N`; operands must already be reduced.
    pub(crate) fn mod_sub(&mut self, d: usize, a: usize, b: usize) {
        self.begin();
        let (x, y) = (self.fetch(a), self.fetch(b));
        let mut t = vec![0u32; self.reg_words];
        if alu::cmp(&x, &y) == Ordering::Less {
            let n = self.fetch(MOD_REG);
            alu::add(&mut t, &x, &n);
            alu::sub_assign(&mut t, &y);
        } else {
            alu::sub(&mut t, &x, &y);
        }
        self.reg_mut(d).copy_from_slice(&t);
        self.retire();
    }

    /// `d = -a mod N`; the operand must already be reduced.
    pub(crate) fn mod_neg(&mut self, d: usize, a: usize) {
        self.begin();
        let x = self.fetch(a);
        let mut t = vec![0u32; self.reg_words];
        if !alu::is_zero(&x) {
            let n = self.fetch(MOD_REG);
            alu::sub(&mut t, &n, &x);
        }
        self.reg_mut(d).copy_from_slice(&t);
        self.retire();
    }

    /// `d = (a * b) mod N`; operands must already be reduced.
    pub(crate) fn mod_mul(&mut self, d: usize, a: usize, b: usize) {
        self.begin();
        let wide = alu::mul_wide(self.reg(a), self.reg(b));
        let r = self.reduce_wide(wide);
        self.reg_mut(d).copy_from_slice(&r);
        self.retire();
    }

    /// `d = a mod N` for an arbitrary register-width value.
    pub(crate) fn mod_reduce(&mut self, d: usize, a: usize) {
        self.begin();
        let r = self.reduce_wide(self.fetch(a));
        self.reg_mut(d).copy_from_slice(&r);
        self.retire();
    }

    /// `d = a^e mod N` by left-to-right square and multiply.
    pub(crate) fn mod_exp(&mut self, d: usize, a: usize, e: usize) {
        self.begin();
        let exp = self.fetch(e);
        let r = self.mod_exp_words(a, &exp);
        self.reg_mut(d).copy_from_slice(&r);
        self.retire();
    }

    /// `d = a^(N-2) mod N` — a modular inverse by Fermat's little theorem.
    /// Only correct for prime N; tracking which modulus slot is active is
    /// the caller's responsibility.
    pub(crate) fn mod_inv(&mut self, d: usize, a: usize) {
        self.begin();
        let mut e = self.fetch(MOD_REG);
        let borrow = alu::sub_assign(&mut e, &[2]);
        debug_assert!(!borrow);
        let r = self.mod_exp_words(a, &e);
        self.reg_mut(d).copy_from_slice(&r);
        self.retire();
    }

    fn mod_exp_words(&self, a: usize, e: &[u32]) -> Vec<u32> {
        let base = self.reduce_wide(self.fetch(a));
        let mut acc = vec![0u32; self.reg_words];
        acc[0] = 1;
        for i in (0..alu::bits(e)).rev() {
            acc = self.reduce_wide(alu::mul_wide(&acc, &acc));
            if alu::bit(e, i) {
                acc = self.reduce_wide(alu::mul_wide(&acc, &base));
            }
        }
        acc
    }

    /// Compares an accumulator against the installed modulus:
    /// carry flag = `a < N`.
    pub(crate) fn cmp_modulus(&mut self, a: usize) {
        self.cmp(a, MOD_REG);
    }
}
