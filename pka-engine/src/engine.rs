//! Virtual register layer over the physical accumulator bank.
//!
//! Callers allocate up to [`MAX_VIRT_REGS`] handles in strict LIFO order.
//! Each virtual register has a fixed home in accelerator RAM; the engine
//! maps the working set onto the data accumulators on demand, writing the
//! least recently used resident back to RAM when a slot is needed. Every
//! operation touches at most four registers and the bank keeps thirteen
//! data slots, so the operands of a single operation never displace each
//! other.

use crate::accel::{Accel, DATA_REGS};
use crate::alu;
use crate::entropy::{EntropyError, EntropySource, RandomQuality};
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use subtle::Choice;
use zeroize::Zeroize;

/// Maximum number of simultaneously live virtual registers.
pub const MAX_VIRT_REGS: usize = 64;

/// Extra width above the payload, in bits, carried by every register.
///
/// Covers the carries of unreduced sums, blinded scalars and the
/// oversized derivation candidates the signature layer reduces.
const HEADROOM_BITS: u32 = 64;

/// Handle to a live virtual register.
///
/// Deliberately neither `Copy` nor `Clone`: [`PkaEngine::free`] consumes
/// the handle, so a freed register cannot be named again.
#[derive(Debug)]
pub struct VirtReg {
    idx: u16,
}

/// The register engine. See the crate docs for the synchronization and
/// panic contract.
pub struct PkaEngine {
    accel: Accel,
    reg_words: usize,
    payload_bits: u32,
    live: u16,
    /// Which virtual register occupies each data accumulator.
    map: [Option<u16>; DATA_REGS],
    /// Last-use stamps driving writeback victim selection.
    stamp: [u64; DATA_REGS],
    clock: u64,
    /// Data-slot residency per virtual register.
    resident: Vec<Option<usize>>,
}

impl PkaEngine {
    /// Brings the engine up for values of at most `payload_bits` bits.
    ///
    /// Registers are sized `payload_bits` plus a fixed headroom, rounded
    /// up to whole words, and the whole bank starts zeroed.
    pub fn init(payload_bits: u32) -> Self {
        assert!(payload_bits > 0, "payload width must be nonzero");
        let reg_words = (payload_bits + HEADROOM_BITS).div_ceil(32) as usize;
        Self {
            accel: Accel::new(reg_words, MAX_VIRT_REGS * reg_words),
            reg_words,
            payload_bits,
            live: 0,
            map: [None; DATA_REGS],
            stamp: [0; DATA_REGS],
            clock: 0,
            resident: vec![None; MAX_VIRT_REGS],
        }
    }

    /// Tears the engine down, scrubbing the bank and backing RAM.
    /// Dropping the engine does the same.
    pub fn uninit(self) {}

    /// Payload width the engine was brought up with.
    pub fn payload_bits(&self) -> u32 {
        self.payload_bits
    }

    /// Register width in 32-bit words, including headroom.
    pub fn reg_words(&self) -> usize {
        self.reg_words
    }

    // Allocation.

    /// Allocates the next virtual register, zero-valued.
    ///
    /// # Panics
    ///
    /// Panics when all [`MAX_VIRT_REGS`] registers are live.
    pub fn alloc(&mut self) -> VirtReg {
        assert!(
            (self.live as usize) < MAX_VIRT_REGS,
            "virtual register bank exhausted"
        );
        let idx = self.live;
        self.live += 1;
        debug_assert!(self.resident[idx as usize].is_none());
        let r = VirtReg { idx };
        let slot = self.touch(&r);
        self.accel.set_zero(slot);
        r
    }

    /// Releases a register, scrubbing its accumulator slot and RAM home.
    ///
    /// # Panics
    ///
    /// Panics when `r` is not the most recently allocated live register.
    pub fn free(&mut self, r: VirtReg) {
        assert!(
            self.live > 0 && r.idx == self.live - 1,
            "register freed out of LIFO order"
        );
        self.live -= 1;
        if let Some(slot) = self.resident[r.idx as usize].take() {
            self.accel.set_zero(slot);
            self.map[slot] = None;
        }
        self.accel
            .clear_ram(r.idx as usize * self.reg_words, self.reg_words);
    }

    /// Maps `r` onto a data accumulator, staging through RAM as needed,
    /// and returns the slot index.
    fn touch(&mut self, r: &VirtReg) -> usize {
        assert!(r.idx < self.live, "operation on a dead register");
        self.clock += 1;
        if let Some(slot) = self.resident[r.idx as usize] {
            self.stamp[slot] = self.clock;
            return slot;
        }
        let slot = self.pick_victim();
        if let Some(old) = self.map[slot] {
            self.accel.store_slot(slot, old as usize * self.reg_words);
            self.resident[old as usize] = None;
        }
        self.accel.load_slot(slot, r.idx as usize * self.reg_words);
        self.map[slot] = Some(r.idx);
        self.resident[r.idx as usize] = Some(slot);
        self.stamp[slot] = self.clock;
        slot
    }

    fn pick_victim(&self) -> usize {
        if let Some(free) = self.map.iter().position(|m| m.is_none()) {
            return free;
        }
        let mut best = 0;
        for slot in 1..DATA_REGS {
            if self.stamp[slot] < self.stamp[best] {
                best = slot;
            }
        }
        best
    }

    // Data movement.

    /// Loads a big-endian byte string, left-padded with zeros.
    ///
    /// # Panics
    ///
    /// Panics when `bytes` does not fit the register width.
    pub fn load_be(&mut self, d: &VirtReg, bytes: &[u8]) {
        assert!(bytes.len() <= self.reg_words * 4, "value wider than register");
        let mut words = vec![0u32; self.reg_words];
        for (i, chunk) in bytes.rchunks(4).enumerate() {
            let mut w = 0u32;
            for &b in chunk {
                w = (w << 8) | b as u32;
            }
            words[i] = w;
        }
        let slot = self.touch(d);
        self.accel.load_words(slot, &words);
    }

    /// Stores the low `out.len()` bytes of a register, big-endian.
    ///
    /// # Panics
    ///
    /// Panics when the register value does not fit in `out`.
    pub fn store_be(&mut self, a: &VirtReg, out: &mut [u8]) {
        let slot = self.touch(a);
        self.accel.wait_idle();
        let words = self.accel.reg(slot).to_vec();
        assert!(
            alu::bits(&words).div_ceil(8) as usize <= out.len(),
            "register value wider than output buffer"
        );
        for (i, byte) in out.iter_mut().rev().enumerate() {
            let w = words.get(i / 4).copied().unwrap_or(0);
            *byte = (w >> (8 * (i % 4))) as u8;
        }
    }

    /// `d = a`.
    pub fn copy(&mut self, d: &VirtReg, a: &VirtReg) {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.copy(sd, sa);
    }

    /// `d = a` when `flag` is set, else `d` unchanged; the memory access
    /// pattern does not depend on `flag`.
    pub fn copy_if(&mut self, d: &VirtReg, a: &VirtReg, flag: Choice) {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.csel(sd, sa, flag);
    }

    /// `d = 0`.
    pub fn set_zero(&mut self, d: &VirtReg) {
        let sd = self.touch(d);
        self.accel.set_zero(sd);
    }

    /// `d = w`.
    pub fn set_word(&mut self, d: &VirtReg, w: u32) {
        let sd = self.touch(d);
        self.accel.set_word(sd, w);
    }

    // Queries.

    /// Bit length of the register value (0 for zero).
    pub fn get_bit_size(&mut self, a: &VirtReg) -> u32 {
        let slot = self.touch(a);
        self.accel.wait_idle();
        alu::bits(self.accel.reg(slot))
    }

    /// Whether the register is zero-valued.
    pub fn is_zero(&mut self, a: &VirtReg) -> bool {
        let slot = self.touch(a);
        self.accel.wait_idle();
        alu::is_zero(self.accel.reg(slot))
    }

    /// Value of bit `i`.
    pub fn bit_test(&mut self, a: &VirtReg, i: u32) -> bool {
        let slot = self.touch(a);
        self.accel.bit_test(slot, i);
        self.accel.wait_idle();
        !self.accel.flag_zero()
    }

    /// Sets bit `i` of `d`.
    pub fn set_bit(&mut self, d: &VirtReg, i: u32) {
        assert!((i as usize) < self.reg_words * 32, "bit index out of range");
        let slot = self.touch(d);
        self.accel.bit_set(slot, i);
    }

    /// Clears bit `i` of `d`.
    pub fn clear_bit(&mut self, d: &VirtReg, i: u32) {
        assert!((i as usize) < self.reg_words * 32, "bit index out of range");
        let slot = self.touch(d);
        self.accel.bit_clear(slot, i);
    }

    /// Magnitude comparison.
    pub fn compare(&mut self, a: &VirtReg, b: &VirtReg) -> Ordering {
        let sa = self.touch(a);
        let sb = self.touch(b);
        self.accel.cmp(sa, sb);
        self.accel.wait_idle();
        if self.accel.flag_zero() {
            Ordering::Equal
        } else if self.accel.flag_carry() {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }

    /// `a == b`.
    pub fn eq(&mut self, a: &VirtReg, b: &VirtReg) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    /// `a < b`.
    pub fn less_than(&mut self, a: &VirtReg, b: &VirtReg) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    // Integer arithmetic.

    /// `d = a + b`, truncated to the register width; returns the carry out.
    pub fn add(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) -> bool {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.add(sd, sa, sb);
        self.accel.wait_idle();
        self.accel.flag_carry()
    }

    /// `d = a - b`, wrapping at the register width; returns the borrow out.
    pub fn sub(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) -> bool {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.sub(sd, sa, sb);
        self.accel.wait_idle();
        self.accel.flag_carry()
    }

    /// `d = a + w`; returns the carry out.
    pub fn add_word(&mut self, d: &VirtReg, a: &VirtReg, w: u32) -> bool {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.add_word(sd, sa, w);
        self.accel.wait_idle();
        self.accel.flag_carry()
    }

    /// `d = a - w`, wrapping; returns the borrow out.
    pub fn sub_word(&mut self, d: &VirtReg, a: &VirtReg, w: u32) -> bool {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.sub_word(sd, sa, w);
        self.accel.wait_idle();
        self.accel.flag_carry()
    }

    /// `d = 0 - a` in two's complement at the register width; returns
    /// the borrow out, which is set exactly when `a` is nonzero.
    pub fn neg(&mut self, d: &VirtReg, a: &VirtReg) -> bool {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.neg(sd, sa);
        self.accel.wait_idle();
        self.accel.flag_carry()
    }

    /// `d = a & b`.
    pub fn and(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.and(sd, sa, sb);
    }

    /// `d = a | b`.
    pub fn or(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.or(sd, sa, sb);
    }

    /// `d = a ^ b`.
    pub fn xor(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.xor(sd, sa, sb);
    }

    /// `d = a << n`; vacated bits are ones when `fill` is set.
    pub fn shl(&mut self, d: &VirtReg, a: &VirtReg, n: u32, fill: bool) {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.shl(sd, sa, n, fill);
    }

    /// `d = a >> n`; vacated bits are ones when `fill` is set.
    pub fn shr(&mut self, d: &VirtReg, a: &VirtReg, n: u32, fill: bool) {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.shr(sd, sa, n, fill);
    }

    /// `d` = low register-width words of `a * b`.
    pub fn mul_low(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.mul_low(sd, sa, sb);
    }

    /// `d` = high register-width words of `a * b`.
    pub fn mul_high(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.mul_high(sd, sa, sb);
    }

    /// `quot = a / b`, `rem = a mod b`.
    ///
    /// # Panics
    ///
    /// Panics (in debug builds) on a zero divisor.
    pub fn div(&mut self, quot: &VirtReg, rem: &VirtReg, a: &VirtReg, b: &VirtReg) {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sq = self.touch(quot);
        let sr = self.touch(rem);
        self.accel.div(sq, sr, sa, sb);
    }

    // Modulus slot and modular arithmetic.

    /// Installs the value of `n` as the current modulus, deriving its
    /// bit mask and Barrett reduction tag. All `mod_*` operations reduce
    /// against this modulus until the next call.
    pub fn set_modulus(&mut self, n: &VirtReg) {
        let sn = self.touch(n);
        self.accel.install_modulus(sn);
    }

    /// Bit length of the installed modulus (0 when none is installed).
    pub fn modulus_bits(&mut self) -> u32 {
        self.accel.wait_idle();
        self.accel.modulus_bits()
    }

    /// `a < N` for the installed modulus.
    pub fn below_modulus(&mut self, a: &VirtReg) -> bool {
        let sa = self.touch(a);
        self.accel.cmp_modulus(sa);
        self.accel.wait_idle();
        self.accel.flag_carry()
    }

    /// `d = (a + b) mod N`; operands must be reduced.
    pub fn mod_add(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.mod_add(sd, sa, sb);
    }

    /// `d = (a - b) mod N`; operands must be reduced.
    pub fn mod_sub(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.mod_sub(sd, sa, sb);
    }

    /// `d = -a mod N`; the operand must be reduced.
    pub fn mod_neg(&mut self, d: &VirtReg, a: &VirtReg) {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.mod_neg(sd, sa);
    }

    /// `d = (a * b) mod N`; operands must be reduced.
    pub fn mod_mul(&mut self, d: &VirtReg, a: &VirtReg, b: &VirtReg) {
        let sa = self.touch(a);
        let sb = self.touch(b);
        let sd = self.touch(d);
        self.accel.mod_mul(sd, sa, sb);
    }

    /// `d = a mod N` for an arbitrary register value.
    pub fn mod_reduce(&mut self, d: &VirtReg, a: &VirtReg) {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.mod_reduce(sd, sa);
    }

    /// `d = a^e mod N`.
    pub fn mod_exp(&mut self, d: &VirtReg, a: &VirtReg, e: &VirtReg) {
        let sa = self.touch(a);
        let se = self.touch(e);
        let sd = self.touch(d);
        self.accel.mod_exp(sd, sa, se);
    }

    /// `d = a^(-1) mod N` by Fermat exponentiation; the installed modulus
    /// must be prime and `a` nonzero mod N.
    pub fn mod_inverse(&mut self, d: &VirtReg, a: &VirtReg) {
        let sa = self.touch(a);
        let sd = self.touch(d);
        self.accel.mod_inv(sd, sa);
    }

    // Randomization.

    /// Fills `d` with a uniform random value of at most `bits` bits.
    pub fn set_random<R: EntropySource + ?Sized>(
        &mut self,
        d: &VirtReg,
        bits: u32,
        quality: RandomQuality,
        rng: &mut R,
    ) -> Result<(), EntropyError> {
        assert!(bits as usize <= self.reg_words * 32, "width out of range");
        let nbytes = bits.div_ceil(8) as usize;
        let mut buf = vec![0u8; nbytes];
        rng.try_fill(quality, &mut buf)?;
        if bits % 8 != 0 {
            buf[0] &= 0xff >> (8 - bits % 8);
        }
        self.load_be(d, &buf);
        buf.zeroize();
        Ok(())
    }

    /// Fills `d` with a uniform random value in `[1, N)` for the installed
    /// modulus, by rejection sampling at the modulus bit length.
    pub fn set_random_within_modulus<R: EntropySource + ?Sized>(
        &mut self,
        d: &VirtReg,
        quality: RandomQuality,
        rng: &mut R,
    ) -> Result<(), EntropyError> {
        let bits = self.modulus_bits();
        debug_assert!(bits != 0, "no modulus installed");
        loop {
            self.set_random(d, bits, quality, rng)?;
            if !self.is_zero(d) && self.below_modulus(d) {
                return Ok(());
            }
        }
    }
}

impl Drop for PkaEngine {
    fn drop(&mut self) {
        self.accel.clear_all();
    }
}
