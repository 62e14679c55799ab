//! Word-level arithmetic of the modeled accelerator.
//!
//! All values are little-endian `u32` word slices. These routines are the
//! combinational core behind the micro-operations in [`crate::accel`]; they
//! never allocate registers and know nothing about the bank.

use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

pub(crate) fn is_zero(a: &[u32]) -> bool {
    a.iter().all(|&w| w == 0)
}

/// Bit length of `a`: position of the highest set bit plus one, 0 for zero.
pub(crate) fn bits(a: &[u32]) -> u32 {
    for (i, &w) in a.iter().enumerate().rev() {
        if w != 0 {
            return (i as u32) * 32 + (32 - w.leading_zeros());
        }
    }
    0
}

pub(crate) fn bit(a: &[u32], i: u32) -> bool {
    let w = (i / 32) as usize;
    w < a.len() && (a[w] >> (i % 32)) & 1 == 1
}

pub(crate) fn set_bit(a: &mut [u32], i: u32) {
    a[(i / 32) as usize] |= 1 << (i % 32);
}

pub(crate) fn clear_bit(a: &mut [u32], i: u32) {
    a[(i / 32) as usize] &= !(1 << (i % 32));
}

/// `dst = a + b`; all three slices must have the same length.
/// Returns the carry out of the top word.
pub(crate) fn add(dst: &mut [u32], a: &[u32], b: &[u32]) -> bool {
    debug_assert!(dst.len() == a.len() && a.len() == b.len());
    let mut carry = 0u64;
    for i in 0..dst.len() {
        let t = a[i] as u64 + b[i] as u64 + carry;
        dst[i] = t as u32;
        carry = t >> 32;
    }
    carry != 0
}

/// `dst = a - b`; all three slices must have the same length.
/// Returns the borrow out of the top word.
pub(crate) fn sub(dst: &mut [u32], a: &[u32], b: &[u32]) -> bool {
    debug_assert!(dst.len() == a.len() && a.len() == b.len());
    let mut borrow = 0u64;
    for i in 0..dst.len() {
        let x = a[i] as u64;
        let y = b[i] as u64 + borrow;
        if x >= y {
            dst[i] = (x - y) as u32;
            borrow = 0;
        } else {
            dst[i] = (x + (1u64 << 32) - y) as u32;
            borrow = 1;
        }
    }
    borrow != 0
}

/// `acc -= a`; `a` may be a different length (high words past `acc` must be
/// zero-valued). Returns the borrow out.
pub(crate) fn sub_assign(acc: &mut [u32], a: &[u32]) -> bool {
    let mut borrow = 0u64;
    for i in 0..acc.len() {
        let x = acc[i] as u64;
        let y = a.get(i).copied().unwrap_or(0) as u64 + borrow;
        if x >= y {
            acc[i] = (x - y) as u32;
            borrow = 0;
        } else {
            acc[i] = (x + (1u64 << 32) - y) as u32;
            borrow = 1;
        }
    }
    borrow != 0
}

/// Magnitude comparison with zero extension of the shorter operand.
pub(crate) fn cmp(a: &[u32], b: &[u32]) -> Ordering {
    let n = a.len().max(b.len());
    for i in (0..n).rev() {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        if x != y {
            return x.cmp(&y);
        }
    }
    Ordering::Equal
}

/// Shift left in place by `n` bits; vacated low bits are filled with
/// ones when `fill` is set.
pub(crate) fn shl(a: &mut [u32], n: u32, fill: bool) {
    let total = (a.len() * 32) as u32;
    let n = n.min(total);
    let words = (n / 32) as usize;
    let rem = n % 32;
    for i in (0..a.len()).rev() {
        let hi = if i >= words { a[i - words] } else { 0 };
        let lo = if i > words { a[i - words - 1] } else { 0 };
        a[i] = if rem == 0 {
            hi
        } else {
            (hi << rem) | (lo >> (32 - rem))
        };
    }
    if fill {
        for i in 0..n {
            set_bit(a, i);
        }
    }
}

/// Shift right in place by `n` bits; vacated high bits are filled with
/// ones when `fill` is set.
pub(crate) fn shr(a: &mut [u32], n: u32, fill: bool) {
    let total = (a.len() * 32) as u32;
    let n = n.min(total);
    let words = (n / 32) as usize;
    let rem = n % 32;
    for i in 0..a.len() {
        let lo = if i + words < a.len() { a[i + words] } else { 0 };
        let hi = if i + words + 1 < a.len() {
            a[i + words + 1]
        } else {
            0
        };
        a[i] = if rem == 0 {
            lo
        } else {
            (lo >> rem) | (hi << (32 - rem))
        };
    }
    if fill {
        for i in (total - n)..total {
            set_bit(a, i);
        }
    }
}

/// Schoolbook widening multiplication: result has `a.len() + b.len()` words.
pub(crate) fn mul_wide(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = vec![0u32; a.len() + b.len()];
    for i in 0..a.len() {
        let mut carry = 0u64;
        for j in 0..b.len() {
            let t = a[i] as u64 * b[j] as u64 + out[i + j] as u64 + carry;
            out[i + j] = t as u32;
            carry = t >> 32;
        }
        out[i + b.len()] = carry as u32;
    }
    out
}

/// Binary restoring division; returns `(quotient, remainder)` with the
/// quotient sized like `num` and the remainder sized like `den`.
pub(crate) fn div_rem(num: &[u32], den: &[u32]) -> (Vec<u32>, Vec<u32>) {
    debug_assert!(!is_zero(den), "division by zero");
    let mut q = vec![0u32; num.len()];
    let mut r = vec![0u32; den.len() + 1];
    for i in (0..bits(num)).rev() {
        shl(&mut r, 1, false);
        if bit(num, i) {
            r[0] |= 1;
        }
        if cmp(&r, den) != Ordering::Less {
            sub_assign(&mut r, den);
            set_bit(&mut q, i);
        }
    }
    r.truncate(den.len());
    (q, r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn bit_length() {
        assert_eq!(bits(&[0, 0, 0]), 0);
        assert_eq!(bits(&[1]), 1);
        assert_eq!(bits(&[0, 0x8000_0000]), 64);
        assert_eq!(bits(&[0xffff_ffff, 1, 0]), 33);
    }

    #[test]
    fn add_sub_carry_chain() {
        let a = [0xffff_ffff, 0xffff_ffff];
        let b = [1, 0];
        let mut d = [0u32; 2];
        assert!(add(&mut d, &a, &b));
        assert_eq!(d, [0, 0]);
        assert!(!sub(&mut d, &b, &b));
        assert_eq!(d, [0, 0]);
        assert!(sub(&mut d, &[0, 0], &[1, 0]));
        assert_eq!(d, [0xffff_ffff, 0xffff_ffff]);
    }

    #[test]
    fn widening_multiply() {
        // 0xffffffff * 0xffffffff = 0xfffffffe_00000001
        let p = mul_wide(&[0xffff_ffff], &[0xffff_ffff]);
        assert_eq!(p, vec![0x0000_0001, 0xffff_fffe]);
    }

    #[test]
    fn shift_fill() {
        let mut a = [0x8000_0001u32, 0];
        shr(&mut a, 1, false);
        assert_eq!(a, [0x4000_0000, 0]);
        let mut b = [0u32, 0];
        shr(&mut b, 4, true);
        assert_eq!(b, [0, 0xf000_0000]);
        let mut c = [0u32; 2];
        shl(&mut c, 3, true);
        assert_eq!(c, [7, 0]);
    }

    #[test]
    fn division() {
        // 1000003 = 997 * 1003 + 12
        let (q, r) = div_rem(&[1_000_003], &[997]);
        assert_eq!(q, vec![1003]);
        assert_eq!(r, vec![12]);

        let (q, r) = div_rem(&[0x1234_5678, 0x9abc_def0], &[0x1_0000]);
        assert_eq!(r, vec![0x5678]);
        assert_eq!(q, vec![0xdef0_1234, 0x9abc]);
    }
}
