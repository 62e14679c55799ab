//! Register-engine behavior tests: allocation discipline, data movement,
//! integer and modular arithmetic, randomization.

use hex_literal::hex;
use pka_engine::{MAX_VIRT_REGS, PkaEngine, RandomQuality};
use proptest::prelude::*;
use rand_core::OsRng;

/// NIST P-256 field prime.
const P256_P: [u8; 32] =
    hex!("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff");

#[test]
fn lifo_alloc_free() {
    let mut eng = PkaEngine::init(256);
    let a = eng.alloc();
    let b = eng.alloc();
    eng.free(b);
    eng.free(a);
    // Freed indices are reusable.
    let c = eng.alloc();
    assert!(eng.is_zero(&c));
    eng.free(c);
}

#[test]
#[should_panic(expected = "LIFO")]
fn free_out_of_order_panics() {
    let mut eng = PkaEngine::init(256);
    let a = eng.alloc();
    let _b = eng.alloc();
    eng.free(a);
}

#[test]
#[should_panic(expected = "exhausted")]
fn alloc_past_capacity_panics() {
    let mut eng = PkaEngine::init(256);
    let mut held = Vec::new();
    for _ in 0..=MAX_VIRT_REGS {
        held.push(eng.alloc());
    }
}

#[test]
fn load_store_be_roundtrip() {
    let mut eng = PkaEngine::init(256);
    let r = eng.alloc();
    eng.load_be(&r, &hex!("0102030405060708090a0b0c0d0e0f10"));

    let mut wide = [0u8; 32];
    eng.store_be(&r, &mut wide);
    assert_eq!(&wide[16..], hex!("0102030405060708090a0b0c0d0e0f10"));
    assert_eq!(wide[..16], [0u8; 16]);

    // Exact-size output.
    let mut tight = [0u8; 16];
    eng.store_be(&r, &mut tight);
    assert_eq!(tight, hex!("0102030405060708090a0b0c0d0e0f10"));
    eng.free(r);
}

#[test]
fn alloc_is_zeroed_and_fresh() {
    let mut eng = PkaEngine::init(128);
    let a = eng.alloc();
    eng.load_be(&a, &hex!("deadbeef"));
    eng.free(a);
    let b = eng.alloc();
    assert!(eng.is_zero(&b));
    eng.free(b);
}

#[test]
fn carry_borrow_and_word_ops() {
    let mut eng = PkaEngine::init(64);
    let a = eng.alloc();
    let b = eng.alloc();
    let d = eng.alloc();
    eng.load_be(&a, &hex!("ffffffffffffffff"));
    eng.set_word(&b, 1);
    assert!(!eng.add(&d, &a, &b));
    assert_eq!(eng.get_bit_size(&d), 65);

    assert!(eng.sub_word(&d, &b, 2));
    assert!(!eng.add_word(&d, &a, 1));

    eng.free(d);
    eng.free(b);
    eng.free(a);
}

#[test]
fn mul_split_matches_wide_product() {
    // (2^96 - 1)^2 = 2^192 - 2^97 + 1, registers are 128 bits wide here.
    let mut eng = PkaEngine::init(64);
    let a = eng.alloc();
    let lo = eng.alloc();
    let hi = eng.alloc();
    eng.load_be(&a, &hex!("ffffffffffffffffffffffff"));
    eng.mul_low(&lo, &a, &a);
    eng.mul_high(&hi, &a, &a);

    let mut out = [0u8; 16];
    eng.store_be(&lo, &mut out);
    assert_eq!(out, hex!("fffffffe000000000000000000000001"));
    eng.store_be(&hi, &mut out);
    assert_eq!(out, hex!("0000000000000000ffffffffffffffff"));

    eng.free(hi);
    eng.free(lo);
    eng.free(a);
}

#[test]
fn division_known_answer() {
    let mut eng = PkaEngine::init(64);
    let a = eng.alloc();
    let b = eng.alloc();
    let q = eng.alloc();
    let r = eng.alloc();
    eng.load_be(&a, &1_000_003u32.to_be_bytes());
    eng.set_word(&b, 997);
    eng.div(&q, &r, &a, &b);

    let mut out = [0u8; 4];
    eng.store_be(&q, &mut out);
    assert_eq!(u32::from_be_bytes(out), 1003);
    eng.store_be(&r, &mut out);
    assert_eq!(u32::from_be_bytes(out), 12);

    eng.free(r);
    eng.free(q);
    eng.free(b);
    eng.free(a);
}

#[test]
fn eviction_preserves_values() {
    // More live registers than physical data slots forces writeback.
    let mut eng = PkaEngine::init(256);
    let regs: Vec<_> = (0..32u32).map(|_| eng.alloc()).collect();
    for (i, r) in regs.iter().enumerate() {
        eng.set_word(r, 0x1000 + i as u32);
    }
    for (i, r) in regs.iter().enumerate() {
        let mut out = [0u8; 4];
        eng.store_be(r, &mut out);
        assert_eq!(u32::from_be_bytes(out), 0x1000 + i as u32);
    }
    for r in regs.into_iter().rev() {
        eng.free(r);
    }
}

#[test]
fn twos_complement_negate() {
    let mut eng = PkaEngine::init(64);
    let a = eng.alloc();
    let d = eng.alloc();

    eng.load_be(&a, &hex!("0000000000000003"));
    assert!(eng.neg(&d, &a));
    // neg(a) + a wraps back to zero at the register width.
    assert!(eng.add(&d, &d, &a));
    assert!(eng.is_zero(&d));

    // Negating zero yields zero with no borrow.
    eng.set_zero(&a);
    assert!(!eng.neg(&d, &a));
    assert!(eng.is_zero(&d));

    eng.free(d);
    eng.free(a);
}

#[test]
fn bit_ops_and_shifts() {
    let mut eng = PkaEngine::init(128);
    let a = eng.alloc();
    let d = eng.alloc();
    eng.set_bit(&a, 100);
    assert!(eng.bit_test(&a, 100));
    assert!(!eng.bit_test(&a, 99));
    assert_eq!(eng.get_bit_size(&a), 101);

    eng.shr(&d, &a, 100, false);
    assert_eq!(eng.get_bit_size(&d), 1);
    eng.shl(&d, &d, 4, true);
    let mut out = [0u8; 1];
    eng.store_be(&d, &mut out);
    assert_eq!(out[0], 0x1f);

    eng.clear_bit(&a, 100);
    assert!(eng.is_zero(&a));

    eng.free(d);
    eng.free(a);
}

#[test]
fn modular_arithmetic_small_modulus() {
    let mut eng = PkaEngine::init(64);
    let n = eng.alloc();
    let a = eng.alloc();
    let b = eng.alloc();
    let d = eng.alloc();
    eng.set_word(&n, 101);
    eng.set_modulus(&n);
    assert_eq!(eng.modulus_bits(), 7);

    eng.set_word(&a, 77);
    eng.set_word(&b, 55);
    let mut out = [0u8; 4];

    eng.mod_add(&d, &a, &b); // 132 mod 101 = 31
    eng.store_be(&d, &mut out);
    assert_eq!(u32::from_be_bytes(out), 31);

    eng.mod_sub(&d, &b, &a); // -22 mod 101 = 79
    eng.store_be(&d, &mut out);
    assert_eq!(u32::from_be_bytes(out), 79);

    eng.mod_mul(&d, &a, &b); // 4235 mod 101 = 94
    eng.store_be(&d, &mut out);
    assert_eq!(u32::from_be_bytes(out), 94);

    eng.mod_neg(&d, &a);
    eng.store_be(&d, &mut out);
    assert_eq!(u32::from_be_bytes(out), 24);
    eng.set_zero(&d);
    eng.mod_neg(&d, &d);
    assert!(eng.is_zero(&d));

    eng.set_word(&d, 7);
    eng.mod_inverse(&d, &d); // 7 * 29 = 203 = 2*101 + 1
    eng.store_be(&d, &mut out);
    assert_eq!(u32::from_be_bytes(out), 29);

    // 4^13 mod 497 = 445
    eng.set_word(&n, 497);
    eng.set_modulus(&n);
    eng.set_word(&a, 4);
    eng.set_word(&b, 13);
    eng.mod_exp(&d, &a, &b);
    eng.store_be(&d, &mut out);
    assert_eq!(u32::from_be_bytes(out), 445);

    eng.free(d);
    eng.free(b);
    eng.free(a);
    eng.free(n);
}

#[test]
fn field_inverse_roundtrip() {
    let mut eng = PkaEngine::init(256);
    let n = eng.alloc();
    let a = eng.alloc();
    let inv = eng.alloc();
    let one = eng.alloc();
    eng.load_be(&n, &P256_P);
    eng.set_modulus(&n);
    assert_eq!(eng.modulus_bits(), 256);

    eng.load_be(
        &a,
        &hex!("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b"),
    );
    eng.mod_inverse(&inv, &a);
    eng.mod_mul(&inv, &inv, &a);
    eng.set_word(&one, 1);
    assert!(eng.eq(&inv, &one));

    eng.free(one);
    eng.free(inv);
    eng.free(a);
    eng.free(n);
}

#[test]
fn random_within_modulus_in_range() {
    let mut eng = PkaEngine::init(256);
    let n = eng.alloc();
    let r = eng.alloc();
    eng.load_be(&n, &P256_P);
    eng.set_modulus(&n);
    for _ in 0..16 {
        eng.set_random_within_modulus(&r, RandomQuality::Secure, &mut OsRng)
            .expect("entropy");
        assert!(!eng.is_zero(&r));
        assert!(eng.less_than(&r, &n));
    }
    eng.free(r);
    eng.free(n);
}

#[test]
fn conditional_copy() {
    let mut eng = PkaEngine::init(64);
    let a = eng.alloc();
    let d = eng.alloc();
    eng.set_word(&a, 0xabcd);
    eng.set_word(&d, 0x1234);
    eng.copy_if(&d, &a, 0u8.into());
    let mut out = [0u8; 4];
    eng.store_be(&d, &mut out);
    assert_eq!(u32::from_be_bytes(out), 0x1234);
    eng.copy_if(&d, &a, 1u8.into());
    eng.store_be(&d, &mut out);
    assert_eq!(u32::from_be_bytes(out), 0xabcd);
    eng.free(d);
    eng.free(a);
}

proptest! {
    /// Barrett reduction agrees with long division.
    #[test]
    fn mod_mul_matches_division(x in any::<u128>(), y in any::<u128>(), m in 2u128..) {
        let mut eng = PkaEngine::init(256);
        let n = eng.alloc();
        let a = eng.alloc();
        let b = eng.alloc();
        let lo = eng.alloc();
        let q = eng.alloc();
        let r = eng.alloc();
        let d = eng.alloc();

        eng.load_be(&n, &m.to_be_bytes());
        eng.set_modulus(&n);
        eng.load_be(&a, &x.to_be_bytes());
        eng.load_be(&b, &y.to_be_bytes());
        eng.mod_reduce(&a, &a);
        eng.mod_reduce(&b, &b);

        eng.mod_mul(&d, &a, &b);

        // The 256-bit product fits the 320-bit registers.
        eng.mul_low(&lo, &a, &b);
        eng.div(&q, &r, &lo, &n);
        prop_assert!(eng.eq(&d, &r));

        for reg in [d, r, q, lo, b, a, n] {
            eng.free(reg);
        }
    }
}
