//! End-to-end signature tests on both curves, plus rejection paths for
//! malformed keys, digests and signatures.

use hex_literal::hex;
use pka_ecdsa::pka_weierstrass::CurveParams;
use pka_ecdsa::{CurveId, Error, Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;

const DIGEST: [u8; 32] =
    hex!("44acf6b7e36c1342c2c5897204fe09504e1e2efb1a900377dbc4e7a6a133ec56");

#[test]
fn sign_verify_round_trip() {
    for curve in [CurveId::NistP256, CurveId::NistP384] {
        let key = SigningKey::random(curve, &mut OsRng).expect("keygen");
        let public = key.verifying_key(&mut OsRng).expect("public key");
        let sig = key.sign_prehash(&DIGEST, &mut OsRng).expect("sign");
        public.verify_prehash(&DIGEST, &sig).expect("verify");
    }
}

#[test]
fn tampered_digest_fails() {
    let key = SigningKey::random(CurveId::NistP256, &mut OsRng).expect("keygen");
    let public = key.verifying_key(&mut OsRng).expect("public key");
    let sig = key.sign_prehash(&DIGEST, &mut OsRng).expect("sign");

    let mut bad = DIGEST;
    bad[7] ^= 0x20;
    assert_eq!(public.verify_prehash(&bad, &sig), Err(Error::Signature));
}

#[test]
fn tampered_signature_fails() {
    let key = SigningKey::random(CurveId::NistP256, &mut OsRng).expect("keygen");
    let public = key.verifying_key(&mut OsRng).expect("public key");
    let sig = key.sign_prehash(&DIGEST, &mut OsRng).expect("sign");

    let mut bytes = sig.to_bytes();
    bytes[40] ^= 0x01;
    let bad = Signature::from_bytes(&bytes).expect("parse");
    assert_eq!(public.verify_prehash(&DIGEST, &bad), Err(Error::Signature));
}

#[test]
fn out_of_range_signature_scalars_fail() {
    let key = SigningKey::random(CurveId::NistP256, &mut OsRng).expect("keygen");
    let public = key.verifying_key(&mut OsRng).expect("public key");

    // r = 0
    let mut bytes = vec![0u8; 64];
    bytes[32..].copy_from_slice(&key.sign_prehash(&DIGEST, &mut OsRng).expect("sign").to_bytes()[32..]);
    let zero_r = Signature::from_bytes(&bytes).expect("parse");
    assert_eq!(public.verify_prehash(&DIGEST, &zero_r), Err(Error::Signature));

    // s = n
    let mut bytes = vec![1u8; 64];
    bytes[32..].copy_from_slice(CurveParams::get(CurveId::NistP256).n);
    let big_s = Signature::from_bytes(&bytes).expect("parse");
    assert_eq!(public.verify_prehash(&DIGEST, &big_s), Err(Error::Signature));
}

#[test]
fn signature_parsing() {
    assert_eq!(Signature::from_bytes(&[]), Err(Error::BufferSize));
    assert_eq!(Signature::from_bytes(&[1, 2, 3]), Err(Error::BufferSize));
    let sig = Signature::from_bytes(&[7u8; 64]).expect("parse");
    assert_eq!(sig.r(), &[7u8; 32]);
    assert_eq!(sig.to_bytes().len(), 64);
}

#[test]
fn short_digest_verifies() {
    // Digests narrower than the order are taken at face value,
    // e.g. SHA-256 output under P-384.
    let key = SigningKey::random(CurveId::NistP384, &mut OsRng).expect("keygen");
    let public = key.verifying_key(&mut OsRng).expect("public key");
    let sig = key.sign_prehash(&DIGEST, &mut OsRng).expect("sign");
    public.verify_prehash(&DIGEST, &sig).expect("verify");
}

#[test]
fn empty_digest_rejected() {
    let key = SigningKey::random(CurveId::NistP256, &mut OsRng).expect("keygen");
    assert_eq!(key.sign_prehash(&[], &mut OsRng), Err(Error::Hash));
}

#[test]
fn all_zero_digest_rejected() {
    let key = SigningKey::random(CurveId::NistP256, &mut OsRng).expect("keygen");
    assert_eq!(key.sign_prehash(&[0u8; 32], &mut OsRng), Err(Error::Hash));

    // Verification never distinguishes a bad digest from a bad
    // signature.
    let public = key.verifying_key(&mut OsRng).expect("public key");
    let sig = key.sign_prehash(&DIGEST, &mut OsRng).expect("sign");
    assert_eq!(
        public.verify_prehash(&[0u8; 32], &sig),
        Err(Error::Signature)
    );
    assert_eq!(public.verify_prehash(&[], &sig), Err(Error::Signature));
}

#[test]
fn derived_keys_are_deterministic() {
    let a = SigningKey::derive(CurveId::NistP256, b"device secret", b"slot 0").expect("derive");
    let b = SigningKey::derive(CurveId::NistP256, b"device secret", b"slot 0").expect("derive");
    assert_eq!(a.to_bytes(), b.to_bytes());

    let c = SigningKey::derive(CurveId::NistP256, b"device secret", b"slot 1").expect("derive");
    assert_ne!(a.to_bytes(), c.to_bytes());

    assert!(matches!(
        SigningKey::derive(CurveId::NistP256, b"", b"ctx"),
        Err(Error::Key)
    ));

    let public = a.verifying_key(&mut OsRng).expect("public key");
    let sig = a.sign_prehash(&DIGEST, &mut OsRng).expect("sign");
    public.verify_prehash(&DIGEST, &sig).expect("verify");
}

#[test]
fn unit_private_key_gives_the_generator() {
    let params = CurveParams::get(CurveId::NistP256);
    let mut d = vec![0u8; 32];
    d[31] = 1;
    let key = SigningKey::from_bytes(CurveId::NistP256, &d).expect("import");
    let public = key.verifying_key(&mut OsRng).expect("public key");
    let (x, y) = public.coords();
    assert_eq!(x, params.gx);
    assert_eq!(y, params.gy);
}

#[test]
fn private_key_import_range_checks() {
    let zero = vec![0u8; 32];
    assert!(matches!(
        SigningKey::from_bytes(CurveId::NistP256, &zero),
        Err(Error::Key)
    ));
    let n = CurveParams::get(CurveId::NistP256).n;
    assert!(matches!(
        SigningKey::from_bytes(CurveId::NistP256, n),
        Err(Error::Key)
    ));
    assert!(matches!(
        SigningKey::from_bytes(CurveId::NistP256, &[1u8; 16]),
        Err(Error::BufferSize)
    ));
}

#[test]
fn public_key_import_validates() {
    let params = CurveParams::get(CurveId::NistP256);
    VerifyingKey::from_coords(CurveId::NistP256, params.gx, params.gy).expect("generator");

    let mut bad_y = params.gy.to_vec();
    bad_y[31] ^= 0x01;
    assert!(matches!(
        VerifyingKey::from_coords(CurveId::NistP256, params.gx, &bad_y),
        Err(Error::Key)
    ));
    assert!(matches!(
        VerifyingKey::from_coords(CurveId::NistP256, &params.gx[..16], &bad_y[..16]),
        Err(Error::BufferSize)
    ));
}

#[test]
fn keys_do_not_cross_curves() {
    // A P-256 signature must not verify under a P-384 key even with the
    // same digest.
    let k256 = SigningKey::random(CurveId::NistP256, &mut OsRng).expect("keygen");
    let sig = k256.sign_prehash(&DIGEST, &mut OsRng).expect("sign");
    let k384 = SigningKey::random(CurveId::NistP384, &mut OsRng).expect("keygen");
    let public = k384.verifying_key(&mut OsRng).expect("public key");
    assert_eq!(public.verify_prehash(&DIGEST, &sig), Err(Error::Signature));
}
