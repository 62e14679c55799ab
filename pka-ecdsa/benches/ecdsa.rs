//! Sign/verify throughput on P-256.

use criterion::{criterion_group, criterion_main, Criterion};
use pka_ecdsa::{CurveId, SigningKey};
use rand_core::OsRng;

fn bench_sign(c: &mut Criterion) {
    let key = SigningKey::random(CurveId::NistP256, &mut OsRng).expect("keygen");
    let digest = [0xabu8; 32];
    c.bench_function("sign_p256", |b| {
        b.iter(|| key.sign_prehash(&digest, &mut OsRng).expect("sign"));
    });
}

fn bench_verify(c: &mut Criterion) {
    let key = SigningKey::random(CurveId::NistP256, &mut OsRng).expect("keygen");
    let public = key.verifying_key(&mut OsRng).expect("public key");
    let digest = [0xabu8; 32];
    let sig = key.sign_prehash(&digest, &mut OsRng).expect("sign");
    c.bench_function("verify_p256", |b| {
        b.iter(|| public.verify_prehash(&digest, &sig).expect("verify"));
    });
}

criterion_group!(benches, bench_sign, bench_verify);
criterion_main!(benches);
