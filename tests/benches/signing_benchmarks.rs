//! # Signing Benchmarks
//!
//! Every status read signs a fresh attestation and every signed request
//! recovers a personal-message signer, so both sit on the request path.
//!
//! | Operation | Target |
//! |-----------|--------|
//! | Personal-message signer recovery | < 1ms |
//! | Verification attestation | < 1ms |
//! | Disclosure (three attestations) | < 3ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use k256::ecdsa::SigningKey;
use pp_01_signing_engine::{
    keccak256, recover_personal_signer, sign_personal_message, AgeThreshold, SignerKeyring,
    SigningApi, SigningEngine,
};
use shared_types::{Address, ChainId};
use std::time::Duration;

const CHAIN: ChainId = ChainId(1);

fn engine() -> SigningEngine {
    let mut keyring = SignerKeyring::new();
    keyring.insert(CHAIN, SigningKey::random(&mut rand::thread_rng()));
    SigningEngine::new(keyring)
}

fn bench_signer_recovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("pp-01-recovery");
    group.measurement_time(Duration::from_secs(10));

    let key = SigningKey::random(&mut rand::thread_rng());
    let block = b"19000000";
    let signature = sign_personal_message(&key, block).unwrap();

    group.bench_function("recover_personal_signer", |b| {
        b.iter(|| black_box(recover_personal_signer(black_box(block), &signature).unwrap()))
    });

    for size in [10, 100] {
        let signatures: Vec<_> = (0..size)
            .map(|i| {
                let message = format!("{}", 19_000_000 + i);
                (message.clone(), sign_personal_message(&key, message.as_bytes()).unwrap())
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("recover_batch", size), &signatures, |b, sigs| {
            b.iter(|| {
                for (message, signature) in sigs {
                    black_box(recover_personal_signer(message.as_bytes(), signature).unwrap());
                }
            })
        });
    }

    group.finish();
}

fn bench_attestations(c: &mut Criterion) {
    let mut group = c.benchmark_group("pp-01-attestations");
    let engine = engine();
    let account = Address::new([0x42; 20]);
    let hash = keccak256(b"US1234567891970000000000");

    group.bench_function("sign_verification", |b| {
        b.iter(|| {
            black_box(
                engine
                    .sign_verification(CHAIN, account, 1_970_000_000, hash)
                    .unwrap(),
            )
        })
    });

    group.bench_function("sign_disclosure_set", |b| {
        b.iter(|| {
            black_box(engine.sign_age(CHAIN, account, AgeThreshold::Over18, true).unwrap());
            black_box(engine.sign_age(CHAIN, account, AgeThreshold::Over21, false).unwrap());
            black_box(engine.sign_country(CHAIN, account, 0x0055_0053).unwrap());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_signer_recovery, bench_attestations);
criterion_main!(benches);
