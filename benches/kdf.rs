use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand_core::OsRng;
use textsecure_core::kdf::KeyDerivation;
use textsecure_core::{AttestationKeys, SecretKey};

fn bench_derive(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive");

    for (name, kdf) in [("v2", KeyDerivation::v2()), ("v3", KeyDerivation::v3())] {
        for len in [32, 64, 1024] {
            group.bench_with_input(BenchmarkId::new(name, len), &len, |b, &len| {
                b.iter(|| {
                    black_box(
                        kdf.derive(black_box(b"shared-secret"), None, b"ctx", len)
                            .unwrap(),
                    )
                });
            });
        }
    }

    group.finish();
}

fn bench_attestation_keys(c: &mut Criterion) {
    let client = SecretKey::generate(&mut OsRng);
    let server_ephemeral = SecretKey::generate(&mut OsRng).public_key();
    let server_static = SecretKey::generate(&mut OsRng).public_key();

    c.bench_function("attestation_keys_derive", |b| {
        b.iter(|| {
            black_box(
                AttestationKeys::derive(&client, &server_ephemeral, &server_static, 32).unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_derive, bench_attestation_keys);
criterion_main!(benches);
