use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use royalty_desk::auth::{Credential, CredentialValidator, MarkerCodec, User, UserRole};
use royalty_desk::config::{Config, SessionConfig};
use royalty_desk::session::{MemoryScope, PersistenceMode, SessionMarker, SessionStore};

fn bench_marker_codec(c: &mut Criterion) {
    let codec = MarkerCodec::new(&SessionConfig::default());
    let marker = SessionMarker::issue(&User::new("admin", UserRole::Administrator), PersistenceMode::Durable);

    c.bench_function("marker_encode", |b| b.iter(|| codec.encode(black_box(&marker))));

    let token = codec.encode(&marker).unwrap();
    c.bench_function("marker_decode", |b| b.iter(|| codec.decode(black_box(&token))));
}

fn bench_credentials(c: &mut Criterion) {
    let validator = CredentialValidator::from_config(&Config::default());
    let good = Credential::new("editor", "editor123");
    let bad = Credential::new("editor", "wrong");

    c.bench_function("validate_accepted", |b| b.iter(|| validator.validate(black_box(&good))));
    c.bench_function("validate_rejected", |b| b.iter(|| validator.validate(black_box(&bad))));
}

fn bench_session_store(c: &mut Criterion) {
    let user = User::new("viewer", UserRole::Viewer);

    c.bench_function("store_establish_and_read", |b| {
        b.iter(|| {
            let mut store = SessionStore::new(
                MemoryScope::new(),
                MemoryScope::new(),
                MarkerCodec::new(&SessionConfig::default()),
            );
            store.establish(&user, PersistenceMode::Ephemeral).unwrap();
            black_box(store.current().unwrap())
        })
    });
}

criterion_group!(benches, bench_marker_codec, bench_credentials, bench_session_store);
criterion_main!(benches);
