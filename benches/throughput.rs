use bytering_spsc::RingBuffer;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_throughput(c: &mut Criterion) {
    let (mut tx, mut rx) = RingBuffer::init((1 << 20) - 1).unwrap();
    let src = [0x11u8; 64];
    let mut dst = [0u8; 64];

    c.bench_function("spsc_byte_roundtrip_64b", |b| {
        b.iter(|| {
            assert_eq!(tx.write(&src), 64);
            assert_eq!(rx.read(&mut dst), 64);
        })
    });
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
