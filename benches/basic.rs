use criterion::{criterion_group, criterion_main, Criterion};
use lightctl::hex::{hex_dump, parse_hex};
use lightctl::logging::format_bytes;
use std::hint::black_box;
use std::time::Duration;

pub fn bench_hex(c: &mut Criterion) {
    let frame: Vec<u8> = (0..=255u8).cycle().take(512).collect();
    let dump = hex_dump(&frame);

    c.bench_function("hex_dump_512", |b| b.iter(|| black_box(hex_dump(black_box(&frame)))));
    c.bench_function("format_tx_record_512", |b| {
        b.iter(|| black_box(format_bytes("TX", black_box(&frame))))
    });
    c.bench_function("parse_hex_512", |b| {
        b.iter(|| black_box(parse_hex(black_box(&dump)).unwrap()))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_hex
}
criterion_main!(benches);
