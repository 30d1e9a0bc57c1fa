use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shmcast::codec::framed;

fn mapping(records: usize, value_size: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..records)
        .map(|i| {
            (
                format!("assets/file-{:04}.dat", i).into_bytes(),
                vec![(i % 251) as u8; value_size],
            )
        })
        .collect()
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Framed_Encode");

    for &records in [16usize, 256, 4096].iter() {
        let input = mapping(records, 1024);
        group.throughput(Throughput::Bytes(framed::encoded_len(&input) as u64));
        group.bench_with_input(
            BenchmarkId::new("records_1KiB_values", records),
            &input,
            |b, input| {
                b.iter(|| framed::encode(input).unwrap());
            },
        );
    }

    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Framed_Decode");

    for &records in [16usize, 256, 4096].iter() {
        let encoded = framed::encode(&mapping(records, 1024)).unwrap();
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("records_1KiB_values", records),
            &encoded,
            |b, encoded| {
                b.iter(|| framed::decode(encoded).unwrap());
            },
        );
    }

    group.finish();
}

fn benchmark_value_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("Framed_ValueSizes");

    for &value_size in [64usize, 4096, 65536].iter() {
        let input = mapping(64, value_size);
        let encoded = framed::encode(&input).unwrap();
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("round_trip", value_size),
            &input,
            |b, input| {
                b.iter(|| {
                    let encoded = framed::encode(input).unwrap();
                    framed::decode(&encoded).unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_encode,
    benchmark_decode,
    benchmark_value_sizes
);
criterion_main!(benches);
