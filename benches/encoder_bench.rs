use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::executor::block_on;
use futures::StreamExt;
use sql_seeder::encoder::{CsvFormat, DualStreamEncoder, RowBuffer, RowStream};
use sql_seeder::generator::Generator;
use std::hint::black_box;

fn drain(mut stream: RowStream) -> u64 {
    block_on(async {
        let mut bytes = 0u64;
        while let Some(chunk) = stream.next().await {
            bytes += chunk.unwrap().len() as u64;
        }
        bytes
    })
}

fn encoded_size(gen: &Generator) -> u64 {
    let streams = DualStreamEncoder::default().encode(gen);
    drain(streams.parents) + drain(streams.children)
}

fn bench_generator(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator");

    for parents in [100, 1000, 10000] {
        let gen = Generator::new(parents, 10, 42);
        group.throughput(Throughput::Elements(parents as u64 * 11));
        group.bench_with_input(
            BenchmarkId::new("units", format!("{}_parents", parents)),
            &gen,
            |b, gen| b.iter(|| black_box(gen.units().count())),
        );
    }

    group.finish();
}

fn bench_dual_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("dual_stream");

    for (parents, children) in [(1000, 10), (100, 1000), (10000, 1)] {
        let gen = Generator::new(parents, children, 42);
        group.throughput(Throughput::Bytes(encoded_size(&gen)));
        group.bench_with_input(
            BenchmarkId::new("encode", format!("{}x{}", parents, children)),
            &gen,
            |b, gen| {
                b.iter(|| {
                    let streams = DualStreamEncoder::default().encode(gen);
                    black_box(drain(streams.parents) + drain(streams.children))
                })
            },
        );
    }

    group.finish();
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_size");
    let gen = Generator::new(200, 100, 42);
    group.throughput(Throughput::Bytes(encoded_size(&gen)));

    for chunk_size in [4 * 1024, 16 * 1024, 64 * 1024, 256 * 1024] {
        group.bench_with_input(
            BenchmarkId::new("children", format!("{}KB", chunk_size / 1024)),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let encoder = DualStreamEncoder::default().with_chunk_size(chunk_size);
                    black_box(drain(encoder.encode(&gen).children))
                })
            },
        );
    }

    group.finish();
}

fn bench_field_quoting(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_quoting");
    let plain = "Acme Widgets and Sons";
    let quoted = "Acme, \"Widgets\"\nand Sons";

    for (label, text) in [("plain", plain), ("quoted", quoted)] {
        group.throughput(Throughput::Elements(1000));
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut rows = RowBuffer::new(CsvFormat::default());
                for _ in 0..1000 {
                    rows.row(|r| r.text("name", black_box(text))).unwrap();
                }
                black_box(rows.take_chunk())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_generator,
    bench_dual_stream,
    bench_chunk_sizes,
    bench_field_quoting,
);

criterion_main!(benches);
