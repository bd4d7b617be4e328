//! Performance benchmarks for StatusLineCodec.
//!
//! Card taps arrive at human pace, so these benchmarks mostly guard against
//! regressions in framing (many small serial reads) and parsing.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tokio_util::codec::Decoder;
use parkgate_protocol::{RecordParser, StatusLineCodec};

const ENTRY_LINE: &str = "Entry|93064AFC|Jane Doe|2024-01-01 08:00:00|N/A|9";

/// Build a stream of `count` terminated status lines.
fn create_stream(count: usize) -> Vec<u8> {
    (0..count)
        .map(|i| format!("Entry|93064AFC|Driver {i}|2024-01-01 08:00:00|N/A|{}\n", i % 100))
        .collect::<String>()
        .into_bytes()
}

/// Benchmark parsing a single record.
fn bench_parse_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_record");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_entry_line", |b| {
        b.iter(|| {
            let event = RecordParser::parse(black_box(ENTRY_LINE)).unwrap();
            black_box(event);
        });
    });

    group.finish();
}

/// Benchmark decoding a stream delivered in chunks of various sizes.
fn bench_decode_chunked(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_chunked");
    let stream = create_stream(100);
    group.throughput(Throughput::Elements(100));

    for chunk_size in [1usize, 16, 64, 4096] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut codec = StatusLineCodec::new();
                    let mut decoded = 0;
                    for chunk in stream.chunks(chunk_size) {
                        let mut buffer = BytesMut::from(chunk);
                        while let Some(result) = codec.decode(&mut buffer).unwrap() {
                            black_box(result.unwrap());
                            decoded += 1;
                        }
                    }
                    assert_eq!(decoded, 100);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_parse_record, bench_decode_chunked);
criterion_main!(benches);
