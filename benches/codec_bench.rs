//! Performance benchmarks for MultipartCodec and request decoding.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use camsync_protocol::{CommandCode, Message, MultipartCodec, Reply, Request};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

fn get_request() -> Message {
    Request::get("DEV_000F314C4E5A", CommandCode::ExposureTime).encode()
}

fn set_request() -> Message {
    Request::set("DEV_000F314C4E5A", CommandCode::ImageSize, ["1936", "1216"]).encode()
}

fn encoded(msg: &Message) -> BytesMut {
    let mut buffer = BytesMut::new();
    msg.encode(&mut buffer).unwrap();
    buffer
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));

    for (name, msg) in [("get", get_request()), ("set", set_request())] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut codec = MultipartCodec::new();
                let mut buffer = BytesMut::new();
                codec.encode(black_box(msg.clone()), &mut buffer).unwrap();
                black_box(buffer);
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(1));

    for (name, msg) in [("get", get_request()), ("set", set_request())] {
        let wire = encoded(&msg);
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut codec = MultipartCodec::new();
                let mut buffer = wire.clone();
                black_box(codec.decode(&mut buffer).unwrap());
            });
        });
    }

    group.finish();
}

/// Full server-side cycle: decode, interpret, build and encode the reply.
fn bench_request_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_cycle");
    group.throughput(Throughput::Elements(1));

    let wire = encoded(&get_request());
    group.bench_function("get_exposure", |b| {
        b.iter(|| {
            let mut codec = MultipartCodec::new();
            let mut buffer = wire.clone();
            let msg = codec.decode(&mut buffer).unwrap().unwrap();
            let request = Request::decode(msg).unwrap();
            let reply = Reply::for_request(&request).result("5000.000000").build();
            let mut out = BytesMut::new();
            codec.encode(reply.to_message(), &mut out).unwrap();
            black_box(out);
        });
    });

    group.finish();
}

fn bench_decode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_batch");

    for batch_size in [10, 100, 1000] {
        let mut wire = BytesMut::new();
        for _ in 0..batch_size {
            set_request().encode(&mut wire).unwrap();
        }

        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &wire,
            |b, wire| {
                b.iter(|| {
                    let mut codec = MultipartCodec::new();
                    let mut buffer = wire.clone();
                    while let Some(msg) = codec.decode(&mut buffer).unwrap() {
                        black_box(msg);
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_decode_partial_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_partial_streaming");
    let wire = encoded(&set_request());

    for chunk_size in [1, 4, 16] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("chunk_{chunk_size}_bytes")),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut codec = MultipartCodec::new();
                    let mut buffer = BytesMut::new();
                    for chunk in wire.chunks(chunk_size) {
                        buffer.extend_from_slice(chunk);
                        if let Some(msg) = codec.decode(&mut buffer).unwrap() {
                            black_box(msg);
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_request_cycle,
    bench_decode_batch,
    bench_decode_partial_streaming
);
criterion_main!(benches);
