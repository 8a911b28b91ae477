//! 스키마 검증 벤치마크
//!
//! 시세/거래 스키마 컴파일과 버퍼 전체 검증 성능을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};
use tradespec_core::buffer::EventBuffer;
use tradespec_core::types::{quote_schema, trade_schema};

fn create_quote(seq: usize) -> Value {
    json!({
        "exchange": "vert.x stock exchange",
        "symbol": "MCH",
        "name": "MacroHard",
        "bid": 3389.0 + seq as f64,
        "ask": 3391.0 + seq as f64,
        "volume": 3,
        "open": 1000,
        "shares": 2
    })
}

fn create_trade(seq: usize) -> Value {
    json!({
        "action": if seq % 2 == 0 { "BUY" } else { "SELL" },
        "quote": create_quote(seq),
        "date": 1_700_000_000_000_i64 + seq as i64,
        "amount": 1,
        "owned": seq
    })
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_compile");
    group.bench_function("quote", |b| {
        b.iter(|| black_box(quote_schema().compile().expect("compile")))
    });
    group.bench_function("trade", |b| {
        b.iter(|| black_box(trade_schema().compile().expect("compile")))
    });
    group.finish();
}

fn bench_validate_single(c: &mut Criterion) {
    let quote = quote_schema().compile().expect("compile");
    let trade = trade_schema().compile().expect("compile");
    let valid_quote = create_quote(0);
    let valid_trade = create_trade(0);
    let mut invalid_trade = create_trade(0);
    invalid_trade["action"] = json!("HOLD");
    invalid_trade["amount"] = json!("one");

    let mut group = c.benchmark_group("schema_validate");
    group.throughput(Throughput::Elements(1));
    group.bench_function("quote_valid", |b| {
        b.iter(|| black_box(quote.validate(black_box(&valid_quote))))
    });
    group.bench_function("trade_valid", |b| {
        b.iter(|| black_box(trade.validate(black_box(&valid_trade))))
    });
    group.bench_function("trade_invalid", |b| {
        b.iter(|| black_box(trade.validate(black_box(&invalid_trade))))
    });
    group.finish();
}

fn bench_validate_buffer(c: &mut Criterion) {
    let schema = quote_schema().compile().expect("compile");

    let mut group = c.benchmark_group("schema_validate_buffer");
    for size in [10_usize, 100, 1000] {
        let buffer = EventBuffer::new("market");
        for seq in 0..size {
            buffer.push(create_quote(seq));
        }
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &buffer, |b, buffer| {
            b.iter(|| buffer.inspect(|items| black_box(schema.validate_all(items).is_ok())))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_validate_single,
    bench_validate_buffer
);
criterion_main!(benches);
