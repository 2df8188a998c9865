//! Benchmarks for ladder and feed processing

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use itch_market_data::encode;
use itch_market_data::{FeedProcessor, Ladder, Market, Side};
use std::io::Cursor;

const STOCK: [u8; 8] = *b"BENCH   ";

/// Adds clustered near the top of book, followed by their deletes
fn create_stream(orders: u64) -> Vec<u8> {
    let mut bytes = Vec::new();
    for reference in 0..orders {
        let side = if reference % 2 == 0 { Side::Buy } else { Side::Sell };
        let offset = (reference % 20) as u32;
        let price = match side {
            Side::Buy => 100_000 - offset,
            Side::Sell => 100_100 + offset,
        };
        encode::add_order(&mut bytes, (reference % 8) as u16, reference, side, 100, STOCK, price);
    }
    for reference in 0..orders {
        if reference % 3 == 0 {
            encode::execute_order(&mut bytes, (reference % 8) as u16, reference, 40, reference);
        }
        encode::delete_order(&mut bytes, (reference % 8) as u16, reference);
    }
    bytes
}

fn benchmark_ladder_insert(c: &mut Criterion) {
    let mut ladder = Ladder::new(Side::Buy);
    for price in 0..100 {
        ladder.insert(50_000 - price, 100);
    }

    c.bench_function("ladder_insert_reduce_near_top", |b| {
        b.iter(|| {
            ladder.insert(black_box(49_998), black_box(10));
            ladder.reduce(black_box(49_998), black_box(10));
        })
    });

    c.bench_function("ladder_insert_reduce_deep", |b| {
        b.iter(|| {
            ladder.insert(black_box(49_905), black_box(10));
            ladder.reduce(black_box(49_905), black_box(10));
        })
    });
}

fn benchmark_feed_processing(c: &mut Criterion) {
    let bytes = create_stream(10_000);
    let mut market = Market::new();

    let mut group = c.benchmark_group("feed");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("process_stream_10k_orders", |b| {
        b.iter(|| {
            let mut processor = FeedProcessor::new(Cursor::new(black_box(&bytes[..])), 0).unwrap();
            black_box(processor.run(&mut market).unwrap());
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_ladder_insert, benchmark_feed_processing);
criterion_main!(benches);
