/// Order book update latency benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fix_feed_handler::{BookReconstructor, BookSide, DecodedField, DecodedMessage, Side};

fn populated_side(side: Side, levels: u64, orders_per_level: u64) -> BookSide {
    let mut book_side = BookSide::new(side);
    for l in 0..levels {
        for o in 0..orders_per_level {
            book_side.new_entry(&format!("{l}-{o}"), 100.0 + l as f64 * 0.01, 100).unwrap();
        }
    }
    book_side
}

fn bench_new_entry(c: &mut Criterion) {
    c.bench_function("book_new_entry", |b| {
        let mut side = BookSide::new(Side::Bid);
        let mut n = 0u64;

        b.iter(|| {
            side.new_entry(&n.to_string(), 100.0 + (n % 500) as f64 * 0.01, 100).unwrap();
            n += 1;
        });
    });
}

fn bench_delete_and_readd(c: &mut Criterion) {
    let mut side = populated_side(Side::Ask, 100, 10);

    c.bench_function("book_delete_readd", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let id = format!("{}-{}", i % 100, (i / 100) % 10);
            if let Ok(removed) = side.delete_entry(&id) {
                side.new_entry(&id, 100.0 + (i % 100) as f64 * 0.01, removed.size).unwrap();
            }
            i += 1;
        });
    });
}

fn bench_change_price(c: &mut Criterion) {
    let mut side = populated_side(Side::Bid, 100, 10);

    c.bench_function("book_change_price", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let px = 100.0 + (i % 100) as f64 * 0.01;
            let _ = side.change_entry("50-5", Some(px), None);
            i += 1;
        });
    });
}

fn snapshot(levels: usize) -> DecodedMessage {
    let mut fields = vec![field("MsgType", "MARKET_DATA_SNAPSHOT_FULL_REFRESH")];
    for i in 0..levels {
        for (entry, px) in [("BID", 99.99 - i as f64 * 0.01), ("OFFER", 100.01 + i as f64 * 0.01)] {
            fields.push(field("MDEntryType", entry));
            fields.push(field("MDEntryRefID", &format!("{entry}{i}")));
            fields.push(field("MDEntryPx", &format!("{px:.2}")));
            fields.push(field("MDEntrySize", "100"));
        }
    }
    DecodedMessage { fields }
}

fn field(name: &str, value: &str) -> DecodedField {
    DecodedField::new(name, value)
}

fn bench_snapshot(c: &mut Criterion) {
    let msg = snapshot(100);
    let mut rec = BookReconstructor::new();

    c.bench_function("book_snapshot_200_entries", |b| {
        b.iter(|| rec.apply_snapshot(black_box(&msg)).unwrap())
    });
}

fn bench_depth(c: &mut Criterion) {
    let mut rec = BookReconstructor::new();
    rec.apply_snapshot(&snapshot(100)).unwrap();
    let book = rec.book();

    c.bench_function("book_depth_10", |b| b.iter(|| black_box(book.depth(10))));
    c.bench_function("book_spread", |b| b.iter(|| black_box(book.spread())));
}

criterion_group!(
    benches,
    bench_new_entry,
    bench_delete_and_readd,
    bench_change_price,
    bench_snapshot,
    bench_depth
);
criterion_main!(benches);
