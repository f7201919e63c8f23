/// Snapshot and incremental application against the reference scenarios

use fix_feed_handler::raw::parse_message;
use fix_feed_handler::{
    BookError, BookReconstructor, CollectingSink, DecodedMessage, Decoder, Dictionary, FeedConfig,
    FeedHandler, OrderBook, Side,
};
use std::fs::File;
use std::io::BufReader;

const DICTIONARY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/fix44_md.xml");
const FEED_LOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/md_feed.log");

const SNAPSHOT: &str = "35=W|268=3|269=0|280=A|270=100.00|271=50|269=0|280=B|270=99.50|271=30|269=1|280=C|270=100.50|271=20|";

fn decode(line: &str) -> DecodedMessage {
    let dict = Dictionary::from_path(DICTIONARY).unwrap();
    let raw = parse_message(line, '|').unwrap();
    Decoder::new(&dict).decode(&raw, &mut CollectingSink::default())
}

fn contributions(book: &OrderBook, side: Side, price: f64) -> Vec<(String, u64)> {
    book.side(side)
        .level(price)
        .unwrap()
        .contributions()
        .iter()
        .map(|c| (c.ref_id.clone(), c.size))
        .collect()
}

fn ids(pairs: &[(&str, u64)]) -> Vec<(String, u64)> {
    pairs.iter().map(|(id, sz)| (id.to_string(), *sz)).collect()
}

fn after_snapshot() -> BookReconstructor {
    let mut rec = BookReconstructor::new();
    rec.apply_snapshot(&decode(SNAPSHOT)).unwrap();
    rec
}

#[test]
fn test_scenario_snapshot() {
    let rec = after_snapshot();
    let book = rec.book();

    let bids: Vec<_> = book.bids().levels().collect();
    assert_eq!(bids.len(), 2);
    assert_eq!((bids[0].price(), bids[0].size()), (100.00, 50));
    assert_eq!((bids[1].price(), bids[1].size()), (99.50, 30));
    assert_eq!(contributions(book, Side::Bid, 100.00), ids(&[("A", 50)]));
    assert_eq!(contributions(book, Side::Bid, 99.50), ids(&[("B", 30)]));

    let asks: Vec<_> = book.asks().levels().collect();
    assert_eq!(asks.len(), 1);
    assert_eq!((asks[0].price(), asks[0].size()), (100.50, 20));
    assert_eq!(contributions(book, Side::Ask, 100.50), ids(&[("C", 20)]));
}

#[test]
fn test_scenario_incremental_sequence() {
    let mut rec = after_snapshot();

    rec.apply_incremental(&decode("35=X|279=0|269=0|280=D|270=100.00|271=10|"))
        .unwrap();
    let level = rec.book().bids().level(100.00).unwrap();
    assert_eq!(level.size(), 60);
    assert_eq!(contributions(rec.book(), Side::Bid, 100.00), ids(&[("A", 50), ("D", 10)]));

    rec.apply_incremental(&decode("35=X|279=2|269=0|280=A|")).unwrap();
    assert_eq!(rec.book().bids().level(100.00).unwrap().size(), 10);
    assert_eq!(contributions(rec.book(), Side::Bid, 100.00), ids(&[("D", 10)]));

    rec.apply_incremental(&decode("35=X|279=2|269=0|280=D|")).unwrap();
    assert!(rec.book().bids().level(100.00).is_none());
    assert_eq!(rec.book().best_bid(), Some((99.50, 30)));

    rec.apply_incremental(&decode("35=X|279=1|269=1|280=C|270=101.00|"))
        .unwrap();
    assert!(rec.book().asks().level(100.50).is_none());
    assert_eq!(contributions(rec.book(), Side::Ask, 101.00), ids(&[("C", 20)]));
}

#[test]
fn test_scenario_wrong_message_type() {
    let mut rec = after_snapshot();
    let before = rec.book().clone();

    let err = rec.apply_incremental(&decode(SNAPSHOT)).unwrap_err();
    assert!(matches!(err, BookError::WrongMessageType { .. }));
    assert_eq!(rec.book(), &before);

    let err = rec
        .apply_snapshot(&decode("35=X|279=0|269=0|280=Z|270=1|271=1|"))
        .unwrap_err();
    assert!(matches!(err, BookError::WrongMessageType { .. }));
    assert_eq!(rec.book(), &before);
}

#[test]
fn test_snapshot_idempotent() {
    let once = after_snapshot();
    let mut twice = after_snapshot();
    twice.apply_snapshot(&decode(SNAPSHOT)).unwrap();
    assert_eq!(once.book(), twice.book());
}

#[test]
fn test_snapshot_replaces_existing_book() {
    let mut rec = after_snapshot();
    rec.apply_incremental(&decode("35=X|279=0|269=1|280=Q|270=105|271=1|"))
        .unwrap();

    rec.apply_snapshot(&decode("35=W|269=1|280=Z|270=102|271=4|")).unwrap();
    assert_eq!(rec.book().bid_levels(), 0);
    assert_eq!(rec.book().order_count(), 1);
    assert_eq!(rec.book().best_ask(), Some((102.0, 4)));
}

#[test]
fn test_snapshot_skips_other_entry_types() {
    let mut rec = BookReconstructor::new();
    let entries = rec
        .apply_snapshot(&decode("35=W|269=2|280=T|270=100|271=5|269=0|280=A|270=99|271=1|"))
        .unwrap();
    assert_eq!(entries, 1);
    assert_eq!(rec.book().order_count(), 1);
}

#[test]
fn test_unknown_action_keeps_earlier_actions() {
    let mut rec = after_snapshot();
    let msg = decode("35=X|279=0|269=0|280=D|270=98|271=1|279=5|269=0|280=E|270=97|271=1|279=0|269=0|280=F|270=96|271=1|");

    let err = rec.apply_incremental(&msg).unwrap_err();
    assert_eq!(err, BookError::UnknownAction("5".to_string()));
    assert!(rec.book().bids().contains("D"));
    assert!(!rec.book().bids().contains("E"));
    assert!(!rec.book().bids().contains("F"));
}

#[test]
fn test_atomic_incremental_rolls_back() {
    let config = FeedConfig::default().with_atomic_incremental(true);
    let mut rec = BookReconstructor::from_config(&config);
    rec.apply_snapshot(&decode(SNAPSHOT)).unwrap();
    let before = rec.book().clone();

    let msg = decode("35=X|279=0|269=0|280=D|270=98|271=1|279=2|269=1|280=missing|");
    let err = rec.apply_incremental(&msg).unwrap_err();
    assert!(matches!(err, BookError::RefIdNotFound { side: Side::Ask, .. }));
    assert_eq!(rec.book(), &before);
}

#[test]
fn test_trade_entries_ignored_in_incremental() {
    let mut rec = after_snapshot();
    let actions = rec
        .apply_incremental(&decode("35=X|279=0|269=2|280=T|270=100.25|271=7|"))
        .unwrap();
    assert_eq!(actions, 0);
    assert_eq!(rec.book().order_count(), 3);
}

#[test]
fn test_change_size_without_price() {
    let mut rec = after_snapshot();
    rec.apply_incremental(&decode("35=X|279=1|269=0|280=B|271=45|")).unwrap();
    assert_eq!(rec.book().bids().level(99.50).unwrap().size(), 45);
}

#[test]
fn test_change_unknown_ref() {
    let mut rec = after_snapshot();
    let err = rec
        .apply_incremental(&decode("35=X|279=1|269=0|280=nope|271=1|"))
        .unwrap_err();
    assert_eq!(
        err,
        BookError::RefIdNotFound {
            side: Side::Bid,
            ref_id: "nope".to_string()
        }
    );
}

#[test]
fn test_snapshot_size_overflow_keeps_previous_book() {
    let mut rec = after_snapshot();
    let before = rec.book().clone();

    let err = rec
        .apply_snapshot(&decode(
            "35=W|269=0|280=A|270=100|271=18446744073709551615|269=0|280=B|270=100|271=1|",
        ))
        .unwrap_err();
    assert_eq!(
        err,
        BookError::SizeOverflow {
            side: Side::Bid,
            price: 100.0
        }
    );
    assert_eq!(rec.book(), &before);
    assert_eq!(rec.snapshots_applied(), 1);
}

#[test]
fn test_incremental_size_overflow() {
    let mut rec = after_snapshot();

    let err = rec
        .apply_incremental(&decode("35=X|279=0|269=0|280=D|270=100.00|271=18446744073709551600|"))
        .unwrap_err();
    assert!(matches!(err, BookError::SizeOverflow { side: Side::Bid, .. }));
    assert!(!rec.book().bids().contains("D"));
    assert_eq!(rec.book().bids().level(100.00).unwrap().size(), 50);

    let err = rec
        .apply_incremental(&decode("35=X|279=1|269=0|280=B|270=100.00|271=18446744073709551600|"))
        .unwrap_err();
    assert!(matches!(err, BookError::SizeOverflow { .. }));
    assert_eq!(rec.book().bids().price_of("B"), Some(99.50));
    assert_eq!(rec.book().bids().level(99.50).unwrap().size(), 30);
}

#[test]
fn test_replay_feed_log() {
    let dict = Dictionary::from_path(DICTIONARY).unwrap();
    let mut handler = FeedHandler::new(dict, FeedConfig::default());
    let reader = BufReader::new(File::open(FEED_LOG).unwrap());

    assert_eq!(handler.process_log(reader).unwrap(), 5);

    let book = handler.book();
    assert_eq!(book.depth(10).bids, vec![(99.50, 30)]);
    assert_eq!(book.depth(10).asks, vec![(101.00, 20)]);
    assert_eq!(handler.stats().snapshots(), 1);
    assert_eq!(handler.stats().incrementals(), 4);
    assert_eq!(handler.stats().actions(), 4);
    assert_eq!(handler.stats().unknown_tags(), 0);
}
