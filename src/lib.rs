/// FIX Feed Handler - Market Data Order Book Reconstruction
///
/// Rebuilds a price-level order book from a log of tag=value FIX market-data
/// messages. Features include:
/// - Dictionary-driven decoding with enumeration labels
/// - Repeating-group segmentation by leader field
/// - Full-refresh snapshot and incremental NEW/CHANGE/DELETE application
/// - Per-order size attribution inside each price level
/// - Feed statistics

pub mod protocol;
pub mod dictionary;
pub mod raw;
pub mod decoder;
pub mod segment;
pub mod book_builder;
pub mod reconstructor;
pub mod config;
pub mod handler;
pub mod stats;

pub use protocol::{MsgKind, Side, UpdateAction, SOH};
pub use dictionary::{Dictionary, DictionaryError, FieldDef};
pub use raw::{RawField, RawParseError};
pub use decoder::{CollectingSink, DecodedField, DecodedMessage, Decoder, DiagnosticSink, TracingSink};
pub use segment::{segment, Segment};
pub use book_builder::{BookDepth, BookError, BookSide, OrderBook, OrderContribution, PriceLevel};
pub use reconstructor::{Applied, BookReconstructor};
pub use config::FeedConfig;
pub use handler::{FeedError, FeedHandler};
pub use stats::{FeedStats, LatencyStats};
