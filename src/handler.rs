/// Line-oriented feed processing
///
/// Ties the pieces together: a log line is split into tag/value pairs,
/// decoded against the dictionary and applied to the book, with statistics
/// recorded along the way. Messages must be fed in feed order.

use crate::book_builder::{BookError, OrderBook};
use crate::config::FeedConfig;
use crate::decoder::{DecodedMessage, Decoder, TracingSink};
use crate::dictionary::{Dictionary, DictionaryError};
use crate::raw::{parse_message, RawParseError};
use crate::reconstructor::{Applied, BookReconstructor};
use crate::stats::FeedStats;
use std::io::BufRead;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("raw message error: {0}")]
    Raw(#[from] RawParseError),

    #[error("book error: {0}")]
    Book(#[from] BookError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct FeedHandler {
    dictionary: Dictionary,
    config: FeedConfig,
    reconstructor: BookReconstructor,
    stats: FeedStats,
}

impl FeedHandler {
    pub fn new(dictionary: Dictionary, config: FeedConfig) -> Self {
        let reconstructor = BookReconstructor::from_config(&config);
        FeedHandler {
            dictionary,
            config,
            reconstructor,
            stats: FeedStats::new(),
        }
    }

    /// Split and decode one line. Unknown tags are logged, counted and dropped.
    pub fn decode_line(&mut self, line: &str) -> Result<DecodedMessage, FeedError> {
        let started = Instant::now();
        let raw = parse_message(line, self.config.delimiter)?;

        let mut sink = TracingSink::default();
        let msg = Decoder::new(&self.dictionary).decode(&raw, &mut sink);

        self.stats.record_unknown_tags(sink.unknown());
        self.stats.record_decode_latency(started.elapsed().as_micros() as u64);
        Ok(msg)
    }

    /// Decode one line and apply it to the book
    pub fn process_line(&mut self, line: &str) -> Result<Applied, FeedError> {
        self.stats.record_message(line.len());

        let result = self.decode_line(line).and_then(|msg| {
            let started = Instant::now();
            let applied = self.reconstructor.apply(&msg)?;
            self.stats.record_book_update_latency(started.elapsed().as_micros() as u64);
            Ok(applied)
        });

        match result {
            Ok(applied) => {
                match applied {
                    Applied::Snapshot { .. } => self.stats.record_snapshot(),
                    Applied::Incremental { actions } => self.stats.record_incremental(actions),
                    Applied::Ignored => self.stats.record_ignored(),
                }
                Ok(applied)
            }
            Err(e) => {
                self.stats.record_rejected();
                Err(e)
            }
        }
    }

    /// Process every non-blank line of a log in order.
    ///
    /// Returns the number of messages applied. A failing message aborts the
    /// run unless the config says to skip it.
    pub fn process_log<R: BufRead>(&mut self, reader: R) -> Result<usize, FeedError> {
        let mut applied = 0;

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }

            match self.process_line(line) {
                Ok(_) => applied += 1,
                Err(e) if self.config.skip_failed_messages => {
                    tracing::warn!(line = lineno + 1, error = %e, "skipping message");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(applied)
    }

    pub fn book(&self) -> &OrderBook {
        self.reconstructor.book()
    }

    pub fn reconstructor(&self) -> &BookReconstructor {
        &self.reconstructor
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
}
