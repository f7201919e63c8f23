/// Feed statistics tracking
///
/// Counts messages by kind, dropped tags and rejected messages, and keeps a
/// sliding window of decode and book update latencies.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW_SIZE: usize = 10000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p99_us: u64,
}

impl LatencyStats {
    fn from_window(window: &VecDeque<u64>) -> Option<Self> {
        if window.is_empty() {
            return None;
        }

        let mut sorted: Vec<u64> = window.iter().copied().collect();
        sorted.sort_unstable();

        Some(LatencyStats {
            min_us: sorted[0],
            max_us: sorted[sorted.len() - 1],
            mean_us: sorted.iter().sum::<u64>() as f64 / sorted.len() as f64,
            p50_us: sorted[sorted.len() / 2],
            p99_us: sorted[(sorted.len() * 99) / 100],
        })
    }
}

#[derive(Debug, Clone)]
pub struct FeedStats {
    start_time: Option<Instant>,
    total_messages: u64,
    total_bytes: u64,

    snapshots: u64,
    incrementals: u64,
    ignored: u64,
    actions: u64,

    unknown_tags: u64,
    rejected: u64,

    decode_latencies: VecDeque<u64>,
    book_update_latencies: VecDeque<u64>,
}

impl FeedStats {
    pub fn new() -> Self {
        FeedStats {
            start_time: None,
            total_messages: 0,
            total_bytes: 0,
            snapshots: 0,
            incrementals: 0,
            ignored: 0,
            actions: 0,
            unknown_tags: 0,
            rejected: 0,
            decode_latencies: VecDeque::with_capacity(WINDOW_SIZE),
            book_update_latencies: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }

    /// Record a message line received
    pub fn record_message(&mut self, size: usize) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
        self.total_messages += 1;
        self.total_bytes += size as u64;
    }

    pub fn record_snapshot(&mut self) {
        self.snapshots += 1;
    }

    pub fn record_incremental(&mut self, actions: usize) {
        self.incrementals += 1;
        self.actions += actions as u64;
    }

    pub fn record_ignored(&mut self) {
        self.ignored += 1;
    }

    pub fn record_unknown_tags(&mut self, count: usize) {
        self.unknown_tags += count as u64;
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Record decode latency in microseconds
    pub fn record_decode_latency(&mut self, micros: u64) {
        push_window(&mut self.decode_latencies, micros);
    }

    /// Record book update latency in microseconds
    pub fn record_book_update_latency(&mut self, micros: u64) {
        push_window(&mut self.book_update_latencies, micros);
    }

    /// Get messages per second
    pub fn messages_per_sec(&self) -> f64 {
        match self.start_time {
            None => 0.0,
            Some(start) => {
                let elapsed = start.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    self.total_messages as f64 / elapsed
                } else {
                    0.0
                }
            }
        }
    }

    pub fn decode_latency_stats(&self) -> Option<LatencyStats> {
        LatencyStats::from_window(&self.decode_latencies)
    }

    pub fn book_update_latency_stats(&self) -> Option<LatencyStats> {
        LatencyStats::from_window(&self.book_update_latencies)
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|st| st.elapsed())
    }

    pub fn total_messages(&self) -> u64 {
        self.total_messages
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }

    pub fn incrementals(&self) -> u64 {
        self.incrementals
    }

    pub fn ignored(&self) -> u64 {
        self.ignored
    }

    /// Total NEW/CHANGE/DELETE actions applied
    pub fn actions(&self) -> u64 {
        self.actions
    }

    pub fn unknown_tags(&self) -> u64 {
        self.unknown_tags
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn reset(&mut self) {
        *self = FeedStats::new();
    }

    /// Emit a statistics summary through `tracing`
    pub fn log_summary(&self) {
        tracing::info!(
            messages = self.total_messages,
            bytes = self.total_bytes,
            snapshots = self.snapshots,
            incrementals = self.incrementals,
            ignored = self.ignored,
            actions = self.actions,
            unknown_tags = self.unknown_tags,
            rejected = self.rejected,
            msgs_per_sec = self.messages_per_sec(),
            "feed statistics"
        );

        if let Some(s) = self.decode_latency_stats() {
            tracing::info!(min_us = s.min_us, max_us = s.max_us, mean_us = s.mean_us, p50_us = s.p50_us, p99_us = s.p99_us, "decode latency");
        }

        if let Some(s) = self.book_update_latency_stats() {
            tracing::info!(min_us = s.min_us, max_us = s.max_us, mean_us = s.mean_us, p50_us = s.p50_us, p99_us = s.p99_us, "book update latency");
        }
    }
}

impl Default for FeedStats {
    fn default() -> Self {
        Self::new()
    }
}

fn push_window(window: &mut VecDeque<u64>, value: u64) {
    if window.len() >= WINDOW_SIZE {
        window.pop_front();
    }
    window.push_back(value);
}
