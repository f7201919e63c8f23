/// Feed processing configuration

use crate::protocol::{MD_ENTRY_TYPE, MD_UPDATE_ACTION};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Pair separator in the log lines
    pub delimiter: char,
    /// Group leader for full-refresh snapshots
    pub snapshot_leader: String,
    /// Group leader for incremental refreshes
    pub incremental_leader: String,
    /// Apply an incremental message all-or-nothing instead of segment by segment
    pub atomic_incremental: bool,
    /// Log and count a rejected message instead of returning its error
    pub skip_failed_messages: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            delimiter: '|',
            snapshot_leader: MD_ENTRY_TYPE.to_string(),
            incremental_leader: MD_UPDATE_ACTION.to_string(),
            atomic_incremental: false,
            skip_failed_messages: false,
        }
    }
}

impl FeedConfig {
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_leaders(mut self, snapshot: impl Into<String>, incremental: impl Into<String>) -> Self {
        self.snapshot_leader = snapshot.into();
        self.incremental_leader = incremental.into();
        self
    }

    pub fn with_atomic_incremental(mut self, atomic: bool) -> Self {
        self.atomic_incremental = atomic;
        self
    }

    pub fn with_skip_failed_messages(mut self, skip: bool) -> Self {
        self.skip_failed_messages = skip;
        self
    }
}
