/// Order book reconstruction from decoded market-data messages
///
/// A full-refresh snapshot replaces both sides of the book. An incremental
/// refresh carries NEW/CHANGE/DELETE actions, applied in message order. The
/// reconstructor owns the book; nothing else can mutate it.

use crate::book_builder::{BookError, OrderBook};
use crate::config::FeedConfig;
use crate::decoder::DecodedMessage;
use crate::protocol::{
    parse_price, parse_size, MsgKind, Side, UpdateAction, INCREMENTAL_REFRESH, MD_ENTRY_PX,
    MD_ENTRY_REF_ID, MD_ENTRY_SIZE, MD_ENTRY_TYPE, MD_UPDATE_ACTION, SNAPSHOT_FULL_REFRESH,
};
use crate::segment::{segment, Segment};

/// Outcome of applying one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Number of book entries loaded
    Snapshot { entries: usize },
    /// Number of actions applied
    Incremental { actions: usize },
    /// Not a market-data refresh
    Ignored,
}

#[derive(Debug, Clone)]
pub struct BookReconstructor {
    book: OrderBook,
    snapshot_leader: String,
    incremental_leader: String,
    atomic_incremental: bool,
    snapshots_applied: u64,
}

impl BookReconstructor {
    pub fn new() -> Self {
        Self::from_config(&FeedConfig::default())
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        BookReconstructor {
            book: OrderBook::new(),
            snapshot_leader: config.snapshot_leader.clone(),
            incremental_leader: config.incremental_leader.clone(),
            atomic_incremental: config.atomic_incremental,
            snapshots_applied: 0,
        }
    }

    /// Route a message by its `MsgType`
    pub fn apply(&mut self, msg: &DecodedMessage) -> Result<Applied, BookError> {
        match msg.kind() {
            MsgKind::SnapshotFullRefresh => self
                .apply_snapshot(msg)
                .map(|entries| Applied::Snapshot { entries }),
            MsgKind::IncrementalRefresh => self
                .apply_incremental(msg)
                .map(|actions| Applied::Incremental { actions }),
            MsgKind::Other => {
                tracing::debug!(msg_type = msg.msg_type(), "ignoring non market-data message");
                Ok(Applied::Ignored)
            }
        }
    }

    /// Replace the whole book with the entries of a full-refresh snapshot.
    ///
    /// The new book is built aside and swapped in on success, so a failing
    /// snapshot leaves the current book untouched. Entries whose type is
    /// neither BID nor OFFER are skipped.
    pub fn apply_snapshot(&mut self, msg: &DecodedMessage) -> Result<usize, BookError> {
        expect_kind(msg, MsgKind::SnapshotFullRefresh, SNAPSHOT_FULL_REFRESH)?;

        let leader = self.snapshot_leader.as_str();
        let mut book = OrderBook::new();
        let mut entries = 0;

        for seg in segment(msg, leader) {
            let Some(side) = field(&seg, leader, MD_ENTRY_TYPE).and_then(Side::from_entry_type) else {
                continue;
            };
            let ref_id = required(&seg, leader, MD_ENTRY_REF_ID)?;
            let price = price_field(&seg, leader)?.ok_or(BookError::MissingField(MD_ENTRY_PX))?;
            let size = size_field(&seg, leader)?.ok_or(BookError::MissingField(MD_ENTRY_SIZE))?;

            book.side_mut(side).new_entry(ref_id, price, size)?;
            entries += 1;
        }

        self.book = book;
        self.snapshots_applied += 1;
        tracing::debug!(
            entries,
            bid_levels = self.book.bid_levels(),
            ask_levels = self.book.ask_levels(),
            "snapshot applied"
        );
        Ok(entries)
    }

    /// Apply the actions of an incremental refresh in order.
    ///
    /// On error the actions before the failing one stay applied, unless the
    /// reconstructor is configured for atomic incrementals.
    pub fn apply_incremental(&mut self, msg: &DecodedMessage) -> Result<usize, BookError> {
        expect_kind(msg, MsgKind::IncrementalRefresh, INCREMENTAL_REFRESH)?;

        let segments = segment(msg, &self.incremental_leader);

        let actions = if self.atomic_incremental {
            let mut staged = self.book.clone();
            let actions = apply_actions(&mut staged, &segments, &self.incremental_leader)?;
            self.book = staged;
            actions
        } else {
            apply_actions(&mut self.book, &segments, &self.incremental_leader)?
        };

        tracing::debug!(actions, "incremental applied");
        Ok(actions)
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// True until the first snapshot has been applied
    pub fn needs_snapshot(&self) -> bool {
        self.snapshots_applied == 0
    }

    pub fn snapshots_applied(&self) -> u64 {
        self.snapshots_applied
    }

    pub fn reset(&mut self) {
        self.book.clear();
        self.snapshots_applied = 0;
    }
}

impl Default for BookReconstructor {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_kind(msg: &DecodedMessage, kind: MsgKind, expected: &'static str) -> Result<(), BookError> {
    if msg.kind() == kind {
        return Ok(());
    }
    Err(BookError::WrongMessageType {
        expected,
        actual: msg.msg_type().unwrap_or_default().to_string(),
    })
}

fn apply_actions(book: &mut OrderBook, segments: &[Segment], leader: &str) -> Result<usize, BookError> {
    let mut applied = 0;
    // MDEntryType may be omitted on follow-up actions of the same message
    let mut entry_type: Option<&str> = None;

    for seg in segments {
        entry_type = field(seg, leader, MD_ENTRY_TYPE).or(entry_type);

        let action = match field(seg, leader, MD_UPDATE_ACTION) {
            None | Some("") => continue,
            Some(v) => UpdateAction::from_value(v).ok_or_else(|| BookError::UnknownAction(v.to_string()))?,
        };

        let Some(side) = entry_type.and_then(Side::from_entry_type) else {
            continue;
        };
        let ref_id = required(seg, leader, MD_ENTRY_REF_ID)?;
        let book_side = book.side_mut(side);

        match action {
            UpdateAction::New => {
                let price = price_field(seg, leader)?.ok_or(BookError::MissingField(MD_ENTRY_PX))?;
                let size = size_field(seg, leader)?.ok_or(BookError::MissingField(MD_ENTRY_SIZE))?;
                book_side.new_entry(ref_id, price, size)?;
            }
            UpdateAction::Delete => {
                book_side.delete_entry(ref_id)?;
            }
            UpdateAction::Change => {
                book_side.change_entry(ref_id, price_field(seg, leader)?, size_field(seg, leader)?)?;
            }
        }
        applied += 1;
    }

    Ok(applied)
}

/// Field value within a segment; the leader's own value lives outside the map
fn field<'a>(seg: &'a Segment, leader: &str, name: &str) -> Option<&'a str> {
    if name == leader {
        Some(seg.leader_value.as_str())
    } else {
        seg.get(name)
    }
}

fn required<'a>(seg: &'a Segment, leader: &str, name: &'static str) -> Result<&'a str, BookError> {
    field(seg, leader, name).ok_or(BookError::MissingField(name))
}

fn price_field(seg: &Segment, leader: &str) -> Result<Option<f64>, BookError> {
    field(seg, leader, MD_ENTRY_PX)
        .map(|v| {
            parse_price(v).ok_or_else(|| BookError::InvalidValue {
                field: MD_ENTRY_PX,
                value: v.to_string(),
            })
        })
        .transpose()
}

fn size_field(seg: &Segment, leader: &str) -> Result<Option<u64>, BookError> {
    field(seg, leader, MD_ENTRY_SIZE)
        .map(|v| {
            parse_size(v).ok_or_else(|| BookError::InvalidValue {
                field: MD_ENTRY_SIZE,
                value: v.to_string(),
            })
        })
        .transpose()
}
