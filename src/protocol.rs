/// FIX market-data vocabulary
///
/// Field names, message kinds and enumerated values the book reconstruction
/// cares about. Values are matched against the dictionary labels first and the
/// raw wire codes second, so a dictionary without enumerations still works.

pub const MSG_TYPE: &str = "MsgType";
pub const MD_ENTRY_TYPE: &str = "MDEntryType";
pub const MD_UPDATE_ACTION: &str = "MDUpdateAction";
pub const MD_ENTRY_REF_ID: &str = "MDEntryRefID";
pub const MD_ENTRY_PX: &str = "MDEntryPx";
pub const MD_ENTRY_SIZE: &str = "MDEntrySize";

/// Standard FIX field separator
pub const SOH: char = '\x01';

pub const SNAPSHOT_FULL_REFRESH: &str = "MARKET_DATA_SNAPSHOT_FULL_REFRESH";
pub const INCREMENTAL_REFRESH: &str = "MARKET_DATA_INCREMENTAL_REFRESH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    SnapshotFullRefresh,
    IncrementalRefresh,
    Other,
}

impl MsgKind {
    pub fn from_value(v: &str) -> Self {
        match v {
            SNAPSHOT_FULL_REFRESH | "W" => MsgKind::SnapshotFullRefresh,
            INCREMENTAL_REFRESH | "X" => MsgKind::IncrementalRefresh,
            _ => MsgKind::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MsgKind::SnapshotFullRefresh => SNAPSHOT_FULL_REFRESH,
            MsgKind::IncrementalRefresh => INCREMENTAL_REFRESH,
            MsgKind::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    New,
    Change,
    Delete,
}

impl UpdateAction {
    /// Returns None for anything that is not one of the three book actions
    pub fn from_value(v: &str) -> Option<Self> {
        match v {
            "NEW" | "0" => Some(UpdateAction::New),
            "CHANGE" | "1" => Some(UpdateAction::Change),
            "DELETE" | "2" => Some(UpdateAction::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// Maps an `MDEntryType` value to a book side. Trades, index values and
    /// the rest of the entry types select no side.
    pub fn from_entry_type(v: &str) -> Option<Self> {
        match v {
            "BID" | "0" => Some(Side::Bid),
            "OFFER" | "1" => Some(Side::Ask),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Bid => f.write_str("bid"),
            Side::Ask => f.write_str("ask"),
        }
    }
}

/// Parse an `MDEntryPx` value. Non-finite prices are rejected.
pub fn parse_price(v: &str) -> Option<f64> {
    v.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Parse an `MDEntrySize` value as a non-negative integer
pub fn parse_size(v: &str) -> Option<u64> {
    v.trim().parse::<u64>().ok()
}
