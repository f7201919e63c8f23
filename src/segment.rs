/// Repeating-group segmentation
///
/// Tag=value market-data messages carry their repeating groups without length
/// markers. A group starts every time its leader field appears, so a decoded
/// message is split on each occurrence of the leader:
///
///   35=X|279=0|269=0|278=A|279=2|269=1|278=B
///        ^ segment 1         ^ segment 2
///
/// Fields before the first leader belong to the message header and are not
/// part of any segment. The last segment is closed at the end of the message.

use crate::decoder::DecodedMessage;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub leader_value: String,
    /// Last write wins when a field repeats inside one segment
    pub fields: HashMap<String, String>,
}

impl Segment {
    fn open(leader_value: &str) -> Self {
        Segment {
            leader_value: leader_value.to_string(),
            fields: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

pub fn segment(msg: &DecodedMessage, leader: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current: Option<Segment> = None;

    for (name, value) in msg.iter() {
        if name == leader {
            if let Some(done) = current.replace(Segment::open(value)) {
                segments.push(done);
            }
            continue;
        }

        if let Some(seg) = current.as_mut() {
            seg.fields.insert(name.to_string(), value.to_string());
        }
    }

    if let Some(done) = current {
        segments.push(done);
    }

    if segments.is_empty() && !msg.is_empty() {
        tracing::debug!(leader, fields = msg.len(), "no group leader in message, nothing to segment");
    }

    segments
}
