/// Dictionary-driven message decoder
///
/// Turns raw tag/value pairs into named fields, substituting enumeration labels
/// where the dictionary has them. Order is preserved exactly: repeating-group
/// boundaries are only visible through the order in which tags recur.
///
/// Tags missing from the dictionary are reported to a [`DiagnosticSink`] and
/// dropped; decoding never fails as a whole.

use crate::dictionary::Dictionary;
use crate::protocol::{MsgKind, MSG_TYPE};
use crate::raw::RawField;

/// Receives decode-time diagnostics
pub trait DiagnosticSink {
    fn unknown_tag(&mut self, tag: &str, value: &str);
}

/// Forwards diagnostics to `tracing`, keeping a count
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink {
    unknown: usize,
}

impl TracingSink {
    /// Unknown tags seen so far
    pub fn unknown(&self) -> usize {
        self.unknown
    }
}

impl DiagnosticSink for TracingSink {
    fn unknown_tag(&mut self, tag: &str, value: &str) {
        tracing::warn!(tag, value, "unknown tag");
        self.unknown += 1;
    }
}

/// Keeps every dropped pair for later inspection
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub unknown: Vec<RawField>,
}

impl DiagnosticSink for CollectingSink {
    fn unknown_tag(&mut self, tag: &str, value: &str) {
        self.unknown.push(RawField::new(tag, value));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedField {
    pub name: String,
    pub value: String,
    /// Wire code when `value` is a substituted enumeration label
    pub code: Option<String>,
}

impl DecodedField {
    /// A field carrying its value verbatim
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        DecodedField {
            name: name.into(),
            value: value.into(),
            code: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedMessage {
    pub fields: Vec<DecodedField>,
}

impl DecodedMessage {
    /// First occurrence of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn msg_type(&self) -> Option<&str> {
        self.get(MSG_TYPE)
    }

    pub fn kind(&self) -> MsgKind {
        self.msg_type().map(MsgKind::from_value).unwrap_or(MsgKind::Other)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|f| (f.name.as_str(), f.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub struct Decoder<'d> {
    dictionary: &'d Dictionary,
}

impl<'d> Decoder<'d> {
    pub fn new(dictionary: &'d Dictionary) -> Self {
        Decoder { dictionary }
    }

    pub fn dictionary(&self) -> &Dictionary {
        self.dictionary
    }

    pub fn decode(&self, raw: &[RawField], sink: &mut dyn DiagnosticSink) -> DecodedMessage {
        let mut fields = Vec::with_capacity(raw.len());

        for pair in raw {
            let def = pair
                .tag
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(|tag| self.dictionary.lookup(tag));

            match def {
                Some(def) => fields.push(match def.label(&pair.value) {
                    Some(label) => DecodedField {
                        name: def.name.clone(),
                        value: label.to_string(),
                        code: Some(pair.value.clone()),
                    },
                    None => DecodedField::new(def.name.as_str(), pair.value.as_str()),
                }),
                None => sink.unknown_tag(&pair.tag, &pair.value),
            }
        }

        DecodedMessage { fields }
    }

    /// Map names back to tags and substituted labels back to their codes.
    ///
    /// Values that were not substituted go out verbatim, even when they happen
    /// to match a label. Fields whose name the dictionary does not know are
    /// skipped.
    pub fn encode(&self, msg: &DecodedMessage) -> Vec<RawField> {
        msg.fields
            .iter()
            .filter_map(|f| {
                let def = self.dictionary.lookup_name(&f.name);
                if def.is_none() {
                    tracing::debug!(name = %f.name, "cannot encode field without dictionary entry");
                }
                def.map(|def| {
                    let value = f.code.as_deref().unwrap_or(&f.value);
                    RawField::new(def.tag.to_string(), value)
                })
            })
            .collect()
    }
}
