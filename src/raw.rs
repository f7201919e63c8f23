/// Tag=value line splitting
///
/// One message per line: pairs are separated by a delimiter character and each
/// pair is split on its first `=`. A trailing delimiter leaves an empty final
/// pair which is dropped.

use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RawParseError {
    #[error("malformed pair at position {position}: '{pair}'")]
    MalformedPair { position: usize, pair: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    pub tag: String,
    pub value: String,
}

impl RawField {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        RawField {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

pub fn parse_message(line: &str, delimiter: char) -> Result<Vec<RawField>, RawParseError> {
    let mut pairs: Vec<&str> = line.split(delimiter).collect();
    if pairs.last().is_some_and(|p| p.is_empty()) {
        pairs.pop();
    }

    pairs
        .into_iter()
        .enumerate()
        .map(|(position, pair)| {
            pair.split_once('=')
                .map(|(tag, value)| RawField::new(tag, value))
                .ok_or_else(|| RawParseError::MalformedPair {
                    position,
                    pair: pair.to_string(),
                })
        })
        .collect()
}

/// Join pairs back into a line, with a trailing delimiter as on the wire
pub fn format_message(fields: &[RawField], delimiter: char) -> String {
    let mut line = String::new();
    for f in fields {
        line.push_str(&f.tag);
        line.push('=');
        line.push_str(&f.value);
        line.push(delimiter);
    }
    line
}

/// Read a whole log, one message per non-blank line
pub fn parse_log<R: BufRead>(reader: R, delimiter: char) -> Result<Vec<Vec<RawField>>, RawParseError> {
    let mut messages = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }
        messages.push(parse_message(line, delimiter)?);
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_delimiter_dropped() {
        let fields = parse_message("8=FIX.4.4|35=W|", '|').unwrap();
        assert_eq!(fields, vec![RawField::new("8", "FIX.4.4"), RawField::new("35", "W")]);
    }

    #[test]
    fn test_value_containing_equals() {
        let fields = parse_message("58=a=b", '|').unwrap();
        assert_eq!(fields, vec![RawField::new("58", "a=b")]);
    }

    #[test]
    fn test_malformed_pair() {
        let result = parse_message("35=W|garbage|", '|');
        assert!(matches!(
            result,
            Err(RawParseError::MalformedPair { position: 1, .. })
        ));
    }

    #[test]
    fn test_format_roundtrip() {
        let line = "35=X|279=0|269=0|";
        let fields = parse_message(line, '|').unwrap();
        assert_eq!(format_message(&fields, '|'), line);
    }

    #[test]
    fn test_parse_log_skips_blank_lines() {
        let log = "35=W|268=0|\r\n\n35=X|268=0|\n";
        let messages = parse_log(log.as_bytes(), '|').unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1][0], RawField::new("35", "X"));
    }
}
