/// FIX field dictionary
///
/// Maps tag numbers to field names and enumerated value labels. Built once,
/// either by hand or from the `<fields>` section of a QuickFIX-style XML data
/// dictionary, and read-only afterwards.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required attribute '{0}' on field")]
    MissingAttribute(&'static str),

    #[error("invalid tag number '{0}'")]
    InvalidTag(String),

    #[error("duplicate field definition for tag {0}")]
    DuplicateTag(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub tag: u32,
    pub name: String,
    /// Coded value -> display label, empty for free-form fields
    pub enumeration: HashMap<String, String>,
}

impl FieldDef {
    pub fn new(tag: u32, name: impl Into<String>) -> Self {
        FieldDef {
            tag,
            name: name.into(),
            enumeration: HashMap::new(),
        }
    }

    pub fn with_value(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.enumeration.insert(code.into(), label.into());
        self
    }

    /// Display label for a coded value, if the field enumerates it
    pub fn label(&self, code: &str) -> Option<&str> {
        self.enumeration.get(code).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    fields: HashMap<u32, FieldDef>,
    by_name: HashMap<String, u32>,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary::default()
    }

    pub fn insert(&mut self, def: FieldDef) -> Result<(), DictionaryError> {
        if self.fields.contains_key(&def.tag) {
            return Err(DictionaryError::DuplicateTag(def.tag));
        }
        self.by_name.insert(def.name.clone(), def.tag);
        self.fields.insert(def.tag, def);
        Ok(())
    }

    pub fn lookup(&self, tag: u32) -> Option<&FieldDef> {
        self.fields.get(&tag)
    }

    pub fn lookup_name(&self, name: &str) -> Option<&FieldDef> {
        self.by_name.get(name).and_then(|tag| self.fields.get(tag))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    /// Parse the `<fields>` section of a FIX XML data dictionary.
    ///
    /// `<field>` elements elsewhere (message and component members) only carry
    /// a name and are skipped.
    pub fn from_xml(xml: &str) -> Result<Self, DictionaryError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut dict = Dictionary::new();
        let mut in_fields = false;
        let mut current: Option<FieldDef> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"fields" => in_fields = true,
                    b"field" if in_fields => current = Some(parse_field(e)?),
                    b"value" => {
                        if let Some(def) = current.as_mut() {
                            parse_value(e, def)?;
                        }
                    }
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                    b"field" if in_fields => dict.insert(parse_field(e)?)?,
                    b"value" => {
                        if let Some(def) = current.as_mut() {
                            parse_value(e, def)?;
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(ref e)) => match e.name().as_ref() {
                    b"fields" => in_fields = false,
                    b"field" => {
                        if let Some(def) = current.take() {
                            dict.insert(def)?;
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(DictionaryError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        tracing::debug!(fields = dict.len(), "loaded FIX dictionary");
        Ok(dict)
    }
}

fn parse_field(e: &BytesStart<'_>) -> Result<FieldDef, DictionaryError> {
    let mut number = None;
    let mut name = None;

    for attr in e.attributes().flatten() {
        let value = std::str::from_utf8(&attr.value)?;
        match attr.key.as_ref() {
            b"number" => number = Some(value.to_string()),
            b"name" => name = Some(value.to_string()),
            _ => {}
        }
    }

    let number = number.ok_or(DictionaryError::MissingAttribute("number"))?;
    let name = name.ok_or(DictionaryError::MissingAttribute("name"))?;
    let tag = number
        .parse::<u32>()
        .map_err(|_| DictionaryError::InvalidTag(number.clone()))?;

    Ok(FieldDef::new(tag, name))
}

fn parse_value(e: &BytesStart<'_>, def: &mut FieldDef) -> Result<(), DictionaryError> {
    let mut code = None;
    let mut label = None;

    for attr in e.attributes().flatten() {
        let value = std::str::from_utf8(&attr.value)?;
        match attr.key.as_ref() {
            b"enum" => code = Some(value.to_string()),
            b"description" => label = Some(value.to_string()),
            _ => {}
        }
    }

    let code = code.ok_or(DictionaryError::MissingAttribute("enum"))?;
    let label = label.ok_or(DictionaryError::MissingAttribute("description"))?;
    def.enumeration.insert(code, label);
    Ok(())
}
