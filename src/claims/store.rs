//! Claim Store - loads and validates complexity claims
//!
//! Loading never stops at the first bad entry: every entry is checked and all
//! failures are returned together as [`Error::ClaimLoad`].

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::ComplexityClaim;
use crate::error::LoadErrors;
use crate::{ComplexityClass, Error, Result};

const OPERATION: &str = "operation";
const TIME_COMPLEXITY: &str = "time_complexity";
const SPACE_COMPLEXITY: &str = "space_complexity";
const NOTES: &str = "notes";

/// Validated claims of one claim source, keyed by operation.
///
/// ## Design
///
/// Claims are held in a `BTreeMap` so iteration is always in operation-name
/// order, which keeps matching and reporting deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClaimStore {
    claims: BTreeMap<String, ComplexityClaim>,
}

impl ClaimStore {
    /// Create a new empty claim store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load claims from an already parsed JSON document.
    ///
    /// Duplicate keys of a mapping-shaped document cannot be detected here,
    /// since `serde_json::Value` keeps only the last one; prefer
    /// [`ClaimStore::load_str`] for raw text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClaimLoad`] holding every `Schema`,
    /// `UnknownComplexityClass` and `DuplicateOperation` error found.
    pub fn load(source: Value) -> Result<Self> {
        let raw = RawSource::deserialize(source).map_err(|e| root_schema_error(&e))?;
        Self::from_raw(raw)
    }

    /// Load claims from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not JSON, otherwise as
    /// [`ClaimStore::load`].
    pub fn load_str(source: &str) -> Result<Self> {
        let raw: RawSource = serde_json::from_str(source).map_err(classify_json_error)?;
        Self::from_raw(raw)
    }

    /// Load claims from a reader yielding JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on read failure, otherwise as [`ClaimStore::load_str`].
    pub fn load_reader(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::load_str(&text)
    }

    /// Load claims from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`ClaimStore::load_str`].
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading claim source");
        let text = std::fs::read_to_string(path)?;
        Self::load_str(&text)
    }

    /// Add a claim, rejecting empty or already claimed operations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an empty operation name and
    /// [`Error::DuplicateOperation`] if the operation is already claimed.
    pub fn insert(&mut self, claim: ComplexityClaim) -> Result<()> {
        if claim.operation().trim().is_empty() {
            return Err(Error::Schema {
                entry: "<claim>".to_string(),
                message: "operation must be a non-empty string".to_string(),
            });
        }
        if self.claims.contains_key(claim.operation()) {
            return Err(Error::DuplicateOperation(claim.operation().to_string()));
        }
        self.claims.insert(claim.operation().to_string(), claim);
        Ok(())
    }

    /// Check if the store holds no claims.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Get the number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Get a claim by operation.
    #[must_use]
    pub fn get(&self, operation: &str) -> Option<&ComplexityClaim> {
        self.claims.get(operation)
    }

    /// Check if an operation is claimed.
    #[must_use]
    pub fn contains(&self, operation: &str) -> bool {
        self.claims.contains_key(operation)
    }

    /// Iterate claims in operation-name order.
    pub fn iter(&self) -> impl Iterator<Item = &ComplexityClaim> {
        self.claims.values()
    }

    /// Iterate operation names in order.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.claims.keys().map(String::as_str)
    }

    /// Keep only the named operations.
    ///
    /// An empty filter keeps everything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming every requested operation that
    /// is not claimed.
    pub fn restrict<S: AsRef<str>>(mut self, operations: &[S]) -> Result<Self> {
        if operations.is_empty() {
            return Ok(self);
        }
        let unknown: Vec<&str> = operations
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.claims.contains_key(*name))
            .collect();
        if !unknown.is_empty() {
            return Err(Error::InvalidInput(format!(
                "operations not present in claim source: {}",
                unknown.join(", ")
            )));
        }
        self.claims
            .retain(|name, _| operations.iter().any(|o| o.as_ref() == name));
        Ok(self)
    }

    fn from_raw(raw: RawSource) -> Result<Self> {
        let mut store = Self::new();
        let mut errors = LoadErrors::new();

        let entries: Vec<(String, Option<String>, Value)> = match raw {
            RawSource::Mapping(entries) => entries
                .into_iter()
                .map(|(key, value)| (key.clone(), Some(key), value))
                .collect(),
            RawSource::Records(records) => records
                .into_iter()
                .enumerate()
                .map(|(index, value)| (format!("entry #{index}"), None, value))
                .collect(),
        };

        for (label, key, value) in entries {
            match parse_entry(&label, key.as_deref(), value) {
                Ok(claim) => {
                    if let Err(error) = store.insert(claim) {
                        errors.push(error);
                    }
                }
                Err(entry_errors) => {
                    for error in entry_errors {
                        errors.push(error);
                    }
                }
            }
        }

        debug!(claims = store.len(), errors = errors.len(), "claim source loaded");
        errors.into_result(store)
    }
}

impl<'a> IntoIterator for &'a ClaimStore {
    type Item = &'a ComplexityClaim;
    type IntoIter = std::collections::btree_map::Values<'a, String, ComplexityClaim>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.values()
    }
}

/// Validate one entry, collecting every problem it has.
fn parse_entry(
    label: &str,
    key: Option<&str>,
    value: Value,
) -> std::result::Result<ComplexityClaim, Vec<Error>> {
    let schema = |message: String| Error::Schema {
        entry: label.to_string(),
        message,
    };

    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(vec![schema(format!(
                "expected an object, found {}",
                json_type(&other)
            ))]);
        }
    };

    let mut errors = Vec::new();

    let operation = match (fields.remove(OPERATION), key) {
        (None, Some(key)) => Some(key.to_string()),
        (None, None) => {
            errors.push(schema(format!("missing required field `{OPERATION}`")));
            None
        }
        (Some(Value::String(name)), Some(key)) if name != key => {
            errors.push(schema(format!(
                "`{OPERATION}` field {name:?} does not match its key {key:?}"
            )));
            None
        }
        (Some(Value::String(name)), _) => Some(name),
        (Some(other), _) => {
            errors.push(schema(format!(
                "`{OPERATION}` must be a string, found {}",
                json_type(&other)
            )));
            None
        }
    };

    let operation = match operation {
        Some(name) if name.trim().is_empty() => {
            errors.push(schema("operation must be a non-empty string".to_string()));
            None
        }
        other => other,
    };
    let display_name = operation.clone().unwrap_or_else(|| label.to_string());

    let mut class_field = |field: &str| -> Option<ComplexityClass> {
        match fields.remove(field) {
            None => {
                errors.push(schema(format!("missing required field `{field}`")));
                None
            }
            Some(Value::String(symbol)) => match symbol.parse() {
                Ok(class) => Some(class),
                Err(_) => {
                    errors.push(Error::UnknownComplexityClass {
                        operation: display_name.clone(),
                        field: field.to_string(),
                        symbol,
                    });
                    None
                }
            },
            Some(other) => {
                errors.push(schema(format!(
                    "`{field}` must be a string, found {}",
                    json_type(&other)
                )));
                None
            }
        }
    };
    let time = class_field(TIME_COMPLEXITY);
    let space = class_field(SPACE_COMPLEXITY);

    let notes = match fields.remove(NOTES) {
        None | Some(Value::Null) => None,
        Some(Value::String(notes)) => Some(notes),
        Some(other) => {
            errors.push(schema(format!(
                "`{NOTES}` must be a string, found {}",
                json_type(&other)
            )));
            None
        }
    };

    match (operation, time, space) {
        (Some(operation), Some(time), Some(space)) if errors.is_empty() => {
            let mut builder = ComplexityClaim::builder(operation, time, space);
            if let Some(notes) = notes {
                builder = builder.notes(notes);
            }
            for (field, value) in fields {
                builder = builder.metadata(field, value);
            }
            Ok(builder.build())
        }
        _ => Err(errors),
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn root_schema_error(error: &serde_json::Error) -> Error {
    Error::ClaimLoad({
        let mut errors = LoadErrors::new();
        errors.push(Error::Schema {
            entry: "<root>".to_string(),
            message: error.to_string(),
        });
        errors
    })
}

fn classify_json_error(error: serde_json::Error) -> Error {
    if error.is_data() {
        root_schema_error(&error)
    } else {
        Error::Json(error)
    }
}

/// Top-level document, preserving duplicate mapping keys.
enum RawSource {
    Mapping(Vec<(String, Value)>),
    Records(Vec<Value>),
}

impl<'de> Deserialize<'de> for RawSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(RawSourceVisitor)
    }
}

struct RawSourceVisitor;

impl<'de> Visitor<'de> for RawSourceVisitor {
    type Value = RawSource;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed by operation or an array of claim records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<RawSource, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            entries.push((key, value));
        }
        Ok(RawSource::Mapping(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<RawSource, A::Error> {
        let mut records = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element::<Value>()? {
            records.push(value);
        }
        Ok(RawSource::Records(records))
    }
}
