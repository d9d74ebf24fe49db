use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::WikiError;

/// Values the client believes are currently stored, keyed by field name.
/// Fields left out are not checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectedFieldSet(BTreeMap<String, String>);

impl ExpectedFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.0.insert(field.to_string(), value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, String>> for ExpectedFieldSet {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self(fields)
    }
}

/// Compare client expectations with stored values.
///
/// Every mismatching field is reported in one `ConcurrentModification`
/// error. A field name the entity does not have is an `InvalidArgument`.
pub fn check_expected(
    expected: &ExpectedFieldSet,
    current: &BTreeMap<String, String>,
) -> Result<(), WikiError> {
    let mut diff = String::new();

    for (field, want) in expected.iter() {
        let Some(have) = current.get(field) else {
            return Err(WikiError::InvalidArgument(format!(
                "unknown field '{}' in expected revision",
                field
            )));
        };
        if have != want {
            diff.push_str(&render_field_diff(field, want, have));
        }
    }

    if diff.is_empty() {
        Ok(())
    } else {
        Err(WikiError::ConcurrentModification { diff })
    }
}

/// `--- field (expected)` / `+++ field (current)` header, then the
/// expected lines prefixed with `-` and the current lines with `+`.
pub fn render_field_diff(field: &str, expected: &str, current: &str) -> String {
    let mut out = format!("--- {} (expected)\n+++ {} (current)\n", field, field);
    for line in expected.split('\n') {
        out.push('-');
        out.push_str(line);
        out.push('\n');
    }
    for line in current.split('\n') {
        out.push('+');
        out.push_str(line);
        out.push('\n');
    }
    out
}
