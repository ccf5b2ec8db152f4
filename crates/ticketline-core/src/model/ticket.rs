use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fields::{Field, is_truthy, normalize_name, value_text};

/// One raw ticket record exactly as the source provided it.
///
/// The record is kept as an ordered JSON object so every original field
/// survives enrichment untouched. Semantic access goes through the
/// [`Field`] alias table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTicket(Map<String, Value>);

impl RawTicket {
    /// Wrap a JSON value; `None` unless it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Resolved value of a semantic field (first present alias).
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&Value> {
        field.resolve(&self.0).map(|(_, value)| value)
    }

    /// Resolved value of a semantic field as trimmed text.
    #[must_use]
    pub fn text(&self, field: Field) -> Option<String> {
        self.get(field).and_then(value_text)
    }

    /// Resolved value of a semantic field with whitespace collapsed.
    #[must_use]
    pub fn name(&self, field: Field) -> Option<String> {
        self.text(field).as_deref().and_then(normalize_name)
    }

    /// Whether the boolean-like `blocked` field is set.
    #[must_use]
    pub fn blocked_flag(&self) -> bool {
        self.get(Field::Blocked).is_some_and(is_truthy)
    }
}
