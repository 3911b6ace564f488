use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A stream image: attribute name to typed value.
pub type Image = BTreeMap<String, AttributeValue>;

/// Typed attribute value as it appears in stream images, e.g. `{"S": "abc"}`.
///
/// Numbers are carried as decimal strings, binary values as base64 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "B")]
    B(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(Vec<String>),
    #[serde(rename = "M")]
    M(BTreeMap<String, AttributeValue>),
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::Null(_) => "NULL",
            Self::Ss(_) => "SS",
            Self::Ns(_) => "NS",
            Self::Bs(_) => "BS",
            Self::M(_) => "M",
            Self::L(_) => "L",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&str> {
        match self {
            Self::N(value) => Some(value),
            _ => None,
        }
    }

    /// Plain JSON projection, used for logging record contents.
    ///
    /// Numbers that do not parse as JSON numbers are kept as strings.
    pub fn to_json(&self) -> Value {
        match self {
            Self::S(value) | Self::B(value) => Value::String(value.clone()),
            Self::N(value) => number_to_json(value),
            Self::Bool(value) => Value::Bool(*value),
            Self::Null(_) => Value::Null,
            Self::Ss(values) | Self::Bs(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
            Self::Ns(values) => Value::Array(values.iter().map(|v| number_to_json(v)).collect()),
            Self::M(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            Self::L(values) => Value::Array(values.iter().map(AttributeValue::to_json).collect()),
        }
    }
}

pub fn image_to_json(image: &Image) -> Value {
    Value::Object(
        image
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}

fn number_to_json(text: &str) -> Value {
    text.parse::<Number>()
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(text.to_string()))
}
