//! Field decoders for the loosely typed documents the school API returns.
//! Shapes they do not understand become `None` instead of failing the whole
//! document.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// A reference as the school API sends it: a plain id, a numeric id, or a
/// populated document carrying `_id` and/or `id`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRef {
    Text(String),
    Number(serde_json::Number),
    Document {
        #[serde(default, rename = "_id")]
        mongo_id: Option<Box<RawRef>>,
        #[serde(default)]
        id: Option<Box<RawRef>>,
    },
    Other(JsonValue),
}

impl RawRef {
    fn into_id(self) -> Option<String> {
        match self {
            RawRef::Text(id) => Some(id.trim().to_string()).filter(|id| !id.is_empty()),
            RawRef::Number(n) => Some(n.to_string()),
            RawRef::Document { mongo_id, id } => mongo_id
                .and_then(|r| r.into_id())
                .or_else(|| id.and_then(|r| r.into_id())),
            RawRef::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRefs {
    Many(Vec<RawRef>),
    Other(JsonValue),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
    Other(JsonValue),
}

pub fn ref_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawRef> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(RawRef::into_id))
}

pub fn required_ref_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    ref_id(deserializer)?.ok_or_else(|| D::Error::custom("expected an id or a document with one"))
}

/// A list of references; entries without a usable id are dropped.
pub fn ref_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawRefs> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawRefs::Many(refs)) => refs.into_iter().filter_map(RawRef::into_id).collect(),
        Some(RawRefs::Other(_)) | None => Vec::new(),
    })
}

/// Finite numbers, including ones sent as strings (`"60"`).
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawNumber> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawNumber::Number(n)) => Some(n),
        Some(RawNumber::Text(s)) => s.trim().parse().ok(),
        Some(RawNumber::Other(_)) | None => None,
    }
    .filter(|n: &f64| n.is_finite()))
}

/// Non-negative whole numbers that fit a `u32`.
pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}
