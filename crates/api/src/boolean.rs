//! Loose boolean parsing for request input.
//!
//! Clients send flags as `true`, `1`, `"true"`, `"1"`, `"yes"`, `"on"` and
//! their negative counterparts. Handlers only ever see `bool`.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Parses the textual forms of a flag, ignoring case and surrounding spaces.
pub fn parse_loose_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl LooseBool {
    fn into_bool<E: serde::de::Error>(self) -> Result<Option<bool>, E> {
        match self {
            LooseBool::Bool(b) => Ok(Some(b)),
            LooseBool::Int(0) => Ok(Some(false)),
            LooseBool::Int(1) => Ok(Some(true)),
            LooseBool::Int(n) => Err(E::custom(format!("invalid boolean: {n}"))),
            LooseBool::Text(s) if s.trim().is_empty() => Ok(None),
            LooseBool::Text(s) => parse_loose_bool(&s)
                .map(Some)
                .ok_or_else(|| E::custom(format!("invalid boolean: {s:?}"))),
        }
    }
}

/// Deserializes a required loose boolean.
pub fn deserialize_loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    LooseBool::deserialize(deserializer)?
        .into_bool()?
        .ok_or_else(|| serde::de::Error::custom("missing boolean"))
}

/// Deserializes an optional loose boolean; null and blank strings are `None`.
pub fn deserialize_optional_loose_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<LooseBool>::deserialize(deserializer)? {
        Some(value) => value.into_bool(),
        None => Ok(None),
    }
}
