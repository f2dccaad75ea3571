//! Values pushed to a results surface.
//!
//! Surfaces only understand a handful of JSON shapes, so everything is
//! converted into [`UiValue`] first and serialized with
//! [`to_minimal_json`].

use crate::core::Percentage;
use crate::errors::Result;
use crate::parser::Tally;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UiValue {
    Str(String),
    Num(f64),
    Array(Vec<UiValue>),
    Object(BTreeMap<String, UiValue>),
}

impl UiValue {
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, UiValue)>,
    {
        UiValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            UiValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Compact JSON with no whitespace. Non-finite numbers become `null`.
pub fn to_minimal_json(value: &UiValue) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

impl From<&str> for UiValue {
    fn from(s: &str) -> Self {
        UiValue::Str(s.to_string())
    }
}

impl From<String> for UiValue {
    fn from(s: String) -> Self {
        UiValue::Str(s)
    }
}

impl From<f64> for UiValue {
    fn from(n: f64) -> Self {
        UiValue::Num(n)
    }
}

impl From<usize> for UiValue {
    fn from(n: usize) -> Self {
        UiValue::Num(n as f64)
    }
}

impl From<Percentage> for UiValue {
    fn from(p: Percentage) -> Self {
        match p {
            Percentage::Defined(v) => UiValue::Num(v),
            Percentage::Undefined => UiValue::Str("n/a".to_string()),
        }
    }
}

impl<T: Into<UiValue>> From<Vec<T>> for UiValue {
    fn from(items: Vec<T>) -> Self {
        UiValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<&Tally> for UiValue {
    fn from(tally: &Tally) -> Self {
        UiValue::object([
            ("pass", tally.pass.into()),
            ("fail", tally.fail.into()),
            ("warn", tally.warn.into()),
            ("small", tally.small.into()),
            ("medium", tally.medium.into()),
            ("large", tally.large.into()),
        ])
    }
}
