//! Optional runtime-configurable parameters.
//!
//! Callers hand in a `Params` request (name -> value, any order). Application
//! validates it against the descriptor's slots and turns it into a
//! `Selection`: one entry per declared slot, in declaration order. Threading a
//! selection yields only the present slots, still in declaration order.

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;

/// An already-resolved parameter value. The core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    /// Source expression emitted verbatim.
    Expr(String),
    /// Reference to a runtime key of the same name.
    Key { key: String },
}

impl ParamValue {
    pub fn key(name: impl Into<String>) -> Self {
        Self::Key { key: name.into() }
    }

    pub fn expr(text: impl Into<String>) -> Self {
        Self::Expr(text.into())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{}", b),
            Self::Expr(text) => f.write_str(text),
            Self::Key { key } => write!(f, "runtime::key({:?})", key),
        }
    }
}

/// Caller-side request. Slots not mentioned are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, ParamValue)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.0.push((name.into(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, ParamValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (N, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }
}

/// Slot-aligned parameter record owned by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    slots: Vec<Option<ParamValue>>,
    supplied: usize,
}

impl Selection {
    /// Validate `params` against `slots`; `node` names the descriptor in errors.
    pub(crate) fn resolve(
        node: &str,
        slots: &[String],
        params: Params,
    ) -> Result<Self, ConfigError> {
        let mut values: Vec<Option<ParamValue>> = vec![None; slots.len()];
        let mut supplied = 0;
        for (name, value) in params.0 {
            let index = slots.iter().position(|s| *s == name).ok_or_else(|| {
                ConfigError::UnknownParameter {
                    node: node.to_string(),
                    name: name.clone(),
                }
            })?;
            if values[index].is_some() {
                return Err(ConfigError::DuplicateParameter {
                    node: node.to_string(),
                    name,
                });
            }
            values[index] = Some(value);
            supplied += 1;
        }
        Ok(Self {
            slots: values,
            supplied,
        })
    }

    /// Count of optional values supplied at application time.
    pub fn supplied(&self) -> usize {
        self.supplied
    }

    pub fn get(&self, index: usize) -> Option<&ParamValue> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Present `(label, value)` pairs in declaration order, absent slots skipped.
    pub fn thread<'a>(
        &'a self,
        labels: &'a [String],
    ) -> impl Iterator<Item = (&'a str, &'a ParamValue)> + 'a {
        labels
            .iter()
            .zip(&self.slots)
            .filter_map(|(label, value)| value.as_ref().map(|v| (label.as_str(), v)))
    }
}
