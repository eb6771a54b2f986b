use std::fmt;

use serde_json::Value;

/// One step into a nested payload: an object field or a list index.
///
/// Addresses deserialize from plain JSON arrays mixing both kinds, e.g.
/// `["data", "users", 0, "id"]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum AddressKey {
    Index(usize),
    Key(String),
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKey::Index(i) => write!(f, "{i}"),
            AddressKey::Key(k) => write!(f, "{k}"),
        }
    }
}

/// A path into a nested JSON payload, outermost key first.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Address(pub Vec<AddressKey>);

impl Address {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AddressKey> {
        self.0.iter()
    }

    /// Last named segment, used as the column name when the addressed value
    /// is copied into a sub-record.
    pub fn last_key(&self) -> Option<&str> {
        self.0.iter().rev().find_map(|k| match k {
            AddressKey::Key(s) => Some(s.as_str()),
            AddressKey::Index(_) => None,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for key in &self.0 {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

impl From<Vec<AddressKey>> for Address {
    fn from(keys: Vec<AddressKey>) -> Self {
        Self(keys)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("no field '{key}' at position {position} of address {address}")]
    MissingKey {
        address: String,
        key: String,
        position: usize,
    },
    #[error("index {index} out of range at position {position} of address {address}")]
    IndexOutOfRange {
        address: String,
        index: usize,
        position: usize,
    },
    #[error("cannot descend past position {position} of address {address}: value is not a container of that shape")]
    NotAContainer { address: String, position: usize },
}

/// Walks `address` into `data`. An empty address returns `data` unchanged.
pub fn resolve_address<'a>(data: &'a Value, address: &Address) -> Result<&'a Value, AddressError> {
    let mut current = data;
    for (position, key) in address.iter().enumerate() {
        current = match (key, current) {
            (AddressKey::Key(k), Value::Object(map)) => {
                map.get(k).ok_or_else(|| AddressError::MissingKey {
                    address: address.to_string(),
                    key: k.clone(),
                    position,
                })?
            }
            (AddressKey::Index(i), Value::Array(items)) => {
                items.get(*i).ok_or_else(|| AddressError::IndexOutOfRange {
                    address: address.to_string(),
                    index: *i,
                    position,
                })?
            }
            _ => {
                return Err(AddressError::NotAContainer {
                    address: address.to_string(),
                    position,
                })
            }
        };
    }
    Ok(current)
}
