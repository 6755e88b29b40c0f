use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::storage::error::StorageError;

/// Canonical document identifier: 24 hex characters (12 bytes).
///
/// A `DocId` is only ever constructed by [`DocId::generate`] when the store
/// persists a new document, or by [`DocId::parse`] from an identifier that
/// crossed the API boundary. A value of this type is therefore always
/// well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

const ID_LEN: usize = 24;

impl DocId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_LEN / 2];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Validates an identifier supplied by a caller.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.len() == ID_LEN && s.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(StorageError::InvalidId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
