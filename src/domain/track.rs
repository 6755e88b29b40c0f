use serde::{Deserialize, Serialize};

use super::Document;

/// Canonical track record.
///
/// The identifier is empty until the track store persists the record;
/// afterwards it is immutable. Albums embed full copies of this struct,
/// and those copies are not kept in sync with later edits to the
/// canonical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub release_year: String,
    pub duration: String,
    pub file_name: String,
}

impl Document for Track {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}
