use serde::{Deserialize, Serialize};

use super::{Document, track::Track};

/// Album record with its embedded track copies.
///
/// The `tracks` field is a denormalized snapshot: each entry carries the
/// identifier of a canonical track record, but its other fields are frozen
/// at the time the track was attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub cover: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Document for Album {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}
