use crate::{
    domain::{id::DocId, track::Track},
    storage::{collection::Collection, db::DbHandle, error::StorageError, schema::tables},
};

/// CRUD over the canonical track records.
#[derive(Clone)]
pub struct TrackStore {
    docs: Collection<Track>,
}

impl TrackStore {
    pub fn new(conn: DbHandle) -> Self {
        Self {
            docs: Collection::new(conn, tables::TRACKS),
        }
    }

    /// Persists a new record and returns the identifier the store assigned.
    /// The input's `id` field is overwritten with the fresh identifier.
    pub fn create(&self, track: &mut Track) -> Result<DocId, StorageError> {
        self.docs.insert(track)
    }

    pub fn get(&self, id: &DocId) -> Result<Track, StorageError> {
        self.docs
            .find(id)?
            .ok_or_else(|| StorageError::TrackNotFound(id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<Track>, StorageError> {
        self.docs.list()
    }

    /// Full replace of every field. The identifier addressed by `id` wins
    /// over whatever identifier the body carried.
    pub fn update(&self, id: &DocId, track: &mut Track) -> Result<(), StorageError> {
        if self.docs.replace(id, track)? {
            Ok(())
        } else {
            Err(StorageError::TrackNotFound(id.to_string()))
        }
    }

    pub fn delete(&self, id: &DocId) -> Result<(), StorageError> {
        if self.docs.delete(id)? {
            Ok(())
        } else {
            Err(StorageError::TrackNotFound(id.to_string()))
        }
    }

    pub fn find_matching(&self, fields: &[&str], keyword: &str) -> Result<Vec<Track>, StorageError> {
        self.docs.find_matching(fields, keyword)
    }
}
