use crate::{
    domain::{album::Album, id::DocId, track::Track},
    storage::{collection::Collection, db::DbHandle, error::StorageError, schema::tables},
};

/// Name of the embedded-copy array inside an album document.
const TRACKS_FIELD: &str = "tracks";

/// CRUD over album documents, plus the field-level mutations of the
/// embedded track array that the association manager is built on.
#[derive(Clone)]
pub struct AlbumStore {
    docs: Collection<Album>,
}

impl AlbumStore {
    pub fn new(conn: DbHandle) -> Self {
        Self {
            docs: Collection::new(conn, tables::ALBUMS),
        }
    }

    /// Stores the album including whatever embedded tracks the caller
    /// supplied, unvalidated.
    pub fn create(&self, album: &mut Album) -> Result<DocId, StorageError> {
        self.docs.insert(album)
    }

    pub fn get(&self, id: &DocId) -> Result<Album, StorageError> {
        self.docs
            .find(id)?
            .ok_or_else(|| StorageError::AlbumNotFound(id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<Album>, StorageError> {
        self.docs.list()
    }

    /// Replaces the entire document, embedded sequence included. Callers
    /// that want to keep the track list across an unrelated edit must
    /// read-modify-write.
    pub fn update(&self, id: &DocId, album: &mut Album) -> Result<(), StorageError> {
        if self.docs.replace(id, album)? {
            Ok(())
        } else {
            Err(StorageError::AlbumNotFound(id.to_string()))
        }
    }

    pub fn delete(&self, id: &DocId) -> Result<(), StorageError> {
        if self.docs.delete(id)? {
            Ok(())
        } else {
            Err(StorageError::AlbumNotFound(id.to_string()))
        }
    }

    /// Overwrites the embedded sequence with exactly the given tracks.
    /// An unmatched album id is a silent no-op, like an unmatched update
    /// against the backing collection.
    pub fn set_tracks(&self, id: &DocId, tracks: &[Track]) -> Result<(), StorageError> {
        self.docs
            .set_field(id, TRACKS_FIELD, serde_json::to_value(tracks)?)?;
        Ok(())
    }

    /// Appends one embedded copy to the sequence.
    pub fn push_track(&self, id: &DocId, track: &Track) -> Result<(), StorageError> {
        self.docs
            .push_element(id, TRACKS_FIELD, serde_json::to_value(track)?)?;
        Ok(())
    }

    /// Removes every embedded entry whose identifier matches, reporting
    /// how many were removed.
    pub fn pull_track(&self, id: &DocId, track_id: &str) -> Result<usize, StorageError> {
        self.docs.pull_elements(id, TRACKS_FIELD, "id", track_id)
    }

    pub fn find_matching(&self, fields: &[&str], keyword: &str) -> Result<Vec<Album>, StorageError> {
        self.docs.find_matching(fields, keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{db, schema};

    fn mock_album(title: &str) -> Album {
        Album {
            id: String::new(),
            title: title.to_string(),
            cover: "cover.png".to_string(),
            tracks: vec![],
        }
    }

    fn mock_track(title: &str, id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: title.to_string(),
            artist: "Artist".to_string(),
            genre: "Pop".to_string(),
            release_year: "1999".to_string(),
            duration: "3:00".to_string(),
            file_name: "t.mp3".to_string(),
        }
    }

    fn setup() -> AlbumStore {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();
        AlbumStore::new(db::share(conn))
    }

    #[test]
    fn create_keeps_supplied_embedded_tracks() {
        let store = setup();
        let mut album = mock_album("Hits");
        album.tracks.push(mock_track("One", "aaaaaaaaaaaaaaaaaaaaaaaa"));

        let id = store.create(&mut album).unwrap();

        let found = store.get(&id).unwrap();
        assert_eq!(found.tracks.len(), 1);
        assert_eq!(found.tracks[0].title, "One");
    }

    #[test]
    fn update_replaces_the_whole_document() {
        let store = setup();
        let mut album = mock_album("Hits");
        album.tracks.push(mock_track("One", "aaaaaaaaaaaaaaaaaaaaaaaa"));
        let id = store.create(&mut album).unwrap();

        // replacement carries no tracks; the stored sequence goes with it
        let mut replacement = mock_album("Renamed");
        store.update(&id, &mut replacement).unwrap();

        let found = store.get(&id).unwrap();
        assert_eq!(found.title, "Renamed");
        assert!(found.tracks.is_empty());
    }

    #[test]
    fn get_and_delete_missing_are_not_found() {
        let store = setup();
        let id = DocId::generate();

        assert!(matches!(
            store.get(&id).unwrap_err(),
            StorageError::AlbumNotFound(_)
        ));
        assert!(matches!(
            store.delete(&id).unwrap_err(),
            StorageError::AlbumNotFound(_)
        ));
    }

    #[test]
    fn set_push_pull_maintain_the_sequence() {
        let store = setup();
        let mut album = mock_album("Hits");
        let id = store.create(&mut album).unwrap();

        let first = mock_track("One", "aaaaaaaaaaaaaaaaaaaaaaaa");
        let second = mock_track("Two", "bbbbbbbbbbbbbbbbbbbbbbbb");

        store.set_tracks(&id, std::slice::from_ref(&first)).unwrap();
        store.push_track(&id, &second).unwrap();

        let found = store.get(&id).unwrap();
        assert_eq!(found.tracks, vec![first.clone(), second]);

        assert_eq!(store.pull_track(&id, &first.id).unwrap(), 1);
        assert_eq!(store.get(&id).unwrap().tracks.len(), 1);
    }

    #[test]
    fn pull_removes_duplicates_in_one_call() {
        let store = setup();
        let mut album = mock_album("Hits");
        let dup = mock_track("One", "aaaaaaaaaaaaaaaaaaaaaaaa");
        album.tracks = vec![
            dup.clone(),
            mock_track("Two", "bbbbbbbbbbbbbbbbbbbbbbbb"),
            dup.clone(),
        ];
        let id = store.create(&mut album).unwrap();

        assert_eq!(store.pull_track(&id, &dup.id).unwrap(), 2);
        assert_eq!(store.get(&id).unwrap().tracks.len(), 1);
    }

    #[test]
    fn track_mutations_on_missing_album_are_silent() {
        let store = setup();
        let id = DocId::generate();
        let track = mock_track("One", "aaaaaaaaaaaaaaaaaaaaaaaa");

        store.set_tracks(&id, std::slice::from_ref(&track)).unwrap();
        store.push_track(&id, &track).unwrap();
        assert_eq!(store.pull_track(&id, &track.id).unwrap(), 0);
    }
}
