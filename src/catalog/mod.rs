//! Album/track association and catalog search.
//!
//! Albums embed full copies of their tracks. The operations here keep that
//! embedded sequence consistent with attach/detach requests and run the
//! keyword search across both collections.

use crate::{
    domain::{album::Album, id::DocId, track::Track},
    storage::{albums::AlbumStore, error::StorageError, tracks::TrackStore},
};

/// Album search matches the title only.
const ALBUM_SEARCH_FIELDS: &[&str] = &["title"];

/// Track search fields. The `album` entry is carried over from the
/// historical filter; track documents carry no such field, so that clause
/// never matches anything.
const TRACK_SEARCH_FIELDS: &[&str] = &["title", "artist", "album", "genre"];

pub struct Catalog {
    tracks: TrackStore,
    albums: AlbumStore,
}

impl Catalog {
    pub fn new(tracks: TrackStore, albums: AlbumStore) -> Self {
        Self { tracks, albums }
    }

    /// Adds a track to an album's embedded sequence, persisting the track
    /// first when it carries no identifier yet. Returns the (possibly newly
    /// identified) track.
    ///
    /// The album lookup tolerates a miss: an album whose sequence was never
    /// written and an album document that does not exist both need the same
    /// corrective write, so the two cases are deliberately not told apart.
    pub fn attach_new_track(
        &self,
        album_id: &DocId,
        mut track: Track,
    ) -> Result<Track, StorageError> {
        let album = match self.albums.get(album_id) {
            Ok(album) => Some(album),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        if track.id.is_empty() {
            self.tracks.create(&mut track)?;
        }

        match album {
            Some(album) if !album.tracks.is_empty() => {
                self.albums.push_track(album_id, &track)?;
            }
            // absent document or empty sequence: overwrite with a fresh
            // single-element array rather than appending to nothing
            _ => {
                self.albums.set_tracks(album_id, std::slice::from_ref(&track))?;
            }
        }

        Ok(track)
    }

    /// Embeds a fresh copy of an already-persisted track's current fields.
    /// Unlike [`Catalog::attach_new_track`], a missing album is an error
    /// here, as is a missing track.
    pub fn attach_existing_track(
        &self,
        album_id: &DocId,
        track_id: &DocId,
    ) -> Result<(), StorageError> {
        let track = self.tracks.get(track_id)?;
        let album = self.albums.get(album_id)?;

        if album.tracks.is_empty() {
            self.albums.set_tracks(album_id, std::slice::from_ref(&track))?;
        } else {
            self.albums.push_track(album_id, &track)?;
        }
        Ok(())
    }

    /// Removes every embedded entry whose identifier matches. Matching
    /// nothing, including against an album that does not exist, is a
    /// silent no-op success.
    pub fn detach_track(&self, album_id: &DocId, track_id: &DocId) -> Result<(), StorageError> {
        self.albums.pull_track(album_id, track_id.as_str())?;
        Ok(())
    }

    /// Case-insensitive substring search over album titles and track
    /// title/artist/genre. The two queries run independently; the result
    /// sets are not joined or deduplicated against each other. An empty
    /// keyword matches everything.
    pub fn search(&self, keyword: &str) -> Result<(Vec<Album>, Vec<Track>), StorageError> {
        let albums = self.albums.find_matching(ALBUM_SEARCH_FIELDS, keyword)?;
        let tracks = self.tracks.find_matching(TRACK_SEARCH_FIELDS, keyword)?;
        Ok((albums, tracks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{db, schema};

    fn setup() -> (Catalog, TrackStore, AlbumStore) {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        schema::init(&conn).unwrap();
        let handle = db::share(conn);

        let tracks = TrackStore::new(handle.clone());
        let albums = AlbumStore::new(handle);
        (Catalog::new(tracks.clone(), albums.clone()), tracks, albums)
    }

    fn mock_track(title: &str) -> Track {
        Track {
            id: String::new(),
            title: title.to_string(),
            artist: "X".to_string(),
            genre: "Pop".to_string(),
            release_year: "2010".to_string(),
            duration: "3:14".to_string(),
            file_name: "t.mp3".to_string(),
        }
    }

    fn mock_album(title: &str) -> Album {
        Album {
            id: String::new(),
            title: title.to_string(),
            cover: "c.png".to_string(),
            tracks: vec![],
        }
    }

    #[test]
    fn attach_new_track_assigns_a_retrievable_id() {
        let (catalog, tracks, albums) = setup();
        let album_id = albums.create(&mut mock_album("Hits")).unwrap();

        let attached = catalog.attach_new_track(&album_id, mock_track("Go")).unwrap();

        assert!(!attached.id.is_empty());
        let canonical = tracks.get(&DocId::parse(&attached.id).unwrap()).unwrap();
        assert_eq!(canonical, attached);
    }

    #[test]
    fn attach_to_empty_album_sets_a_single_element_sequence() {
        let (catalog, _, albums) = setup();
        let album_id = albums.create(&mut mock_album("Hits")).unwrap();

        let attached = catalog.attach_new_track(&album_id, mock_track("Go")).unwrap();

        let album = albums.get(&album_id).unwrap();
        assert_eq!(album.tracks, vec![attached]);
    }

    #[test]
    fn second_attach_appends_preserving_the_first() {
        let (catalog, _, albums) = setup();
        let album_id = albums.create(&mut mock_album("Hits")).unwrap();

        let first = catalog.attach_new_track(&album_id, mock_track("One")).unwrap();
        let second = catalog.attach_new_track(&album_id, mock_track("Two")).unwrap();

        let album = albums.get(&album_id).unwrap();
        assert_eq!(album.tracks, vec![first, second]);
    }

    #[test]
    fn attach_with_existing_id_skips_track_creation() {
        let (catalog, tracks, albums) = setup();
        let album_id = albums.create(&mut mock_album("Hits")).unwrap();

        let mut known = mock_track("Known");
        tracks.create(&mut known).unwrap();
        let count_before = tracks.list().unwrap().len();

        let attached = catalog.attach_new_track(&album_id, known.clone()).unwrap();

        assert_eq!(attached.id, known.id);
        assert_eq!(tracks.list().unwrap().len(), count_before);
    }

    #[test]
    fn attach_new_track_tolerates_a_missing_album_document() {
        let (catalog, tracks, _) = setup();
        let ghost = DocId::generate();

        // the corrective write has nothing to land on, but the track is
        // still persisted and returned
        let attached = catalog.attach_new_track(&ghost, mock_track("Go")).unwrap();

        assert!(!attached.id.is_empty());
        assert!(tracks.get(&DocId::parse(&attached.id).unwrap()).is_ok());
    }

    #[test]
    fn attach_existing_embeds_a_fresh_copy_of_current_fields() {
        let (catalog, tracks, albums) = setup();
        let album_id = albums.create(&mut mock_album("Hits")).unwrap();

        let mut track = mock_track("Original");
        let track_id = tracks.create(&mut track).unwrap();

        // edit the canonical record after creation; the embed must carry
        // the edited fields, not a stale caller copy
        let mut edited = track.clone();
        edited.title = "Edited".to_string();
        tracks.update(&track_id, &mut edited).unwrap();

        catalog.attach_existing_track(&album_id, &track_id).unwrap();

        let album = albums.get(&album_id).unwrap();
        assert_eq!(album.tracks.len(), 1);
        assert_eq!(album.tracks[0].title, "Edited");
    }

    #[test]
    fn two_sequential_attach_existing_calls_embed_in_call_order() {
        let (catalog, tracks, albums) = setup();
        let album_id = albums.create(&mut mock_album("Hits")).unwrap();

        let first_id = tracks.create(&mut mock_track("One")).unwrap();
        let second_id = tracks.create(&mut mock_track("Two")).unwrap();

        catalog.attach_existing_track(&album_id, &first_id).unwrap();
        catalog.attach_existing_track(&album_id, &second_id).unwrap();

        let album = albums.get(&album_id).unwrap();
        assert_eq!(album.tracks.len(), 2);
        assert_eq!(album.tracks[0].title, "One");
        assert_eq!(album.tracks[1].title, "Two");
    }

    #[test]
    fn attach_existing_requires_both_documents() {
        let (catalog, tracks, albums) = setup();
        let album_id = albums.create(&mut mock_album("Hits")).unwrap();
        let track_id = tracks.create(&mut mock_track("One")).unwrap();

        assert!(matches!(
            catalog
                .attach_existing_track(&album_id, &DocId::generate())
                .unwrap_err(),
            StorageError::TrackNotFound(_)
        ));
        assert!(matches!(
            catalog
                .attach_existing_track(&DocId::generate(), &track_id)
                .unwrap_err(),
            StorageError::AlbumNotFound(_)
        ));
    }

    #[test]
    fn detach_is_an_idempotent_no_op_without_matches() {
        let (catalog, _, albums) = setup();
        let album_id = albums.create(&mut mock_album("Hits")).unwrap();
        let attached = catalog.attach_new_track(&album_id, mock_track("Go")).unwrap();
        let attached_id = DocId::parse(&attached.id).unwrap();

        // no such track embedded: sequence unchanged, still a success
        catalog.detach_track(&album_id, &DocId::generate()).unwrap();
        assert_eq!(albums.get(&album_id).unwrap().tracks.len(), 1);

        catalog.detach_track(&album_id, &attached_id).unwrap();
        assert!(albums.get(&album_id).unwrap().tracks.is_empty());

        // second detach of the same id is a no-op success
        catalog.detach_track(&album_id, &attached_id).unwrap();
        assert!(albums.get(&album_id).unwrap().tracks.is_empty());
    }

    #[test]
    fn detach_does_not_delete_the_canonical_record() {
        let (catalog, tracks, albums) = setup();
        let album_id = albums.create(&mut mock_album("Hits")).unwrap();
        let attached = catalog.attach_new_track(&album_id, mock_track("Go")).unwrap();
        let attached_id = DocId::parse(&attached.id).unwrap();

        catalog.detach_track(&album_id, &attached_id).unwrap();

        assert!(tracks.get(&attached_id).is_ok());
    }

    #[test]
    fn search_with_empty_keyword_returns_everything() {
        let (catalog, tracks, albums) = setup();
        albums.create(&mut mock_album("Hits")).unwrap();
        albums.create(&mut mock_album("More Hits")).unwrap();
        tracks.create(&mut mock_track("One")).unwrap();

        let (found_albums, found_tracks) = catalog.search("").unwrap();
        assert_eq!(found_albums.len(), 2);
        assert_eq!(found_tracks.len(), 1);
    }

    #[test]
    fn search_is_case_insensitive() {
        let (catalog, tracks, albums) = setup();
        albums.create(&mut mock_album("Rock Anthems")).unwrap();
        let mut track = mock_track("Ballad");
        track.genre = "Rock".to_string();
        tracks.create(&mut track).unwrap();

        let upper = catalog.search("ROCK").unwrap();
        let lower = catalog.search("rock").unwrap();

        assert_eq!(upper.0.len(), 1);
        assert_eq!(upper.1.len(), 1);
        assert_eq!(upper.0, lower.0);
        assert_eq!(upper.1, lower.1);
    }

    #[test]
    fn search_matches_artist_and_genre_but_not_album_titles_on_tracks() {
        let (catalog, tracks, albums) = setup();
        albums.create(&mut mock_album("Nevermind")).unwrap();

        let mut track = mock_track("Lithium");
        track.artist = "Nirvana".to_string();
        tracks.create(&mut track).unwrap();

        let (_, by_artist) = catalog.search("nirvana").unwrap();
        assert_eq!(by_artist.len(), 1);

        // album titles are not a track search dimension
        let (by_title_albums, by_title_tracks) = catalog.search("nevermind").unwrap();
        assert_eq!(by_title_albums.len(), 1);
        assert!(by_title_tracks.is_empty());
    }

    #[test]
    fn scenario_create_attach_and_retrieve() {
        let (catalog, _, albums) = setup();

        let mut album = mock_album("Hits");
        let album_id = albums.create(&mut album).unwrap();

        let mut input = mock_track("Go");
        input.artist = "X".to_string();
        input.genre = "Pop".to_string();
        let attached = catalog.attach_new_track(&album_id, input).unwrap();

        let stored = albums.get(&album_id).unwrap();
        assert_eq!(stored.tracks.len(), 1);
        assert_eq!(stored.tracks[0].id, attached.id);
        assert_eq!(stored.tracks[0].title, "Go");
        assert_eq!(stored.tracks[0].artist, "X");
        assert_eq!(stored.tracks[0].genre, "Pop");
    }
}
