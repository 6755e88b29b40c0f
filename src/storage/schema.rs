use rusqlite::Connection;

pub mod tables {
    pub const TRACKS: &str = "tracks";
    pub const ALBUMS: &str = "albums";
    pub const USERS: &str = "users";

    pub const ALL_TABLES: &[&str] = &[TRACKS, ALBUMS, USERS];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const BODY: &str = "body";
}

pub use columns::*;
pub use tables::*;

// Each collection is a table of JSON documents addressed by id.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tracks (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS albums (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    body TEXT NOT NULL
);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
