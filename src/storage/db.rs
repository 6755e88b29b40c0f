use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use rusqlite::Connection;

use crate::{
    config,
    storage::{error::StorageError, schema},
};

/// Shared handle to the backing database. Opened once at startup and
/// cloned into every store that needs it.
pub type DbHandle = Arc<Mutex<Connection>>;

fn open_in_memory() -> Result<Connection, rusqlite::Error> {
    Connection::open_in_memory()
}

pub fn open(config: &config::Database) -> Result<Connection, StorageError> {
    let db = if config.in_memory {
        open_in_memory()?
    } else {
        let path = config.path.as_ref().ok_or_else(|| {
            StorageError::Internal(anyhow!(
                "database.path is required when in_memory = false"
            ))
        })?;
        Connection::open(path)?
    };
    schema::init(&db)?;
    Ok(db)
}

pub fn share(conn: Connection) -> DbHandle {
    Arc::new(Mutex::new(conn))
}
