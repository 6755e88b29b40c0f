use serde_json::Value;

use crate::{
    auth::password,
    domain::{id::DocId, user::User},
    storage::{collection::Collection, db::DbHandle, error::StorageError, schema::tables},
};

/// CRUD and credential verification over user accounts. Not coupled to the
/// catalog; the HTTP layer leans on it for token issuance.
#[derive(Clone)]
pub struct UserStore {
    docs: Collection<User>,
}

impl UserStore {
    pub fn new(conn: DbHandle) -> Self {
        Self {
            docs: Collection::new(conn, tables::USERS),
        }
    }

    /// Persists a new account. The username must not already exist; the
    /// uniqueness probe treats a lookup miss as the good case and only
    /// propagates real storage faults.
    pub fn create(&self, user: &mut User) -> Result<DocId, StorageError> {
        if self.docs.find_by_field("username", &user.username)?.is_some() {
            return Err(StorageError::UsernameTaken(user.username.clone()));
        }
        self.docs.insert(user)
    }

    pub fn get(&self, id: &DocId) -> Result<User, StorageError> {
        self.docs
            .find(id)?
            .ok_or_else(|| StorageError::UserNotFound(id.to_string()))
    }

    pub fn get_by_username(&self, username: &str) -> Result<User, StorageError> {
        self.docs
            .find_by_field("username", username)?
            .ok_or_else(|| StorageError::UserNotFound(username.to_string()))
    }

    /// Full replace of username and password digest.
    pub fn update(&self, id: &DocId, user: &mut User) -> Result<(), StorageError> {
        if self.docs.replace(id, user)? {
            Ok(())
        } else {
            Err(StorageError::UserNotFound(id.to_string()))
        }
    }

    /// Verifies the old password, then stores a fresh digest of the new
    /// one. Only the `password` field is touched.
    pub fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), StorageError> {
        let user = self.get_by_username(username)?;
        if !password::verify(&user.password, old_password) {
            return Err(StorageError::InvalidCredentials);
        }

        let id = DocId::parse(&user.id)?;
        self.docs
            .set_field(&id, "password", Value::String(password::digest(new_password)))?;
        Ok(())
    }

    pub fn delete(&self, id: &DocId) -> Result<(), StorageError> {
        if self.docs.delete(id)? {
            Ok(())
        } else {
            Err(StorageError::UserNotFound(id.to_string()))
        }
    }

    /// Digest comparison. Unknown username and wrong password are
    /// indistinguishable to the caller.
    pub fn verify_credentials(&self, username: &str, plain: &str) -> Result<User, StorageError> {
        let user = match self.get_by_username(username) {
            Ok(user) => user,
            Err(e) if e.is_not_found() => return Err(StorageError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        if password::verify(&user.password, plain) {
            Ok(user)
        } else {
            Err(StorageError::InvalidCredentials)
        }
    }
}
