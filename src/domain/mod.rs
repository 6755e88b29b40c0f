pub mod album;
pub mod id;
pub mod track;
pub mod user;

/// Stored documents carry their identifier inside the body.
/// The storage layer reads and rewrites it through this seam.
pub trait Document: serde::Serialize + serde::de::DeserializeOwned {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: &str);
}
