//! Content-addressed object database
//!
//! Each object lives at `objects/<2 hex>/<38 hex>` and holds the zlib-compressed frame
//! `<type> <size>\0<payload>`. Objects are immutable: storing content that is already
//! present is a no-op, so concurrent writers of the same object cannot conflict.

use crate::areas::write_file_atomically;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{Object, ObjectBox, Unpackable, frame};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::errors::RepositoryError;
use anyhow::Context;
use bytes::Bytes;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of a store request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stored {
    /// The object was written to disk
    Written(ObjectId),
    /// An object with the same ID already existed; nothing was written
    Unchanged(ObjectId),
}

impl Stored {
    pub fn oid(&self) -> &ObjectId {
        match self {
            Stored::Written(oid) | Stored::Unchanged(oid) => oid,
        }
    }

    pub fn into_oid(self) -> ObjectId {
        match self {
            Stored::Written(oid) | Stored::Unchanged(oid) => oid,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Stored::Unchanged(_))
    }
}

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Compute the ID an object would be stored under, without writing it
    pub fn hash_only(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        object.object_id()
    }

    pub fn store(&self, object: &impl Object) -> anyhow::Result<Stored> {
        self.store_payload(object.object_type(), &object.serialize()?)
    }

    /// Frame, hash and write a raw payload unless an object with that ID exists
    pub fn store_payload(&self, object_type: ObjectType, payload: &[u8]) -> anyhow::Result<Stored> {
        let framed = frame(object_type, payload)?;
        let object_id = ObjectId::digest(&framed);
        let object_path = self.object_path(&object_id);

        if object_path.exists() {
            debug!(oid = %object_id, kind = %object_type, "object already stored");
            return Ok(Stored::Unchanged(object_id));
        }

        self.write_object(object_path, framed)?;
        debug!(oid = %object_id, kind = %object_type, size = payload.len(), "stored object");

        Ok(Stored::Written(object_id))
    }

    /// Read an object, returning its type and the payload with the frame header stripped
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectType, Bytes)> {
        let object_content = self.read_object(object_id)?;
        let mut object_reader = Cursor::new(object_content);

        let (object_type, size) = ObjectType::parse_header(&mut object_reader)
            .with_context(|| format!("Corrupt object {object_id}"))?;

        let payload_start = object_reader.position() as usize;
        let payload = object_reader.into_inner().slice(payload_start..);
        if payload.len() != size {
            anyhow::bail!(
                "Corrupt object {object_id}: header declares {size} bytes, found {}",
                payload.len()
            );
        }

        Ok((object_type, payload))
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, payload) = self.load(object_id)?;
        let object_reader = payload.as_ref();

        match object_type {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(object_reader)?))),
            ObjectType::Tree => Ok(ObjectBox::Tree(Box::new(Tree::deserialize(object_reader)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(
                object_reader,
            )?))),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        match self.parse_object(object_id)? {
            ObjectBox::Tree(tree) => Ok(Some(*tree)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        match self.parse_object(object_id)? {
            ObjectBox::Commit(commit) => Ok(Some(*commit)),
            _ => Ok(None),
        }
    }

    fn object_path(&self, object_id: &ObjectId) -> PathBuf {
        self.path.join(object_id.to_path())
    }

    fn read_object(&self, object_id: &ObjectId) -> anyhow::Result<Bytes> {
        let object_path = self.object_path(object_id);
        if !object_path.exists() {
            return Err(RepositoryError::ObjectNotFound(object_id.clone()).into());
        }

        let object_content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        Self::decompress(object_content.into())
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> anyhow::Result<()> {
        let object_content = Self::compress(object_content)?;

        // the temp file is renamed into place so readers never see a partial object
        write_file_atomically(&object_path, &object_content)
    }

    fn compress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder
            .write_all(&data)
            .context("Unable to compress object content")?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
            .context("Unable to finish compressing object content")
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::Author;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn objects_dir() -> TempDir {
        TempDir::new().expect("Failed to create temp dir")
    }

    fn database(dir: &TempDir) -> Database {
        Database::new(dir.path().join("objects").into_boxed_path())
    }

    #[rstest]
    fn blob_is_written_under_its_fan_out_path(objects_dir: TempDir) {
        let database = database(&objects_dir);

        let stored = database.store(&Blob::from(b"hello".to_vec())).unwrap();

        let oid = stored.oid().clone();
        assert_eq!(oid.as_ref(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
        assert_eq!(
            database.hash_only(&Blob::from(b"hello".to_vec())).unwrap(),
            oid
        );
        assert!(
            objects_dir
                .path()
                .join("objects/b6/fc4c620b67d95f953a5c1c1230aaab5db5a1b0")
                .is_file()
        );

        let compressed = std::fs::read(objects_dir.path().join("objects").join(oid.to_path()))
            .unwrap();
        let inflated = Database::decompress(compressed.into()).unwrap();
        assert_eq!(inflated.as_ref(), b"blob 5\0hello");
    }

    #[rstest]
    fn storing_twice_writes_once(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let blob = Blob::from(b"same content".to_vec());

        let first = database.store(&blob).unwrap();
        let object_path = objects_dir.path().join("objects").join(first.oid().to_path());
        let modified = std::fs::metadata(&object_path).unwrap().modified().unwrap();

        let second = database.store(&blob).unwrap();

        assert!(matches!(first, Stored::Written(_)));
        assert!(second.is_unchanged());
        assert_eq!(first.oid(), second.oid());
        assert_eq!(
            std::fs::metadata(&object_path).unwrap().modified().unwrap(),
            modified
        );
    }

    #[rstest]
    fn load_strips_the_frame(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let oid = database
            .store_payload(ObjectType::Blob, b"payload bytes")
            .unwrap()
            .into_oid();

        let (object_type, payload) = database.load(&oid).unwrap();

        assert_eq!(object_type, ObjectType::Blob);
        assert_eq!(payload.as_ref(), b"payload bytes");
    }

    #[rstest]
    fn missing_object_is_reported(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let oid = Blob::from(b"never stored".to_vec()).object_id().unwrap();

        let error = database.load(&oid).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<RepositoryError>(),
            Some(RepositoryError::ObjectNotFound(missing)) if *missing == oid
        ));
    }

    #[rstest]
    fn commits_are_parsed_by_type(objects_dir: TempDir) {
        let database = database(&objects_dir);
        let tree_oid = database.store(&Tree::default()).unwrap().into_oid();
        let commit = Commit::new(
            None,
            tree_oid.clone(),
            Author::new("a".to_string(), "a@b.c".to_string()),
            "message".to_string(),
        );
        let commit_oid = database.store(&commit).unwrap().into_oid();

        assert_eq!(database.parse_object_as_commit(&commit_oid).unwrap(), Some(commit));
        assert_eq!(database.parse_object_as_commit(&tree_oid).unwrap(), None);
        assert_eq!(
            database.parse_object_as_tree(&tree_oid).unwrap(),
            Some(Tree::default())
        );
    }
}
