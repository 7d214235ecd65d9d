use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use std::io::{BufRead, Write};

pub trait Packable {
    fn serialize(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

/// A storable Git object; `serialize` yields the payload without the frame header
pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    /// The payload prefixed with `<type> <size>\0`
    fn framed(&self) -> Result<Bytes> {
        frame(self.object_type(), &self.serialize()?)
    }

    fn object_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::digest(&self.framed()?))
    }
}

pub fn frame(object_type: ObjectType, payload: &[u8]) -> Result<Bytes> {
    let header = object_type.header(payload.len());

    let mut framed = Vec::with_capacity(header.len() + payload.len());
    framed.write_all(header.as_bytes())?;
    framed.write_all(payload)?;

    Ok(Bytes::from(framed))
}

pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}
