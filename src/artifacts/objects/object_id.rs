//! Git object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character lowercase hexadecimal strings representing SHA-1 hashes.
//! Inside tree objects and index entries they are stored as 20 raw bytes.
//!
//! Objects are stored in `.git/objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{OBJECT_ID_BYTES, OBJECT_ID_LENGTH};
use sha1::{Digest, Sha1};
use std::io;
use std::path::PathBuf;

/// Git object identifier (SHA-1 hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a 40-character hexadecimal string
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Hash the given bytes with SHA-1
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Write the object ID in binary format (20 bytes)
    pub fn write_h40_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Read an object ID from binary format (20 bytes)
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut buffer = [0u8; OBJECT_ID_BYTES];
        reader.read_exact(&mut buffer)?;

        Ok(Self::from_bytes(&buffer))
    }

    pub fn from_bytes(bytes: &[u8; OBJECT_ID_BYTES]) -> Self {
        let hex40 = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
        Self(hex40)
    }

    pub fn to_bytes(&self) -> anyhow::Result<[u8; OBJECT_ID_BYTES]> {
        let mut bytes = [0u8; OBJECT_ID_BYTES];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = self
                .0
                .get(2 * i..2 * i + 2)
                .ok_or_else(|| anyhow::anyhow!("Invalid object ID length: {}", self.0.len()))?;
            *byte = u8::from_str_radix(pair, 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid hex digit"))?;
        }

        Ok(bytes)
    }

    /// Convert to file system path for object storage
    ///
    /// `abc123...` becomes `ab/c123...`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hash
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("ce013625030ba8dba906f756967f9e9ca394464a")]
    #[case("0000000000000000000000000000000000000000")]
    fn binary_form_preserves_the_hex_digest(#[case] hex: &str) {
        let oid = ObjectId::try_parse(hex.to_string()).unwrap();

        let mut raw = Vec::new();
        oid.write_h40_to(&mut raw).unwrap();
        assert_eq!(raw.len(), OBJECT_ID_BYTES);

        let parsed = ObjectId::read_h40_from(&mut raw.as_slice()).unwrap();
        assert_eq!(parsed, oid);
    }

    #[rstest]
    #[case("abc")]
    #[case("zz013625030ba8dba906f756967f9e9ca394464a")]
    fn rejects_malformed_ids(#[case] hex: &str) {
        assert!(ObjectId::try_parse(hex.to_string()).is_err());
    }

    #[test]
    fn short_ids_fail_to_encode() {
        assert!(ObjectId(String::new()).to_bytes().is_err());
        assert!(ObjectId("ce01".to_string()).to_bytes().is_err());
    }

    #[test]
    fn uppercase_ids_are_normalized() {
        let oid = ObjectId::try_parse("CE013625030BA8DBA906F756967F9E9CA394464A".to_string())
            .unwrap();
        assert_eq!(oid.as_ref(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn object_path_splits_after_two_characters() {
        let oid = ObjectId::try_parse("ce013625030ba8dba906f756967f9e9ca394464a".to_string())
            .unwrap();
        assert_eq!(
            oid.to_path(),
            PathBuf::from("ce").join("013625030ba8dba906f756967f9e9ca394464a")
        );
        assert_eq!(oid.to_short_oid(), "ce01362");
    }
}
