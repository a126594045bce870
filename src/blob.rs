//! Sized byte sources embedded as resource data.

use std::{io::Read, path::Path};

use debug_ignore::DebugIgnore;

/// Opaque resource payload.
///
/// The bytes are read into memory when the blob is created, so a blob stays valid
/// regardless of what happens to its source before the object file is written.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct Blob {
    data: DebugIgnore<Vec<u8>>,
}
impl Blob {
    /// Creates a blob from owned bytes.
    pub fn new(data: Vec<u8>) -> Self { Self { data: data.into() } }

    /// Reads the reader to its end into a new blob.
    ///
    /// # Returns
    /// Returns an error if the reader fails.
    pub fn from_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::new(data))
    }

    /// Reads the file at the path into a new blob.
    ///
    /// # Returns
    /// Returns an error if the file could not be read.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }

    /// Returns the size of the payload in bytes.
    pub fn size(&self) -> u64 { self.data.len() as u64 }

    /// Returns the payload.
    pub fn data(&self) -> &[u8] { &self.data }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Consumes the blob, returning the payload.
    pub fn into_inner(self) -> Vec<u8> { self.data.0 }
}

impl From<Vec<u8>> for Blob {
    fn from(data: Vec<u8>) -> Self { Self::new(data) }
}
impl From<&[u8]> for Blob {
    fn from(data: &[u8]) -> Self { Self::new(data.to_vec()) }
}
impl From<&str> for Blob {
    fn from(data: &str) -> Self { Self::new(data.as_bytes().to_vec()) }
}
impl From<String> for Blob {
    fn from(data: String) -> Self { Self::new(data.into_bytes()) }
}
