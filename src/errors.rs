//! Errors specific to building resource sections, version information and object files.

use std::io::Error as IOError;

/// Error that can occur when reading and parsing bytes.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ReadError(pub String);

/// Errors that can occur when decoding an icon file.
#[derive(Debug, thiserror::Error)]
pub enum IconReadError {
    #[error("invalid bytes: {0}")]
    InvalidBytes(ReadError),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<ReadError> for IconReadError {
    fn from(error: ReadError) -> Self { IconReadError::InvalidBytes(error) }
}
impl From<IOError> for IconReadError {
    fn from(error: IOError) -> Self { IconReadError::IOError(error) }
}

/// Errors that can occur when building version information.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("invalid version string: {0}")]
    FormatError(String),
    #[error("{0} node too large: {1} bytes")]
    NodeTooLarge(String, usize),
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<IOError> for VersionError {
    fn from(error: IOError) -> Self { VersionError::IOError(error) }
}

/// Errors that can occur when modifying or serializing resource data.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("duplicate entry: {0}")]
    DuplicateEntry(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("too many directory entries: {0}")]
    TooManyEntries(usize),
    #[error("resource section too large: {0} bytes")]
    ResourceTooLarge(u64),
    #[error("no free resource id at or above {0}")]
    IDSpaceExhausted(u16),
    #[error("invalid icon: {0}")]
    InvalidIcon(IconReadError),
    #[error("invalid version info: {0}")]
    InvalidVersionInfo(VersionError),
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<IconReadError> for ResourceError {
    fn from(error: IconReadError) -> Self { ResourceError::InvalidIcon(error) }
}
impl From<VersionError> for ResourceError {
    fn from(error: VersionError) -> Self { ResourceError::InvalidVersionInfo(error) }
}
impl From<IOError> for ResourceError {
    fn from(error: IOError) -> Self { ResourceError::IOError(error) }
}

/// Errors that can occur when assembling or writing an object file.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("duplicate section name: {0}")]
    DuplicateSectionName(String),
    #[error("section not found: {0}")]
    SectionNotFound(String),
    #[error("invalid section name: {0:?}")]
    InvalidSectionName(String),
    #[error("too many sections: {0}")]
    TooManySections(usize),
    #[error("too many relocations in section {0}: {1}")]
    TooManyRelocations(String, usize),
    #[error("object file too large: {0} bytes")]
    FileTooLarge(u64),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("resource error: {0}")]
    Resource(ResourceError),
    #[error("io error: {0}")]
    IOError(IOError),
}
impl From<ResourceError> for ObjectError {
    fn from(error: ResourceError) -> Self {
        match error {
            ResourceError::IOError(error) => ObjectError::IOError(error),
            error => ObjectError::Resource(error),
        }
    }
}
impl From<IOError> for ObjectError {
    fn from(error: IOError) -> Self { ObjectError::IOError(error) }
}
