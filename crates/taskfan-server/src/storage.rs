//! Input file references
//!
//! A reference is either a local path or a `gs://bucket/object` URI. Remote
//! retrieval sits behind [`ObjectStore`]; the only implementation today is
//! [`UnimplementedStore`].

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const REMOTE_SCHEME: &str = "gs://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub bucket: String,
    pub object: String,
}

impl fmt::Display for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", REMOTE_SCHEME, self.bucket, self.object)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReference {
    Local(PathBuf),
    Remote(RemoteObject),
}

impl FileReference {
    pub fn parse(reference: &str) -> Self {
        match reference.strip_prefix(REMOTE_SCHEME) {
            Some(rest) => {
                let (bucket, object) = rest.split_once('/').unwrap_or((rest, ""));
                FileReference::Remote(RemoteObject {
                    bucket: bucket.to_string(),
                    object: object.to_string(),
                })
            },
            None => FileReference::Local(PathBuf::from(reference)),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not Implemented: cannot retrieve {0}")]
    NotImplemented(RemoteObject),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, object: &RemoteObject) -> Result<Vec<u8>, StorageError>;
}

/// Placeholder store; every fetch reports not implemented.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnimplementedStore;

#[async_trait]
impl ObjectStore for UnimplementedStore {
    async fn fetch(&self, object: &RemoteObject) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotImplemented(object.clone()))
    }
}
