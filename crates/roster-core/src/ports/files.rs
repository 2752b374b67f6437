use std::path::Path;

use async_trait::async_trait;

use crate::error::FileError;

/// A file picked by the user, fully read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// Asynchronous file reader.
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn read(&self, path: &Path) -> Result<SelectedFile, FileError>;
}
