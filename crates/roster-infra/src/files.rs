//! Local filesystem [`FileSource`].

use std::path::Path;

use async_trait::async_trait;

use roster_core::FileError;
use roster_core::image::sniff_mime;
use roster_core::ports::{FileSource, SelectedFile};

/// Reads files from disk. The MIME type comes from the file's magic bytes,
/// falling back to its extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSource;

#[async_trait]
impl FileSource for LocalFileSource {
    async fn read(&self, path: &Path) -> Result<SelectedFile, FileError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FileError::Read(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = sniff_mime(&bytes)
            .or_else(|| mime_from_extension(path))
            .unwrap_or("application/octet-stream");

        tracing::debug!(path = %path.display(), mime, size = bytes.len(), "File read");
        Ok(SelectedFile::new(name, mime, bytes))
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    fn scratch_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn test_sniffs_content_over_extension() {
        let dir = TempDir::new().unwrap();
        let path = scratch_file(&dir, "photo.txt", &[0x89, b'P', b'N', b'G', 0, 0]);

        let file = LocalFileSource.read(&path).await.unwrap();

        assert_eq!(file.name, "photo.txt");
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.size(), 6);
    }

    #[tokio::test]
    async fn test_falls_back_to_extension() {
        let dir = TempDir::new().unwrap();
        let path = scratch_file(&dir, "notes.CSV", b"id,name\n");
        assert_eq!(LocalFileSource.read(&path).await.unwrap().mime, "text/csv");

        let path = scratch_file(&dir, "blob.xyz", b"???");
        assert_eq!(
            LocalFileSource.read(&path).await.unwrap().mime,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let err = LocalFileSource
            .read(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Read(_)));
    }
}
