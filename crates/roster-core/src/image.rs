//! Image handling for photo fields: validation, inline data URIs, previews.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::FileError;
use crate::ports::SelectedFile;

/// Largest image accepted inline or for upload.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// What a UI needs to show a thumbnail placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub mime: String,
    pub size: u64,
}

/// `true` if `mime` matches one of the accept patterns (`image/*`, `image/png`).
/// An empty filter accepts any image.
pub fn accepts(accept: &[String], mime: &str) -> bool {
    if accept.is_empty() {
        return mime.starts_with("image/");
    }
    accept.iter().any(|pattern| match pattern.strip_suffix("/*") {
        Some(prefix) => mime
            .split_once('/')
            .map(|(kind, _)| kind.eq_ignore_ascii_case(prefix))
            .unwrap_or(false),
        None => pattern.eq_ignore_ascii_case(mime),
    })
}

/// Validate a file before it is stored inline or uploaded.
pub fn validate(file: &SelectedFile, accept: &[String]) -> Result<(), FileError> {
    if !file.is_image() || !accepts(accept, &file.mime) {
        return Err(FileError::UnsupportedType {
            mime: file.mime.clone(),
        });
    }
    if file.size() > MAX_IMAGE_BYTES {
        return Err(FileError::TooLarge {
            size: file.size(),
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

/// Encode an image as `data:<mime>;base64,<payload>`.
pub fn to_data_uri(file: &SelectedFile, accept: &[String]) -> Result<String, FileError> {
    validate(file, accept)?;
    Ok(format!("data:{};base64,{}", file.mime, STANDARD.encode(&file.bytes)))
}

/// Decode an inline image back into a file, e.g. to upload it.
pub fn from_data_uri(uri: &str, name: &str) -> Option<SelectedFile> {
    let (mime, payload) = split_data_uri(uri)?;
    let bytes = STANDARD.decode(payload).ok()?;
    let extension = mime.rsplit('/').next().unwrap_or("bin");
    Some(SelectedFile::new(format!("{}.{}", name, extension), mime, bytes))
}

/// Preview of an inline image. `None` for URLs and malformed data.
pub fn preview(uri: &str) -> Option<ImagePreview> {
    let (mime, payload) = split_data_uri(uri)?;
    let size = STANDARD.decode(payload).ok()?.len() as u64;
    Some(ImagePreview {
        mime: mime.to_string(),
        size,
    })
}

pub fn is_data_uri(value: &str) -> bool {
    value.starts_with("data:")
}

fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    if mime.is_empty() {
        return None;
    }
    Some((mime, payload))
}

/// Identify common image formats from their magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'B', b'M', ..] => Some("image/bmp"),
        _ => None,
    }
}
