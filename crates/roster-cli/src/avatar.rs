//! Avatar file handling
//!
//! Converts image files into the data-URI form the avatar store keeps.
//! Enforces the 5 MB upload limit.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Maximum avatar file size in bytes
pub const MAX_AVATAR_BYTES: u64 = 5 * 1024 * 1024;

/// Read an image file and encode it as a data URI
pub fn data_uri_from_file(path: &Path) -> Result<String> {
    let mime = mime_for_path(path)?;

    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read avatar file: {:?}", path))?;
    if metadata.len() > MAX_AVATAR_BYTES {
        bail!(
            "Avatar file is {} bytes; the limit is {} bytes (5 MB)",
            metadata.len(),
            MAX_AVATAR_BYTES
        );
    }

    let bytes =
        fs::read(path).with_context(|| format!("Failed to read avatar file: {:?}", path))?;

    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Map a file extension to an image MIME type
fn mime_for_path(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "webp" => Ok("image/webp"),
        "svg" => Ok("image/svg+xml"),
        _ => bail!(
            "Unsupported avatar file type: {:?}. Use png, jpg, gif, webp, or svg.",
            path
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_data_uri_from_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("avatar.png");
        fs::write(&path, [0x89, 0x50, 0x4e, 0x47]).unwrap();

        let uri = data_uri_from_file(&path).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_jpeg_extensions() {
        assert_eq!(mime_for_path(&PathBuf::from("a.jpg")).unwrap(), "image/jpeg");
        assert_eq!(mime_for_path(&PathBuf::from("a.JPEG")).unwrap(), "image/jpeg");
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(mime_for_path(&PathBuf::from("a.pdf")).is_err());
        assert!(mime_for_path(&PathBuf::from("noext")).is_err());
    }

    #[test]
    fn test_size_limit() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("big.png");
        let file = fs::File::create(&path).unwrap();
        file.set_len(MAX_AVATAR_BYTES + 1).unwrap();

        let result = data_uri_from_file(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("limit"));
    }
}
