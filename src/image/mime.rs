use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Identify a supported photo format from its leading bytes.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        _ => None,
    }
}

pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "txt" | "md" => Some("text/plain"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// The media type a file picker would declare for `path`.
///
/// Content wins over the extension; unknown files become `application/octet-stream`.
pub fn declared_media_type(bytes: &[u8], path: &Path) -> &'static str {
    detect_image_mime(bytes)
        .or_else(|| mime_from_extension(path))
        .unwrap_or_else(|| {
            tracing::debug!(
                "Unrecognized file {} (first 4 bytes: {:02X?}), declaring {}",
                path.display(),
                &bytes[..bytes.len().min(4)],
                OCTET_STREAM
            );
            OCTET_STREAM
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_png() {
        assert_eq!(
            detect_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Some("image/png")
        );
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(
            detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some("image/jpeg")
        );
    }

    #[test]
    fn test_detect_webp() {
        assert_eq!(
            detect_image_mime(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            Some("image/webp")
        );
    }

    #[test]
    fn test_detect_gif() {
        assert_eq!(detect_image_mime(b"GIF89a"), Some("image/gif"));
    }

    #[test]
    fn test_unknown_is_none() {
        assert_eq!(detect_image_mime(&[0x00, 0x01, 0x02, 0x03]), None);
        assert_eq!(detect_image_mime(&[]), None);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(
            declared_media_type(b"not really", Path::new("photo.JPG")),
            "image/jpeg"
        );
        assert_eq!(
            declared_media_type(b"notes", Path::new("notes.txt")),
            "text/plain"
        );
    }

    #[test]
    fn test_content_wins_over_extension() {
        assert_eq!(
            declared_media_type(&[0x89, 0x50, 0x4E, 0x47], Path::new("photo.jpg")),
            "image/png"
        );
    }

    #[test]
    fn test_unknown_falls_back_to_octet_stream() {
        assert_eq!(
            declared_media_type(&[0x00, 0x01], Path::new("blob")),
            OCTET_STREAM
        );
    }
}
