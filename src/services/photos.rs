use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::config::Settings;
use crate::services::classification::ImageInput;
use crate::services::drafts::DraftPhoto;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum PhotoError {
    #[error("Photo is empty")]
    Empty,
    #[error("Photo exceeds {0}MB limit")]
    TooLarge(u64),
    #[error("File must have an extension")]
    MissingExtension,
    #[error("File extension '{0}' is not allowed")]
    ExtensionNotAllowed(String),
    #[error("MIME type '{mime}' does not match extension '.{extension}'")]
    MimeMismatch { mime: String, extension: String },
    #[error("Photo is not valid base64")]
    InvalidEncoding,
    #[error("Unsupported image format")]
    UnknownFormat,
}

/// Validates an uploaded photo and encodes it for inline storage.
pub(crate) fn prepare_upload(
    settings: &Settings,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Result<DraftPhoto, PhotoError> {
    let storage = settings.storage();
    check_size(bytes.len(), storage.max_upload_size_mb)?;

    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or(PhotoError::MissingExtension)?;
    if !storage.allowed_image_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(PhotoError::ExtensionNotAllowed(extension));
    }

    let mime = content_type.trim().to_ascii_lowercase();
    if !mime_allowed_for_extension(&mime, &extension) {
        return Err(PhotoError::MimeMismatch { mime, extension });
    }

    Ok(DraftPhoto {
        base64: STANDARD.encode(bytes),
        mime_type: canonical_mime(&mime).to_string(),
        sha256: hex::encode(Sha256::digest(bytes)),
        size_bytes: bytes.len(),
    })
}

/// Accepts an already-encoded photo (direct submissions); the format is
/// sniffed from the decoded bytes.
pub(crate) fn prepare_inline(settings: &Settings, encoded: &str) -> Result<DraftPhoto, PhotoError> {
    let encoded = encoded.trim();
    let payload = encoded
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, data)| data)
        .unwrap_or(encoded);

    let storage = settings.storage();
    let bytes = STANDARD.decode(payload).map_err(|_| PhotoError::InvalidEncoding)?;
    check_size(bytes.len(), storage.max_upload_size_mb)?;
    let mime = sniff_mime(&bytes).ok_or(PhotoError::UnknownFormat)?;

    let allowed = storage
        .allowed_image_extensions
        .iter()
        .any(|extension| mime_allowed_for_extension(mime, extension));
    if !allowed {
        return Err(PhotoError::ExtensionNotAllowed(extension_for_mime(mime).to_string()));
    }

    Ok(DraftPhoto {
        base64: STANDARD.encode(&bytes),
        mime_type: mime.to_string(),
        sha256: hex::encode(Sha256::digest(&bytes)),
        size_bytes: bytes.len(),
    })
}

pub(crate) fn image_input(photo: &DraftPhoto) -> ImageInput {
    ImageInput { base64: photo.base64.clone(), mime_type: photo.mime_type.clone() }
}

fn check_size(len: usize, max_mb: u64) -> Result<(), PhotoError> {
    if len == 0 {
        return Err(PhotoError::Empty);
    }
    if len as u64 > max_mb.saturating_mul(1024 * 1024) {
        return Err(PhotoError::TooLarge(max_mb));
    }
    Ok(())
}

fn mime_allowed_for_extension(mime: &str, extension: &str) -> bool {
    match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        "webp" => mime == "image/webp",
        _ => false,
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

fn canonical_mime(mime: &str) -> &str {
    if mime == "image/jpg" {
        "image/jpeg"
    } else {
        mime
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    async fn settings() -> Settings {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        Settings::load().expect("settings")
    }

    #[tokio::test]
    async fn upload_is_encoded_and_hashed() {
        let settings = settings().await;

        let photo = prepare_upload(&settings, "leak.PNG", "image/png", PNG_HEADER).unwrap();

        assert_eq!(photo.mime_type, "image/png");
        assert_eq!(photo.size_bytes, PNG_HEADER.len());
        assert_eq!(STANDARD.decode(&photo.base64).unwrap(), PNG_HEADER);
        assert_eq!(photo.sha256.len(), 64);
    }

    #[tokio::test]
    async fn upload_rejects_bad_type_and_empty_body() {
        let settings = settings().await;

        assert_eq!(
            prepare_upload(&settings, "notes.gif", "image/gif", PNG_HEADER).unwrap_err(),
            PhotoError::ExtensionNotAllowed("gif".to_string())
        );
        assert!(matches!(
            prepare_upload(&settings, "leak.jpg", "image/png", PNG_HEADER),
            Err(PhotoError::MimeMismatch { .. })
        ));
        assert_eq!(
            prepare_upload(&settings, "leak.jpg", "image/jpeg", &[]).unwrap_err(),
            PhotoError::Empty
        );
        assert_eq!(
            prepare_upload(&settings, "leak", "image/jpeg", PNG_HEADER).unwrap_err(),
            PhotoError::MissingExtension
        );
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let settings = settings().await;
        let big = vec![0u8; 5 * 1024 * 1024 + 1];

        assert_eq!(
            prepare_upload(&settings, "big.jpg", "image/jpeg", &big).unwrap_err(),
            PhotoError::TooLarge(5)
        );
    }

    #[tokio::test]
    async fn inline_photo_accepts_data_url_and_sniffs_format() {
        let settings = settings().await;
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(PNG_HEADER));

        let photo = prepare_inline(&settings, &data_url).unwrap();

        assert_eq!(photo.mime_type, "image/png");
        assert_eq!(image_input(&photo).data_url(), data_url);
        assert_eq!(prepare_inline(&settings, "%%%").unwrap_err(), PhotoError::InvalidEncoding);
        assert_eq!(
            prepare_inline(&settings, &STANDARD.encode(b"plain text")).unwrap_err(),
            PhotoError::UnknownFormat
        );
    }

    #[tokio::test]
    async fn inline_photo_respects_allowed_extensions() {
        let settings = settings().await;
        let mut webp = b"RIFF\0\0\0\0WEBPVP8 ".to_vec();
        webp.extend_from_slice(&[0u8; 16]);

        assert_eq!(
            prepare_inline(&settings, &STANDARD.encode(&webp)).unwrap_err(),
            PhotoError::ExtensionNotAllowed("webp".to_string())
        );
        assert!(prepare_inline(&settings, &STANDARD.encode(PNG_HEADER)).is_ok());
    }
}
