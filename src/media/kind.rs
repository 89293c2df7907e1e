use std::path::Path;

use crate::error::AppError;

const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/x-wav",
    "audio/aac",
    "audio/mp4",
    "audio/flac",
    "audio/alac",
    "audio/aiff",
    "audio/x-aiff",
    "audio/ogg",
    "audio/x-ms-wma",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "aac", "m4a", "flac", "alac", "aiff", "aif", "ogg", "wma",
];

const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
    "image/tiff",
    "image/svg+xml",
    "image/vnd.microsoft.icon",
    "image/avif",
    "image/heic",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "svg", "ico", "avif", "heic",
];

/// Media family of an upload. Decides the allow-list and the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Audio, MediaKind::Image];

    /// Directory name under the media root, also the URL segment under `/public`.
    pub fn dir(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
        }
    }

    fn mime_types(self) -> &'static [&'static str] {
        match self {
            MediaKind::Audio => AUDIO_MIME_TYPES,
            MediaKind::Image => IMAGE_MIME_TYPES,
        }
    }

    fn extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Audio => AUDIO_EXTENSIONS,
            MediaKind::Image => IMAGE_EXTENSIONS,
        }
    }

    /// Checks the declared content type and the file name extension against
    /// the allow-lists and returns the lower-cased extension to store under.
    pub fn validate(
        self,
        content_type: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<String, AppError> {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !self.mime_types().contains(&essence.as_str()) {
            return Err(AppError::UnsupportedMediaType(format!(
                "Unsupported {} content type: {:?}",
                self.dir(),
                essence
            )));
        }

        let ext = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !self.extensions().contains(&ext.as_str()) {
            return Err(AppError::UnsupportedMediaType(format!(
                "Unsupported {} file extension: {:?}",
                self.dir(),
                ext
            )));
        }
        Ok(ext)
    }
}
