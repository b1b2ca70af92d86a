//! Media library upload rules.

use std::io::Cursor;

use serde::Serialize;
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::DbId;

/// Largest accepted upload (25 MiB).
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Longest stored original file name.
pub const MAX_FILE_NAME_LEN: usize = 120;

/// Longest alt text.
pub const MAX_ALT_TEXT_LEN: usize = 300;

/// Broad category of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Document,
    Archive,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Archive => "archive",
        }
    }
}

/// Accepted extensions with their canonical content type and kind.
const ALLOWED_TYPES: &[(&str, &str, MediaKind)] = &[
    ("png", "image/png", MediaKind::Image),
    ("jpg", "image/jpeg", MediaKind::Image),
    ("jpeg", "image/jpeg", MediaKind::Image),
    ("webp", "image/webp", MediaKind::Image),
    ("gif", "image/gif", MediaKind::Image),
    ("svg", "image/svg+xml", MediaKind::Image),
    ("mp4", "video/mp4", MediaKind::Video),
    ("webm", "video/webm", MediaKind::Video),
    ("pdf", "application/pdf", MediaKind::Document),
    ("zip", "application/zip", MediaKind::Archive),
];

/// Classification of an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub extension: &'static str,
    pub content_type: &'static str,
    pub kind: MediaKind,
}

/// Look up an upload by its file name's extension.
pub fn classify(file_name: &str) -> Result<MediaType, CoreError> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    ALLOWED_TYPES
        .iter()
        .find(|(allowed, _, _)| *allowed == ext)
        .map(|&(extension, content_type, kind)| MediaType {
            extension,
            content_type,
            kind,
        })
        .ok_or_else(|| {
            let allowed: Vec<&str> = ALLOWED_TYPES.iter().map(|(e, _, _)| *e).collect();
            CoreError::Validation(format!(
                "Dateityp '.{ext}' wird nicht unterstützt. Erlaubt: {}",
                allowed.join(", ")
            ))
        })
}

pub fn validate_size(len: usize) -> Result<(), CoreError> {
    if len == 0 {
        return Err(CoreError::Validation("Die Datei ist leer".to_string()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "Die Datei ist zu groß (maximal {} MB)",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

pub fn validate_alt_text(alt: &str) -> Result<(), CoreError> {
    if alt.chars().count() > MAX_ALT_TEXT_LEN {
        return Err(CoreError::Validation(format!(
            "Alternativtext darf höchstens {MAX_ALT_TEXT_LEN} Zeichen lang sein"
        )));
    }
    Ok(())
}

/// Strip directories and unsafe characters from a client-supplied file name.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        return "datei".to_string();
    }
    if trimmed.chars().count() <= MAX_FILE_NAME_LEN {
        return trimmed.to_string();
    }

    // Shorten the stem so the extension survives.
    match trimmed.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.chars().count() < MAX_FILE_NAME_LEN / 2 => {
            let keep = MAX_FILE_NAME_LEN - ext.chars().count() - 1;
            let stem: String = stem.chars().take(keep).collect();
            format!("{stem}.{ext}")
        }
        _ => trimmed.chars().take(MAX_FILE_NAME_LEN).collect(),
    }
}

/// Object-storage key for a user's upload.
pub fn storage_key(owner_id: DbId, extension: &str) -> String {
    format!("media/{owner_id}/{}.{extension}", Uuid::new_v4())
}

/// Read pixel dimensions from an image header without decoding the pixels.
///
/// Returns `None` for formats the decoder does not know (e.g. SVG) or for
/// corrupt headers.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
