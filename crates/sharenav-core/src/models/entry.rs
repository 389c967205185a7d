use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Entry Kind
// =============================================================================

/// Whether a listing item is a file or a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

// =============================================================================
// File Category
// =============================================================================

/// Coarse content classification used for icons and preview galleries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Image,
    Document,
    Text,
    Code,
    Spreadsheet,
    Video,
    Audio,
    Archive,
    Other,
}

impl FileCategory {
    /// Classify by MIME type, falling back to the file extension.
    pub fn classify(name: &str, mime_type: Option<&str>) -> Self {
        mime_type
            .and_then(Self::from_mime)
            .unwrap_or_else(|| Self::from_name(name))
    }

    /// Classify by MIME type alone. Generic types yield `None`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.to_ascii_lowercase();
        let category = match mime.as_str() {
            "application/pdf" | "application/msword" | "application/rtf" => Self::Document,
            "application/json" | "application/xml" | "application/javascript" => Self::Code,
            "application/zip" | "application/x-tar" | "application/gzip"
            | "application/x-7z-compressed" | "application/x-rar-compressed" => Self::Archive,
            "application/vnd.ms-excel" | "text/csv" => Self::Spreadsheet,
            m if m.starts_with("image/") => Self::Image,
            m if m.starts_with("video/") => Self::Video,
            m if m.starts_with("audio/") => Self::Audio,
            m if m.starts_with("text/") => Self::Text,
            m if m.contains("spreadsheetml") => Self::Spreadsheet,
            m if m.contains("wordprocessingml") || m.contains("opendocument.text") => {
                Self::Document
            }
            _ => return None,
        };
        Some(category)
    }

    /// Classify by extension (case-insensitive).
    pub fn from_name(name: &str) -> Self {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return Self::Other;
        };
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" | "avif" | "bmp" | "ico"
            | "tif" | "tiff" | "heic" | "heif" | "psd" => Self::Image,
            "pdf" | "doc" | "docx" | "odt" | "rtf" | "md" | "markdown" => Self::Document,
            "txt" | "log" | "ini" | "cfg" | "conf" => Self::Text,
            "rs" | "py" | "js" | "ts" | "tsx" | "jsx" | "json" | "toml" | "yaml" | "yml"
            | "xml" | "html" | "css" | "sh" | "c" | "h" | "cpp" | "go" | "java" => Self::Code,
            "csv" | "xls" | "xlsx" | "ods" => Self::Spreadsheet,
            "mp4" | "webm" | "mkv" | "mov" | "avi" => Self::Video,
            "mp3" | "wav" | "flac" | "ogg" | "m4a" | "aac" => Self::Audio,
            "zip" | "tar" | "gz" | "tgz" | "7z" | "rar" | "bz2" | "xz" => Self::Archive,
            _ => Self::Other,
        }
    }

    /// Whether a viewer exists for this category.
    pub fn is_previewable(self) -> bool {
        matches!(
            self,
            Self::Image | Self::Document | Self::Text | Self::Code | Self::Video | Self::Audio
        )
    }
}

// =============================================================================
// Entry
// =============================================================================

/// One item of a directory listing.
///
/// `name` is the unique key within its parent and is compared exactly as
/// the remote returned it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    /// Size in bytes; always `None` for directories.
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
    pub readable: bool,
    pub hidden: bool,
    /// MIME type; always `None` for directories.
    pub mime_type: Option<String>,
}

impl Entry {
    /// Build a file entry with default flags.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        Self {
            hidden: name.starts_with('.'),
            name,
            kind: EntryKind::File,
            size: Some(size),
            modified: None,
            readable: true,
            mime_type: None,
        }
    }

    /// Build a directory entry with default flags.
    pub fn directory(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            hidden: name.starts_with('.'),
            name,
            kind: EntryKind::Directory,
            size: None,
            modified: None,
            readable: true,
            mime_type: None,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Content category; `None` for directories.
    pub fn category(&self) -> Option<FileCategory> {
        match self.kind {
            EntryKind::Directory => None,
            EntryKind::File => Some(FileCategory::classify(
                &self.name,
                self.mime_type.as_deref(),
            )),
        }
    }

    /// Previewable category, if the entry can be shown in a viewer.
    pub fn preview_category(&self) -> Option<FileCategory> {
        self.category().filter(|c| c.is_previewable())
    }
}
