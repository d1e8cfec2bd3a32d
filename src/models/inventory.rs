use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "rtf", "odt", "xlsx", "pptx",
];
const SHORTCUT_EXTENSIONS: &[&str] = &["lnk", "url"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz"];
const APPLICATION_EXTENSIONS: &[&str] = &["exe", "msi", "app", "dmg", "pkg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Document,
    Shortcut,
    Audio,
    Archive,
    Application,
    Folder,
    Other,
    Unknown,
}

impl FileCategory {
    /// Category for a file extension (without the leading dot). An empty
    /// extension means the file cannot be classified at all.
    pub fn from_extension(extension: &str) -> Self {
        if extension.is_empty() {
            return Self::Unknown;
        }
        let ext = extension.to_lowercase();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            Self::Document
        } else if SHORTCUT_EXTENSIONS.contains(&ext) {
            Self::Shortcut
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Self::Audio
        } else if ARCHIVE_EXTENSIONS.contains(&ext) {
            Self::Archive
        } else if APPLICATION_EXTENSIONS.contains(&ext) {
            Self::Application
        } else {
            Self::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Shortcut => "shortcut",
            Self::Audio => "audio",
            Self::Archive => "archive",
            Self::Application => "application",
            Self::Folder => "folder",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One immediate child of the organizing root, as produced by a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub relative_path: String,
    pub extension: String,
    pub category: FileCategory,
    pub is_folder: bool,
}
