//! Centralized icon definitions.
//!
//! Icon theme is configured in `config.rs` via `ICON_THEME`.
//! This module maps semantic icon names to the selected theme's icons.

use icondata::Icon;
use sharenav_core::{Entry, FileCategory};

use crate::config::IconTheme;

// =============================================================================
// Theme Imports
// =============================================================================

mod lucide {
    pub use icondata::{
        LuArchive as FileArchive, LuBookOpen as FileDocument, LuChevronLeft as ChevronLeft,
        LuChevronRight as ChevronRight, LuCode as FileCode, LuExternalLink as ExternalLink,
        LuFile as File, LuFileText as FileText, LuFilm as FileVideo, LuFolder as Folder,
        LuHouse as Home, LuImage as FileImage, LuLock as Lock, LuMusic as FileAudio,
        LuRefreshCw as Refresh, LuServer as Server, LuSheet as FileSpreadsheet,
        LuTriangleAlert as Warning, LuWifiOff as Offline, LuX as Close,
    };
}

mod bootstrap {
    pub use icondata::{
        BsArrowClockwise as Refresh, BsBoxArrowUpRight as ExternalLink,
        BsChevronLeft as ChevronLeft, BsChevronRight as ChevronRight,
        BsExclamationTriangle as Warning, BsFileEarmark as File, BsFileEarmarkCode as FileCode,
        BsFileEarmarkImage as FileImage, BsFileEarmarkMusic as FileAudio,
        BsFileEarmarkPdf as FileDocument, BsFileEarmarkPlay as FileVideo,
        BsFileEarmarkSpreadsheet as FileSpreadsheet, BsFileEarmarkText as FileText,
        BsFileEarmarkZip as FileArchive, BsFolderFill as Folder, BsHddNetwork as Server,
        BsHouseFill as Home, BsLockFill as Lock, BsWifiOff as Offline, BsXLg as Close,
    };
}

// =============================================================================
// Icon Constants (selected based on theme)
// =============================================================================

macro_rules! themed_icon {
    ($name:ident, $theme_name:ident) => {
        pub const $name: Icon = match crate::config::ICON_THEME {
            IconTheme::Lucide => lucide::$theme_name,
            IconTheme::Bootstrap => bootstrap::$theme_name,
        };
    };
}

themed_icon!(CHEVRON_LEFT, ChevronLeft);
themed_icon!(CHEVRON_RIGHT, ChevronRight);
themed_icon!(HOME, Home);
themed_icon!(SERVER, Server);
themed_icon!(FOLDER, Folder);
themed_icon!(FILE, File);
themed_icon!(FILE_TEXT, FileText);
themed_icon!(FILE_DOCUMENT, FileDocument);
themed_icon!(FILE_IMAGE, FileImage);
themed_icon!(FILE_CODE, FileCode);
themed_icon!(FILE_SPREADSHEET, FileSpreadsheet);
themed_icon!(FILE_VIDEO, FileVideo);
themed_icon!(FILE_AUDIO, FileAudio);
themed_icon!(FILE_ARCHIVE, FileArchive);
themed_icon!(LOCK, Lock);
themed_icon!(CLOSE, Close);
themed_icon!(EXTERNAL_LINK, ExternalLink);
themed_icon!(REFRESH, Refresh);
themed_icon!(WARNING, Warning);
themed_icon!(OFFLINE, Offline);

/// Icon for a listing entry.
pub fn for_entry(entry: &Entry) -> Icon {
    if entry.is_dir() {
        return FOLDER;
    }
    match entry.category() {
        Some(FileCategory::Image) => FILE_IMAGE,
        Some(FileCategory::Document) => FILE_DOCUMENT,
        Some(FileCategory::Text) => FILE_TEXT,
        Some(FileCategory::Code) => FILE_CODE,
        Some(FileCategory::Spreadsheet) => FILE_SPREADSHEET,
        Some(FileCategory::Video) => FILE_VIDEO,
        Some(FileCategory::Audio) => FILE_AUDIO,
        Some(FileCategory::Archive) => FILE_ARCHIVE,
        Some(FileCategory::Other) | None => FILE,
    }
}
