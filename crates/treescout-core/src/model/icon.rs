/// Icon-name hints for directory entries.
///
/// The core never renders anything; it only attaches a freedesktop-style
/// icon name to each entry so that frontends can pick a glyph or image.
use super::entry::EntryKind;

pub const ICON_FOLDER: &str = "folder";
pub const ICON_SYMLINK: &str = "emblem-symbolic-link";
pub const ICON_GENERIC: &str = "text-x-generic";

/// Pick an icon name from the entry kind and, for files, the extension.
///
/// Extensions are lowercased into a fixed-size stack buffer; anything longer
/// than 16 bytes gets the generic icon.
pub fn icon_name(name: &str, kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Directory => return ICON_FOLDER,
        EntryKind::Symlink => return ICON_SYMLINK,
        EntryKind::Other => return "application-x-executable",
        EntryKind::File => {}
    }

    let ext = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.as_bytes(),
        _ => return ICON_GENERIC,
    };
    if ext.len() > 16 {
        return ICON_GENERIC;
    }
    let mut lower = [0u8; 16];
    for (dest, &src) in lower.iter_mut().zip(ext) {
        *dest = src.to_ascii_lowercase();
    }
    let Ok(ext) = std::str::from_utf8(&lower[..ext.len()]) else {
        return ICON_GENERIC;
    };

    match ext {
        "doc" | "docx" | "pdf" | "odt" | "rtf" | "xls" | "xlsx" | "ppt" | "pptx" | "epub" => {
            "x-office-document"
        }
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" | "ico" | "tiff" | "tif"
        | "heic" | "heif" => "image-x-generic",
        "mp4" | "mkv" | "avi" | "mov" | "wmv" | "webm" | "m4v" | "mpg" | "mpeg" => {
            "video-x-generic"
        }
        "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" | "opus" => "audio-x-generic",
        "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "zst" | "iso" | "dmg" => {
            "package-x-generic"
        }
        "rs" | "py" | "js" | "ts" | "c" | "cpp" | "h" | "hpp" | "java" | "go" | "rb" | "html"
        | "css" | "json" | "xml" | "yaml" | "yml" | "toml" | "sql" => "text-x-script",
        "sh" | "bat" | "ps1" | "exe" | "msi" | "dll" | "so" | "dylib" | "app" => {
            "application-x-executable"
        }
        _ => ICON_GENERIC,
    }
}
