//! # Media Classification Module
//!
//! Questo modulo classifica i file in base all'estensione (video, audio,
//! immagine) e associa le estensioni audio al codec ffmpeg da usare in
//! estrazione.
//!
//! ## Note:
//! - Il confronto è case-insensitive (`A.MP4` e `a.mp4` sono entrambi video)
//! - Alcune estensioni compaiono in più insiemi (`.ogg`, `.m4p`, `.mp2`, `.rm`):
//!   `classify` applica la precedenza Video > Audio > Immagine, mentre
//!   `MediaKind::accepts` verifica la semplice appartenenza all'insieme
//! - L'estrazione audio è permessa solo verso estensioni presenti nella
//!   tabella dei codec, anche se l'estensione è un audio riconosciuto

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "m4p", "mov", "qt", "avi", "wmv", "asf", "flv", "f4v", "f4p", "f4a", "f4b",
    "webm", "mkv", "mpg", "mpeg", "mp2", "mpe", "mpv", "vob", "dvd", "3gp", "3g2", "svi", "mxf",
    "ogv", "ogg", "amv", "rm", "roq", "nsv", "yuv", "gifv", "mng", "rrc", "mod", "dv",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "aac", "m4a", "m4b", "m4p", "wav", "flac", "alac", "ogg", "oga", "opus", "wma", "aiff",
    "aif", "ape", "wv", "amr", "awb", "au", "ra", "rm", "mp2", "mp1", "ac3", "dts", "caf", "voc",
    "tta", "mka", "spx", "8svx", "gsm", "ivs", "sln", "vox", "rf64", "msv", "dvf", "act", "dss",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "jfif", "pjpeg", "pjp", "png", "gif", "bmp", "webp", "avif", "apng",
    "tif", "tiff", "heif", "heic", "ico", "cur", "xbm", "svg", "svgz",
];

/// Audio output extension -> ffmpeg encoder
const AUDIO_CODECS: &[(&str, &str)] = &[
    ("mp3", "libmp3lame"),
    ("flac", "flac"),
    ("wav", "pcm_s16le"),
    ("aac", "aac"),
    ("m4a", "aac"),
    ("alac", "alac"),
    ("ogg", "libvorbis"),
    ("opus", "libopus"),
    ("wma", "wmav2"),
    ("amr", "libopencore_amrnb"),
    ("aiff", "pcm_s16be"),
    ("au", "pcm_mulaw"),
    ("ac3", "ac3"),
    ("dts", "dca"),
    ("wv", "wavpack"),
    ("tta", "tta"),
    ("mp2", "mp2"),
    ("caf", "pcm_s16le"),
];

/// Kind of media a path refers to, judged by extension only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Unknown,
}

impl MediaKind {
    /// Classify a path by its (case-insensitive) extension
    pub fn classify(path: &Path) -> Self {
        let Some(ext) = extension_of(path) else {
            return Self::Unknown;
        };

        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Audio
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else {
            Self::Unknown
        }
    }

    /// Whether `path` is acceptable where a file of this kind is required
    pub fn accepts(self, path: &Path) -> bool {
        let Some(ext) = extension_of(path) else {
            return false;
        };
        let set = match self {
            Self::Video => VIDEO_EXTENSIONS,
            Self::Audio => AUDIO_EXTENSIONS,
            Self::Image => IMAGE_EXTENSIONS,
            Self::Unknown => return false,
        };
        set.contains(&ext.as_str())
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Encoder for an audio output extension (with or without the leading dot)
pub fn audio_codec_for(extension: &str) -> Option<&'static str> {
    let ext = extension.trim_start_matches('.').to_lowercase();
    AUDIO_CODECS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, codec)| *codec)
}

/// Lower-cased extension without the dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// A path plus its classification, resolved on first use
#[derive(Debug, Clone)]
pub struct MediaFile {
    path: PathBuf,
    kind: OnceLock<MediaKind>,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        *self.kind.get_or_init(|| MediaKind::classify(&self.path))
    }

    /// Whether the file may fill a role requiring `kind`; shared extensions
    /// fit more than one role even though `kind()` reports only one
    pub fn fits(&self, kind: MediaKind) -> bool {
        kind.accepts(&self.path)
    }

    /// Lower-cased extension, with the JPEG aliases folded into `jpg`
    pub fn format(&self) -> Option<String> {
        extension_of(&self.path).map(|ext| match ext.as_str() {
            "jpeg" | "jpe" | "jfif" | "pjpeg" | "pjp" => "jpg".to_string(),
            _ => ext,
        })
    }
}
