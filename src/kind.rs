use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Input kinds the orchestrator knows how to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Image,
    WordDocument,
    Archive,
    Unsupported(String),
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];
const WORD_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

impl DocumentKind {
    /// Resolve a declared MIME type, bare extension, or file name.
    ///
    /// MIME types are matched exactly (parameters such as `; charset=` are
    /// ignored); anything else is treated as a path or bare extension.
    pub fn resolve(declared: &str) -> DocumentKind {
        let raw = declared.trim();
        let lowered = raw.to_ascii_lowercase();
        let essence = lowered.split(';').next().unwrap_or("").trim();

        if looks_like_mime(essence) {
            return match essence {
                "application/pdf" | "application/x-pdf" => DocumentKind::Pdf,
                "application/zip" | "application/x-zip-compressed" | "application/x-zip" => {
                    DocumentKind::Archive
                }
                WORD_MIME => DocumentKind::WordDocument,
                m if m.starts_with("image/") => DocumentKind::Image,
                _ => DocumentKind::Unsupported(raw.to_string()),
            };
        }

        let ext = match Path::new(essence).extension() {
            Some(ext) => ext.to_str().unwrap_or(""),
            // bare "pdf" or ".pdf"
            None => essence.trim_start_matches('.'),
        };
        match ext {
            "pdf" => DocumentKind::Pdf,
            "zip" => DocumentKind::Archive,
            "docx" => DocumentKind::WordDocument,
            e if IMAGE_EXTENSIONS.contains(&e) => DocumentKind::Image,
            _ => DocumentKind::Unsupported(raw.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Image => "image",
            DocumentKind::WordDocument => "word-document",
            DocumentKind::Archive => "archive",
            DocumentKind::Unsupported(raw) => raw.as_str(),
        }
    }
}

const MIME_TOP_LEVEL: &[&str] = &[
    "application",
    "audio",
    "font",
    "image",
    "message",
    "model",
    "multipart",
    "text",
    "video",
];

/// `type/subtype` with a registered top-level type; anything else is a path.
fn looks_like_mime(s: &str) -> bool {
    match s.split_once('/') {
        Some((ty, sub)) => MIME_TOP_LEVEL.contains(&ty) && !sub.is_empty() && !sub.contains('/'),
        None => false,
    }
}

/// Recognition language offered to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageSelection {
    #[default]
    #[serde(rename = "gu")]
    Gujarati,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "mixed")]
    Mixed,
}

impl LanguageSelection {
    pub const ALL: [LanguageSelection; 4] = [
        LanguageSelection::Gujarati,
        LanguageSelection::Hindi,
        LanguageSelection::English,
        LanguageSelection::Mixed,
    ];

    /// Tesseract language tag.
    pub fn engine_tag(self) -> &'static str {
        match self {
            LanguageSelection::Gujarati => "guj",
            LanguageSelection::Hindi => "hin",
            LanguageSelection::English => "eng",
            LanguageSelection::Mixed => "eng+hin+guj",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            LanguageSelection::Gujarati => "gu",
            LanguageSelection::Hindi => "hi",
            LanguageSelection::English => "en",
            LanguageSelection::Mixed => "mixed",
        }
    }

    /// Lowercase name used in download filenames.
    pub fn display_name(self) -> &'static str {
        match self {
            LanguageSelection::Gujarati => "gujarati",
            LanguageSelection::Hindi => "hindi",
            LanguageSelection::English => "english",
            LanguageSelection::Mixed => "mixed",
        }
    }
}

impl fmt::Display for LanguageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LanguageSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        LanguageSelection::ALL
            .into_iter()
            .find(|l| l.code() == s || l.display_name() == s || l.engine_tag() == s)
            .ok_or_else(|| format!("unknown language: {s} (expected gu, hi, en or mixed)"))
    }
}

/// Raw upload plus its resolved kind. Immutable for the life of a request.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, declared: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: DocumentKind::resolve(declared),
            bytes,
        }
    }
}
