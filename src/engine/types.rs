use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pass-through OCR tuning; the adapter never interprets these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParams {
    pub psm: u8,
    pub oem: u8,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl EngineParams {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            psm: cfg.ocr.psm,
            oem: cfg.ocr.oem,
            variables: cfg.ocr.variables.clone(),
        }
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            psm: 3,
            oem: 3,
            variables: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDiag {
    pub exe: String,
    pub available: bool,
    pub version: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocDiag {
    pub tesseract: ToolDiag,
    pub pdftoppm: ToolDiag,
    pub pdftotext: ToolDiag,
    pub installed_languages: Vec<String>,
    /// Language selections whose traineddata is missing.
    pub missing_languages: Vec<String>,
    pub ok: bool,
}
