use crate::kind::LanguageSelection;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub render: Render,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub overwrite: bool,
    pub max_parallel_batches: usize,
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            overwrite: true,
            max_parallel_batches: 1,
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub out_dir: String,
    /// Root for request-scoped temporary directories; empty uses the system temp dir.
    pub work_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            work_dir: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    pub max_input_file_bytes: u64,
    pub max_input_pages: u32,
    pub max_archive_members: usize,
    pub max_member_bytes: u64,
    pub job_timeout_seconds: u64,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_file_bytes: 512 * 1024 * 1024,
            max_input_pages: 5000,
            max_archive_members: 500,
            max_member_bytes: 256 * 1024 * 1024,
            job_timeout_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub language: LanguageSelection,
    pub batch_size: u32,
    pub prefer_text_layer: bool,
    pub dpi: u32,
}
impl Default for Extraction {
    fn default() -> Self {
        Self {
            language: LanguageSelection::Gujarati,
            batch_size: 20,
            prefer_text_layer: true,
            dpi: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Render {
    pub pdftoppm_exe: String,
    pub pdftotext_exe: String,
    pub text_layer_layout: bool,
    pub timeout_seconds: u64,
}
impl Default for Render {
    fn default() -> Self {
        Self {
            pdftoppm_exe: "pdftoppm".into(),
            pdftotext_exe: "pdftotext".into(),
            text_layer_layout: false,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preprocess {
    #[default]
    None,
    GrayscaleBinarize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ocr {
    pub tesseract_exe: String,
    /// Passed as `--tessdata-dir` when non-empty.
    pub tessdata_dir: String,
    pub preprocess: Preprocess,
    /// Page segmentation mode (`--psm`).
    pub psm: u8,
    /// Engine mode (`--oem`).
    pub oem: u8,
    pub timeout_seconds: u64,
    /// Extra `-c key=value` engine variables.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            tesseract_exe: "tesseract".into(),
            tessdata_dir: "".into(),
            preprocess: Preprocess::None,
            psm: 3,
            oem: 3,
            timeout_seconds: 300,
            variables: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub write_result: bool,
    pub write_report_json: bool,
    pub write_index_json: bool,
    pub report_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_result: true,
            write_report_json: true,
            write_index_json: true,
            report_filename: "report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debug {
    pub keep_tool_stderr: bool,
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            keep_tool_stderr: true,
            dump_effective_config: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}
