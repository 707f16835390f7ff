use super::{process::run_tool, EngineParams, OcrEngine};
use crate::{config::Config, util::scratch_dir};
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::ffi::OsString;
use tracing::debug;

/// OCR through the `tesseract` command line.
pub struct TesseractEngine {
    exe: String,
    tessdata_dir: String,
    work_dir: String,
    timeout_seconds: u64,
    keep_stderr: bool,
}

impl TesseractEngine {
    pub fn new(cfg: &Config) -> Self {
        Self {
            exe: cfg.ocr.tesseract_exe.clone(),
            tessdata_dir: cfg.ocr.tessdata_dir.clone(),
            work_dir: cfg.paths.work_dir.clone(),
            timeout_seconds: cfg.ocr.timeout_seconds,
            keep_stderr: cfg.debug.keep_tool_stderr,
        }
    }

    /// Languages with installed traineddata, as reported by `--list-langs`.
    pub fn installed_languages(&self) -> Result<Vec<String>> {
        let mut args: Vec<OsString> = Vec::new();
        if !self.tessdata_dir.is_empty() {
            args.push("--tessdata-dir".into());
            args.push(self.tessdata_dir.clone().into());
        }
        args.push("--list-langs".into());
        let out = run_tool(&self.exe, &args, 30, self.keep_stderr)?;
        Ok(parse_language_list(&String::from_utf8_lossy(&out.stdout)))
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(
        &self,
        image: &DynamicImage,
        language_tag: &str,
        params: &EngineParams,
    ) -> Result<String> {
        let dir = scratch_dir(&self.work_dir, "ocr-").with_context(|| "creating ocr scratch dir")?;
        let input = dir.path().join("page.png");
        image
            .save_with_format(&input, ImageFormat::Png)
            .with_context(|| format!("writing {}", input.display()))?;

        let mut args: Vec<OsString> = Vec::new();
        if !self.tessdata_dir.is_empty() {
            args.push("--tessdata-dir".into());
            args.push(self.tessdata_dir.clone().into());
        }
        args.push(input.into());
        args.push("stdout".into());
        args.push("-l".into());
        args.push(language_tag.into());
        args.push("--psm".into());
        args.push(params.psm.to_string().into());
        args.push("--oem".into());
        args.push(params.oem.to_string().into());
        for (k, v) in &params.variables {
            args.push("-c".into());
            args.push(format!("{k}={v}").into());
        }

        let out = run_tool(&self.exe, &args, self.timeout_seconds, self.keep_stderr)?;
        let text = String::from_utf8_lossy(&out.stdout);
        // tesseract terminates each page with a form feed
        let text = text.trim_end_matches('\u{000C}').to_string();
        debug!(lang = language_tag, chars = text.chars().count(), "recognized");
        Ok(text)
    }
}

pub fn parse_language_list(raw: &str) -> Vec<String> {
    raw.lines()
        .skip_while(|l| !l.trim_start().starts_with("List of available languages"))
        .skip(1)
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.contains(char::is_whitespace))
        .map(str::to_string)
        .collect()
}
