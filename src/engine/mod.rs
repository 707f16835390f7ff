pub mod poppler;
pub mod process;
pub mod tesseract;
pub mod types;

use crate::pdf::PageHandle;
use anyhow::Result;
use image::DynamicImage;

pub use types::{DocDiag, EngineParams, ToolDiag};

/// Renders a page to a bitmap.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, page: &PageHandle<'_>, dpi: u32) -> Result<DynamicImage>;
}

/// Reads a page's embedded text without rendering it.
pub trait TextLayerReader: Send + Sync {
    fn text_layer(&self, page: &PageHandle<'_>) -> Result<String>;
}

/// Everything the PDF pipeline needs from a document backend.
pub trait PdfBackend: PageRasterizer + TextLayerReader {}

impl<T: PageRasterizer + TextLayerReader> PdfBackend for T {}

/// The external OCR capability: bitmap plus language tag in, text out.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage, language_tag: &str, params: &EngineParams)
        -> Result<String>;
}

/// Check the external tools the default backends shell out to.
pub fn doctor(cfg: &crate::config::Config) -> DocDiag {
    let tesseract = probe_tool(&cfg.ocr.tesseract_exe, "--version");
    let pdftoppm = probe_tool(&cfg.render.pdftoppm_exe, "-v");
    let pdftotext = probe_tool(&cfg.render.pdftotext_exe, "-v");

    let installed_languages = if tesseract.available {
        tesseract::TesseractEngine::new(cfg)
            .installed_languages()
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let missing_languages: Vec<String> = crate::kind::LanguageSelection::ALL
        .into_iter()
        .filter(|lang| {
            !lang
                .engine_tag()
                .split('+')
                .all(|tag| installed_languages.iter().any(|l| l == tag))
        })
        .map(|lang| lang.code().to_string())
        .collect();

    let ok = tesseract.available
        && pdftoppm.available
        && pdftotext.available
        && missing_languages.is_empty();

    DocDiag {
        tesseract,
        pdftoppm,
        pdftotext,
        installed_languages,
        missing_languages,
        ok,
    }
}

fn probe_tool(exe: &str, flag: &str) -> ToolDiag {
    match process::tool_banner(exe, flag) {
        Ok(banner) => ToolDiag {
            exe: exe.to_string(),
            available: true,
            version: parse_version(&banner),
            error: None,
        },
        Err(err) => ToolDiag {
            exe: exe.to_string(),
            available: false,
            version: None,
            error: Some(format!("{err:#}")),
        },
    }
}

/// First dotted version number in a tool's banner.
pub fn parse_version(banner: &str) -> Option<String> {
    let re = regex::Regex::new(r"(?i)\bv?(\d+(?:\.\d+)+)").ok()?;
    re.captures(banner).map(|c| c[1].to_string())
}
