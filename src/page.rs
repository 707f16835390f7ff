use crate::{
    engine::{OcrEngine, PdfBackend},
    error::{ExtractError, Result},
    kind::LanguageSelection,
    pdf::PageHandle,
    recognize::RecognitionAdapter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    TextLayer,
    Ocr,
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub page_index: u32,
    pub text: String,
    pub source: PageSource,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Chooses, page by page, between the embedded text layer and OCR.
pub struct PageExtractor<'a, B: PdfBackend, E: OcrEngine> {
    backend: &'a B,
    recognizer: &'a RecognitionAdapter<E>,
}

impl<'a, B: PdfBackend, E: OcrEngine> PageExtractor<'a, B, E> {
    pub fn new(backend: &'a B, recognizer: &'a RecognitionAdapter<E>) -> Self {
        Self {
            backend,
            recognizer,
        }
    }

    pub fn extract(
        &self,
        page: &PageHandle<'_>,
        language: LanguageSelection,
        prefer_text_layer: bool,
        dpi: u32,
    ) -> Result<PageResult> {
        if prefer_text_layer {
            match self.backend.text_layer(page) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(page = page.number(), "text layer");
                    return Ok(PageResult {
                        page_index: page.index(),
                        text,
                        source: PageSource::TextLayer,
                        warning: None,
                    });
                }
                Ok(_) => {}
                Err(err) => debug!(page = page.number(), "text layer unavailable: {err:#}"),
            }
        }

        let bitmap = self
            .backend
            .rasterize(page, dpi)
            .map_err(|e| ExtractError::UnreadablePage {
                page: page.number(),
                reason: format!("{e:#}"),
            })?;
        let text = self.recognizer.recognize(&bitmap, language.engine_tag())?;
        debug!(page = page.number(), "ocr");

        Ok(PageResult {
            page_index: page.index(),
            text,
            source: PageSource::Ocr,
            warning: None,
        })
    }

    /// Like [`extract`](Self::extract), but page-level failures become an
    /// empty page carrying a warning so batch alignment is preserved.
    pub fn extract_or_degrade(
        &self,
        page: &PageHandle<'_>,
        language: LanguageSelection,
        prefer_text_layer: bool,
        dpi: u32,
    ) -> Result<PageResult> {
        match self.extract(page, language, prefer_text_layer, dpi) {
            Ok(res) => Ok(res),
            Err(err) if err.is_page_level() => {
                let warning = match err {
                    ExtractError::UnreadablePage { .. } => err.to_string(),
                    _ => format!("page {}: {err}", page.number()),
                };
                warn!("{warning}");
                Ok(PageResult {
                    page_index: page.index(),
                    text: String::new(),
                    source: PageSource::Unreadable,
                    warning: Some(warning),
                })
            }
            Err(err) => Err(err),
        }
    }
}
