use crate::{
    config::{Config, Preprocess},
    engine::{EngineParams, OcrEngine},
    error::{ExtractError, Result},
};
use image::{DynamicImage, GrayImage};

/// Luminance cutoff: darker pixels become black, the rest white.
pub const BINARIZE_THRESHOLD: u8 = 128;

/// Uniform front for the OCR capability, with optional preprocessing.
pub struct RecognitionAdapter<E: OcrEngine> {
    engine: E,
    preprocess: Preprocess,
    params: EngineParams,
}

impl<E: OcrEngine> RecognitionAdapter<E> {
    pub fn new(engine: E, preprocess: Preprocess, params: EngineParams) -> Self {
        Self {
            engine,
            preprocess,
            params,
        }
    }

    pub fn from_config(cfg: &Config, engine: E) -> Self {
        Self::new(engine, cfg.ocr.preprocess, EngineParams::from_config(cfg))
    }

    /// Recognize with the configured preprocessing and parameters.
    pub fn recognize(&self, bitmap: &DynamicImage, language_tag: &str) -> Result<String> {
        self.recognize_with(bitmap, language_tag, self.preprocess, &self.params)
    }

    pub fn recognize_with(
        &self,
        bitmap: &DynamicImage,
        language_tag: &str,
        preprocess: Preprocess,
        params: &EngineParams,
    ) -> Result<String> {
        let prepared;
        let input = match preprocess {
            Preprocess::None => bitmap,
            Preprocess::GrayscaleBinarize => {
                prepared = DynamicImage::ImageLuma8(binarize(bitmap));
                &prepared
            }
        };

        self.engine
            .recognize(input, language_tag, params)
            .map_err(|e| ExtractError::RecognitionEngine(format!("{e:#}")))
    }
}

/// Grayscale, then hard threshold at [`BINARIZE_THRESHOLD`].
///
/// Output pixels are exactly 0 or 255. The input is left untouched.
pub fn binarize(bitmap: &DynamicImage) -> GrayImage {
    let mut gray = bitmap.to_luma8();
    for px in gray.pixels_mut() {
        px.0[0] = if px.0[0] < BINARIZE_THRESHOLD { 0 } else { 255 };
    }
    gray
}
