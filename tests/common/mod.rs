#![allow(dead_code)]

use guj_extract::{
    engine::{EngineParams, OcrEngine, PageRasterizer, TextLayerReader},
    pdf::PageHandle,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A minimal PDF with `pages` blank pages.
pub fn blank_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

pub fn white_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        image::Rgb([255, 255, 255]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    bytes
}

pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        zip.start_file(*name, options).expect("start zip entry");
        zip.write_all(bytes).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

/// Backend driven by per-page fixtures, keyed by 1-based page number.
#[derive(Default)]
pub struct FakeBackend {
    pub text_layers: HashMap<u32, String>,
    pub unrenderable: HashSet<u32>,
    pub rasterized: AtomicUsize,
}

impl TextLayerReader for FakeBackend {
    fn text_layer(&self, page: &PageHandle<'_>) -> anyhow::Result<String> {
        Ok(self.text_layers.get(&page.number()).cloned().unwrap_or_default())
    }
}

impl PageRasterizer for FakeBackend {
    fn rasterize(&self, page: &PageHandle<'_>, _dpi: u32) -> anyhow::Result<DynamicImage> {
        self.rasterized.fetch_add(1, Ordering::SeqCst);
        if self.unrenderable.contains(&page.number()) {
            anyhow::bail!("render failed");
        }
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255]))))
    }
}

/// Engine that answers with a fixed string and records what it was given.
pub struct FakeEngine {
    pub reply: String,
    pub fail: bool,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub tags: Mutex<Vec<String>>,
    pub images: Mutex<Vec<DynamicImage>>,
    pub params: Mutex<Vec<EngineParams>>,
}

impl FakeEngine {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
            tags: Default::default(),
            images: Default::default(),
            params: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying("")
        }
    }

    pub fn slow(reply: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying(reply)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for FakeEngine {
    fn recognize(
        &self,
        image: &DynamicImage,
        language_tag: &str,
        params: &EngineParams,
    ) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tags.lock().expect("tags").push(language_tag.to_string());
        self.images.lock().expect("images").push(image.clone());
        self.params.lock().expect("params").push(params.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            anyhow::bail!("engine crashed");
        }
        Ok(self.reply.clone())
    }
}

impl OcrEngine for &FakeEngine {
    fn recognize(
        &self,
        image: &DynamicImage,
        language_tag: &str,
        params: &EngineParams,
    ) -> anyhow::Result<String> {
        (**self).recognize(image, language_tag, params)
    }
}
