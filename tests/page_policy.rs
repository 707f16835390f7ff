mod common;

use common::{FakeBackend, FakeEngine};
use guj_extract::{
    config::Preprocess,
    engine::EngineParams,
    page::{PageExtractor, PageSource},
    pdf::OpenPdf,
    recognize::RecognitionAdapter,
    LanguageSelection,
};
use std::sync::atomic::Ordering;

fn adapter(engine: &FakeEngine) -> RecognitionAdapter<&FakeEngine> {
    RecognitionAdapter::new(engine, Preprocess::None, EngineParams::default())
}

#[test]
fn text_layer_skips_ocr() {
    let pdf = OpenPdf::open(&common::blank_pdf(2), "").expect("open");
    let mut backend = FakeBackend::default();
    backend.text_layers.insert(1, "embedded text".into());
    let engine = FakeEngine::replying("ocr text");
    let recognizer = adapter(&engine);
    let pages = PageExtractor::new(&backend, &recognizer);

    let page = pdf.page(0).expect("page 1");
    let res = pages
        .extract(&page, LanguageSelection::Gujarati, true, 300)
        .expect("extract");
    assert_eq!(res.source, PageSource::TextLayer);
    assert_eq!(res.text, "embedded text");
    assert_eq!(engine.call_count(), 0);
    assert_eq!(backend.rasterized.load(Ordering::SeqCst), 0);
}

#[test]
fn blank_text_layer_falls_back_to_ocr() {
    let pdf = OpenPdf::open(&common::blank_pdf(1), "").expect("open");
    let mut backend = FakeBackend::default();
    backend.text_layers.insert(1, " \n\t ".into());
    let engine = FakeEngine::replying("ઓસીઆર");
    let recognizer = adapter(&engine);
    let pages = PageExtractor::new(&backend, &recognizer);

    let page = pdf.page(0).expect("page 1");
    let res = pages
        .extract(&page, LanguageSelection::Mixed, true, 300)
        .expect("extract");
    assert_eq!(res.source, PageSource::Ocr);
    assert_eq!(res.text, "ઓસીઆર");
    assert_eq!(engine.tags.lock().expect("tags").as_slice(), ["eng+hin+guj"]);
}

#[test]
fn text_layer_ignored_when_disabled() {
    let pdf = OpenPdf::open(&common::blank_pdf(1), "").expect("open");
    let mut backend = FakeBackend::default();
    backend.text_layers.insert(1, "embedded".into());
    let engine = FakeEngine::replying("ocr");
    let recognizer = adapter(&engine);
    let pages = PageExtractor::new(&backend, &recognizer);

    let page = pdf.page(0).expect("page 1");
    let res = pages
        .extract(&page, LanguageSelection::English, false, 300)
        .expect("extract");
    assert_eq!(res.text, "ocr");
    assert_eq!(engine.call_count(), 1);
}

#[test]
fn render_failure_degrades_to_empty_page() {
    let pdf = OpenPdf::open(&common::blank_pdf(3), "").expect("open");
    let mut backend = FakeBackend::default();
    backend.unrenderable.insert(2);
    let engine = FakeEngine::replying("x");
    let recognizer = adapter(&engine);
    let pages = PageExtractor::new(&backend, &recognizer);

    let page = pdf.page(1).expect("page 2");
    let res = pages
        .extract_or_degrade(&page, LanguageSelection::Gujarati, true, 300)
        .expect("degraded page");
    assert_eq!(res.source, PageSource::Unreadable);
    assert!(res.text.is_empty());
    assert!(res.warning.as_deref().is_some_and(|w| w.contains("page 2")));
    assert_eq!(engine.call_count(), 0);
}

#[test]
fn engine_failure_degrades_to_empty_page() {
    let pdf = OpenPdf::open(&common::blank_pdf(1), "").expect("open");
    let backend = FakeBackend::default();
    let engine = FakeEngine::failing();
    let recognizer = adapter(&engine);
    let pages = PageExtractor::new(&backend, &recognizer);

    let page = pdf.page(0).expect("page 1");
    let res = pages
        .extract_or_degrade(&page, LanguageSelection::Hindi, true, 300)
        .expect("degraded page");
    assert_eq!(res.source, PageSource::Unreadable);
    assert!(res.text.is_empty());
    assert!(res.warning.is_some());
}

#[test]
fn page_handles_stay_in_range() {
    let pdf = OpenPdf::open(&common::blank_pdf(2), "").expect("open");
    assert_eq!(pdf.page_count(), 2);
    assert!(pdf.page(1).is_some());
    assert!(pdf.page(2).is_none());
    assert_eq!(pdf.page(1).map(|p| p.number()), Some(2));
}
