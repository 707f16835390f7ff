mod common;

use common::{FakeBackend, FakeEngine};
use guj_extract::{
    archive::{file_separator, ArchiveWalker},
    batch_plan::page_separator,
    config::Config,
    ExtractError, ExtractOptions, ExtractionOrchestrator, LanguageSelection, Outcome,
    SourceDocument,
};
use std::time::Duration;

fn backend_with_text(text: &str) -> FakeBackend {
    let mut backend = FakeBackend::default();
    backend.text_layers.insert(1, text.to_string());
    backend
}

#[test]
fn members_sorted_case_insensitively() {
    let pdf = common::blank_pdf(1);
    let zip = common::zip_of(&[
        ("b.pdf", pdf.as_slice()),
        ("a.pdf", pdf.as_slice()),
        ("notes.txt", b"ignore me".as_slice()),
        ("C.PDF", pdf.as_slice()),
    ]);
    let cfg = Config::default();
    let members = ArchiveWalker::new(&cfg.limits).walk(&zip).expect("walk");
    let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["a.pdf", "b.pdf", "C.PDF"]);
}

#[test]
fn archive_without_documents_is_an_error() {
    let zip = common::zip_of(&[("notes.txt", b"ignore me".as_slice())]);
    let cfg = Config::default();
    assert!(matches!(
        ArchiveWalker::new(&cfg.limits).walk(&zip),
        Err(ExtractError::EmptyArchive)
    ));

    let orchestrator =
        ExtractionOrchestrator::new(&cfg, FakeBackend::default(), FakeEngine::replying(""));
    let doc = SourceDocument::new("docs.zip", "application/zip", zip);
    let (outcome, _) =
        orchestrator.respond(&doc, LanguageSelection::Gujarati, &ExtractOptions::new(20));
    assert_eq!(
        outcome,
        Outcome::Error {
            message: "no documents found".into()
        }
    );
}

#[test]
fn members_are_joined_behind_markers() {
    let pdf = common::blank_pdf(1);
    let zip = common::zip_of(&[("second.pdf", pdf.as_slice()), ("first.pdf", pdf.as_slice())]);
    let cfg = Config::default();
    let orchestrator =
        ExtractionOrchestrator::new(&cfg, backend_with_text("body"), FakeEngine::replying(""));
    let doc = SourceDocument::new("docs.zip", "docs.zip", zip);

    let (outcome, report) =
        orchestrator.respond(&doc, LanguageSelection::Hindi, &ExtractOptions::new(20));

    let expected = format!(
        "{}body{}{}body{}",
        file_separator("first.pdf"),
        page_separator(1),
        file_separator("second.pdf"),
        page_separator(1)
    );
    assert_eq!(
        outcome,
        Outcome::Text {
            value: expected,
            suggested_filename: "hindi_extracted.txt".into()
        }
    );
    assert_eq!(report.member_reports.len(), 2);
    assert!(report.member_reports.iter().all(|m| m.ok));
}

#[test]
fn corrupt_member_does_not_stop_the_walk() {
    let pdf = common::blank_pdf(2);
    let zip = common::zip_of(&[
        ("bad.pdf", b"not really a pdf".as_slice()),
        ("good.pdf", pdf.as_slice()),
    ]);
    let cfg = Config::default();
    let orchestrator =
        ExtractionOrchestrator::new(&cfg, backend_with_text("ok"), FakeEngine::replying(""));
    let doc = SourceDocument::new("docs.zip", "application/zip", zip);

    let (outcome, report) =
        orchestrator.respond(&doc, LanguageSelection::Gujarati, &ExtractOptions::new(20));

    let Outcome::Text { value, .. } = outcome else {
        panic!("expected text outcome, got {outcome:?}");
    };
    let bad = value.find(&file_separator("bad.pdf")).expect("bad marker");
    let good = value.find(&file_separator("good.pdf")).expect("good marker");
    assert!(bad < good);
    assert!(value.contains(&page_separator(2)));

    let failed: Vec<_> = report.member_reports.iter().filter(|m| !m.ok).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].name, "bad.pdf");
    assert!(report.warnings.iter().any(|w| w.starts_with("bad.pdf:")));
}

#[test]
fn member_count_limit() {
    let pdf = common::blank_pdf(1);
    let zip = common::zip_of(&[
        ("a.pdf", pdf.as_slice()),
        ("b.pdf", pdf.as_slice()),
        ("c.pdf", pdf.as_slice()),
    ]);
    let mut cfg = Config::default();
    cfg.limits.max_archive_members = 2;
    assert!(matches!(
        ArchiveWalker::new(&cfg.limits).walk(&zip),
        Err(ExtractError::LimitExceeded(_))
    ));
}

#[test]
fn job_timeout_ends_the_whole_archive() {
    let pdf = common::blank_pdf(1);
    let zip = common::zip_of(&[
        ("a.pdf", pdf.as_slice()),
        ("b.pdf", pdf.as_slice()),
        ("c.pdf", pdf.as_slice()),
    ]);
    let mut cfg = Config::default();
    cfg.limits.job_timeout_seconds = 1;
    let engine = FakeEngine::slow("x", Duration::from_millis(1200));
    let orchestrator = ExtractionOrchestrator::new(&cfg, FakeBackend::default(), &engine);
    let doc = SourceDocument::new("docs.zip", "application/zip", zip);

    let (outcome, _) =
        orchestrator.respond(&doc, LanguageSelection::Gujarati, &ExtractOptions::new(20));
    assert_eq!(
        outcome,
        Outcome::Error {
            message: "job timeout of 1s exceeded".into()
        }
    );
    assert_eq!(engine.call_count(), 1);
}

#[test]
fn unbounded_member_size_limit() {
    let pdf = common::blank_pdf(1);
    let zip = common::zip_of(&[("only.pdf", pdf.as_slice())]);
    let mut cfg = Config::default();
    cfg.limits.max_member_bytes = u64::MAX;
    let members = ArchiveWalker::new(&cfg.limits).walk(&zip).expect("walk");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].bytes, pdf);
}
