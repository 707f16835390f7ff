use crate::{
    archive::{self, ArchiveWalker},
    batch_plan::{clamp_batch_size, plan},
    config::Config,
    docx,
    engine::{OcrEngine, PdfBackend},
    error::{ExtractError, Result},
    kind::{DocumentKind, LanguageSelection, SourceDocument},
    page::PageExtractor,
    pdf::OpenPdf,
    pipeline::{join_batches, BatchRunner, PageSettings},
    progress::{CancelToken, NoProgress, ProgressSink},
    recognize::RecognitionAdapter,
    report::{BatchReport, JobReport},
    split,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Caller-selected options for one request. Never read from global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    pub batch_size: u32,
    /// Return the PDF split into per-batch sub-documents instead of text.
    pub split_mode: bool,
    /// Return one text file per batch in a zip instead of flat text.
    pub bundle_to_archive: bool,
}

impl ExtractOptions {
    pub fn new(batch_size: u32) -> Self {
        Self {
            batch_size: clamp_batch_size(batch_size),
            split_mode: false,
            bundle_to_archive: false,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.extraction.batch_size)
    }

    pub fn split(mut self, on: bool) -> Self {
        self.split_mode = on;
        self
    }

    pub fn bundled(mut self, on: bool) -> Self {
        self.bundle_to_archive = on;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    FlatText(String),
    /// Named entries in output order.
    BundledArchive(Vec<(String, Vec<u8>)>),
}

/// What the caller receives; every failure is folded into `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Text {
        value: String,
        suggested_filename: String,
    },
    Archive {
        #[serde(skip)]
        value: Vec<u8>,
        suggested_filename: String,
    },
    Error {
        message: String,
    },
}

pub fn suggested_filename(
    kind: &DocumentKind,
    language: LanguageSelection,
    options: &ExtractOptions,
) -> String {
    let lang = language.display_name();
    match kind {
        DocumentKind::Pdf if options.split_mode => "split_pdfs.zip".to_string(),
        DocumentKind::Pdf if options.bundle_to_archive => "text_batches.zip".to_string(),
        DocumentKind::Pdf | DocumentKind::Archive => format!("{lang}_extracted.txt"),
        DocumentKind::Image | DocumentKind::WordDocument | DocumentKind::Unsupported(_) => {
            format!("{lang}_text.txt")
        }
    }
}

pub struct ExtractionOrchestrator<B: PdfBackend, E: OcrEngine> {
    cfg: Config,
    backend: B,
    recognizer: RecognitionAdapter<E>,
    progress: Box<dyn ProgressSink>,
    cancel: CancelToken,
}

impl<B: PdfBackend, E: OcrEngine> ExtractionOrchestrator<B, E> {
    pub fn new(cfg: &Config, backend: B, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            backend,
            recognizer: RecognitionAdapter::from_config(cfg, engine),
            progress: Box::new(NoProgress),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Box::new(sink);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run(
        &self,
        document: &SourceDocument,
        language: LanguageSelection,
        options: &ExtractOptions,
    ) -> Result<ExtractionResult> {
        self.run_reported(document, language, options)
            .map(|(result, _)| result)
    }

    /// Run and convert to the outbound shape. Never fails.
    pub fn respond(
        &self,
        document: &SourceDocument,
        language: LanguageSelection,
        options: &ExtractOptions,
    ) -> (Outcome, JobReport) {
        let suggested = suggested_filename(&document.kind, language, options);

        let (result, report) = match self.run_reported(document, language, options) {
            Ok(ok) => ok,
            Err(err) => {
                warn!("extraction of {} failed: {err}", document.name);
                let report = JobReport {
                    input_name: document.name.clone(),
                    kind: document.kind.label().to_string(),
                    language: Some(language),
                    warnings: vec![err.to_string()],
                    ..Default::default()
                };
                return (
                    Outcome::Error {
                        message: err.to_string(),
                    },
                    report,
                );
            }
        };

        let outcome = match result {
            ExtractionResult::FlatText(value) => Outcome::Text {
                value,
                suggested_filename: suggested,
            },
            ExtractionResult::BundledArchive(entries) => match archive::bundle(&entries) {
                Ok(value) => Outcome::Archive {
                    value,
                    suggested_filename: suggested,
                },
                Err(err) => Outcome::Error {
                    message: err.to_string(),
                },
            },
        };
        (outcome, report)
    }

    pub fn run_reported(
        &self,
        document: &SourceDocument,
        language: LanguageSelection,
        options: &ExtractOptions,
    ) -> Result<(ExtractionResult, JobReport)> {
        let started = Instant::now();
        let bytes = document.bytes.len() as u64;
        if bytes > self.cfg.limits.max_input_file_bytes {
            return Err(ExtractError::LimitExceeded(format!(
                "max_input_file_bytes ({bytes} > {})",
                self.cfg.limits.max_input_file_bytes
            )));
        }

        let mut report = JobReport {
            input_name: document.name.clone(),
            kind: document.kind.label().to_string(),
            language: Some(language),
            batch_size: options.batch_size,
            ..Default::default()
        };
        info!(
            "extracting {} kind={} lang={} batch_size={} split={} bundle={}",
            document.name,
            document.kind.label(),
            language,
            options.batch_size,
            options.split_mode,
            options.bundle_to_archive
        );

        let result = match &document.kind {
            DocumentKind::Archive => {
                self.run_archive(document, language, options, started, &mut report)?
            }
            DocumentKind::Pdf => {
                self.run_pdf(document, language, options, started, &mut report)?
            }
            DocumentKind::Image => self.run_image(document, language)?,
            DocumentKind::WordDocument => {
                ExtractionResult::FlatText(docx::extract_text(&document.bytes)?)
            }
            DocumentKind::Unsupported(raw) => {
                return Err(ExtractError::UnsupportedKind(raw.clone()));
            }
        };

        info!(
            "extraction of {} finished in {:?} (ocr pages: {})",
            document.name,
            started.elapsed(),
            report.ocr_pages()
        );
        Ok((result, report))
    }

    fn runner(&self, language: LanguageSelection, started: Instant) -> BatchRunner<'_, B, E> {
        let settings = PageSettings {
            language,
            prefer_text_layer: self.cfg.extraction.prefer_text_layer,
            dpi: self.cfg.extraction.dpi,
        };
        BatchRunner::new(
            PageExtractor::new(&self.backend, &self.recognizer),
            settings,
            self.progress.as_ref(),
            &self.cancel,
        )
        .with_parallelism(self.cfg.global.max_parallel_batches)
        .with_timeout(started, self.cfg.limits.job_timeout_seconds)
    }

    fn open_pdf(&self, bytes: &[u8]) -> Result<OpenPdf> {
        let pdf = OpenPdf::open(bytes, &self.cfg.paths.work_dir)?;
        if pdf.page_count() > self.cfg.limits.max_input_pages {
            return Err(ExtractError::LimitExceeded(format!(
                "max_input_pages ({} > {})",
                pdf.page_count(),
                self.cfg.limits.max_input_pages
            )));
        }
        Ok(pdf)
    }

    fn run_pdf(
        &self,
        document: &SourceDocument,
        language: LanguageSelection,
        options: &ExtractOptions,
        started: Instant,
        report: &mut JobReport,
    ) -> Result<ExtractionResult> {
        let pdf = self.open_pdf(&document.bytes)?;
        report.page_count = pdf.page_count();

        if options.split_mode {
            let parts = split::split(&document.bytes, options.batch_size)?;
            report.batch_reports = parts
                .iter()
                .enumerate()
                .map(|(i, p)| BatchReport {
                    batch_index: i as u32,
                    start_page: p.spec.first_page(),
                    end_page: p.spec.last_page(),
                    ..Default::default()
                })
                .collect();
            return Ok(ExtractionResult::BundledArchive(
                parts
                    .into_iter()
                    .map(|p| (format!("{}.pdf", p.label), p.bytes))
                    .collect(),
            ));
        }

        let batches = plan(pdf.page_count(), options.batch_size);

        let outputs = self.runner(language, started).run(&pdf, &batches, None)?;
        report.batch_reports = outputs.iter().map(|o| o.report.clone()).collect();
        report
            .warnings
            .extend(outputs.iter().flat_map(|o| o.report.warnings.iter().cloned()));

        if options.bundle_to_archive {
            Ok(ExtractionResult::BundledArchive(
                outputs
                    .into_iter()
                    .map(|o| {
                        let name = format!("{}.txt", o.spec.text_label());
                        (name, o.text.into_bytes())
                    })
                    .collect(),
            ))
        } else {
            Ok(ExtractionResult::FlatText(join_batches(&outputs)))
        }
    }

    fn run_archive(
        &self,
        document: &SourceDocument,
        language: LanguageSelection,
        options: &ExtractOptions,
        started: Instant,
        report: &mut JobReport,
    ) -> Result<ExtractionResult> {
        let walker = ArchiveWalker::new(&self.cfg.limits);
        let members = walker.walk(&document.bytes)?;
        let runner = self.runner(language, started);

        let (text, member_reports) = walker.aggregate(
            &members,
            self.progress.as_ref(),
            &self.cancel,
            |member, member_report| {
                let pdf = self.open_pdf(&member.bytes)?;
                member_report.page_count = pdf.page_count();
                let batches = plan(pdf.page_count(), options.batch_size);
                let outputs = runner.run(&pdf, &batches, Some(&member.name))?;
                member_report.batch_reports =
                    outputs.iter().map(|o| o.report.clone()).collect();
                Ok(join_batches(&outputs))
            },
        )?;

        report.page_count = member_reports.iter().map(|m| m.page_count).sum();
        for m in &member_reports {
            if let Some(err) = &m.error {
                report.warnings.push(format!("{}: {err}", m.name));
            }
            report.warnings.extend(
                m.batch_reports
                    .iter()
                    .flat_map(|b| b.warnings.iter().map(|w| format!("{}: {w}", m.name))),
            );
        }
        report.member_reports = member_reports;

        Ok(ExtractionResult::FlatText(text))
    }

    fn run_image(
        &self,
        document: &SourceDocument,
        language: LanguageSelection,
    ) -> Result<ExtractionResult> {
        let img = image::load_from_memory(&document.bytes)
            .map_err(|e| ExtractError::CorruptDocument(format!("image decode: {e}")))?;
        let text = self.recognizer.recognize(&img, language.engine_tag())?;
        Ok(ExtractionResult::FlatText(text))
    }
}
