use crate::{
    batch_plan::{page_separator, BatchSpec},
    engine::{OcrEngine, PdfBackend},
    error::{ExtractError, Result},
    kind::LanguageSelection,
    page::PageExtractor,
    pdf::OpenPdf,
    progress::{CancelToken, ProgressEvent, ProgressSink},
    report::BatchReport,
};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Per-request knobs for the PDF path.
#[derive(Debug, Clone, Copy)]
pub struct PageSettings {
    pub language: LanguageSelection,
    pub prefer_text_layer: bool,
    pub dpi: u32,
}

pub struct BatchOutput {
    pub spec: BatchSpec,
    pub text: String,
    pub report: BatchReport,
}

/// Runs planned batches over one open PDF.
///
/// Batches run strictly in order unless `max_parallel` is above one, in which
/// case they run on a bounded pool; results are always returned in batch order.
pub struct BatchRunner<'a, B: PdfBackend, E: OcrEngine> {
    pages: PageExtractor<'a, B, E>,
    settings: PageSettings,
    max_parallel: usize,
    progress: &'a dyn ProgressSink,
    cancel: &'a CancelToken,
    deadline: Option<(Instant, u64)>,
}

impl<'a, B: PdfBackend, E: OcrEngine> BatchRunner<'a, B, E> {
    pub fn new(
        pages: PageExtractor<'a, B, E>,
        settings: PageSettings,
        progress: &'a dyn ProgressSink,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            pages,
            settings,
            max_parallel: 1,
            progress,
            cancel,
            deadline: None,
        }
    }

    pub fn with_parallelism(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Fail between batches once `timeout_seconds` have passed since `started`.
    pub fn with_timeout(mut self, started: Instant, timeout_seconds: u64) -> Self {
        if timeout_seconds > 0 {
            self.deadline = Some((started + Duration::from_secs(timeout_seconds), timeout_seconds));
        }
        self
    }

    pub fn run(
        &self,
        pdf: &OpenPdf,
        batches: &[BatchSpec],
        member: Option<&str>,
    ) -> Result<Vec<BatchOutput>> {
        if self.max_parallel > 1 && batches.len() > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.max_parallel)
                .build()
            {
                Ok(pool) => {
                    debug!(workers = self.max_parallel, "running batches in parallel");
                    return pool.install(|| {
                        batches
                            .par_iter()
                            .enumerate()
                            .map(|(i, b)| self.run_batch(pdf, i, batches.len(), b, member))
                            .collect()
                    });
                }
                Err(err) => warn!("batch pool unavailable, running sequentially: {err}"),
            }
        }

        batches
            .iter()
            .enumerate()
            .map(|(i, b)| self.run_batch(pdf, i, batches.len(), b, member))
            .collect()
    }

    fn check_interrupt(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ExtractError::Cancelled);
        }
        if let Some((deadline, secs)) = self.deadline {
            if Instant::now() > deadline {
                return Err(ExtractError::Timeout(secs));
            }
        }
        Ok(())
    }

    fn run_batch(
        &self,
        pdf: &OpenPdf,
        batch_index: usize,
        batch_count: usize,
        spec: &BatchSpec,
        member: Option<&str>,
    ) -> Result<BatchOutput> {
        self.check_interrupt()?;

        self.progress.notify(&ProgressEvent::BatchStarted {
            member: member.map(str::to_string),
            batch_index,
            batch_count,
            first_page: spec.first_page(),
            last_page: spec.last_page(),
        });

        let mut report = BatchReport {
            batch_index: batch_index as u32,
            start_page: spec.first_page(),
            end_page: spec.last_page(),
            ..Default::default()
        };
        let mut text = String::new();

        for index in spec.page_indices() {
            let page = pdf.page(index).ok_or_else(|| ExtractError::UnreadablePage {
                page: index + 1,
                reason: format!("document has only {} pages", pdf.page_count()),
            })?;
            let res = self.pages.extract_or_degrade(
                &page,
                self.settings.language,
                self.settings.prefer_text_layer,
                self.settings.dpi,
            )?;
            text.push_str(&res.text);
            text.push_str(&page_separator(page.number()));
            report.tally(&res);
        }

        self.progress.notify(&ProgressEvent::BatchFinished {
            member: member.map(str::to_string),
            batch_index,
            batch_count,
            ocr_pages: report.ocr_pages,
            unreadable_pages: report.unreadable_pages,
        });

        Ok(BatchOutput {
            spec: *spec,
            text,
            report,
        })
    }
}

/// Concatenate batch texts in batch order.
pub fn join_batches(outputs: &[BatchOutput]) -> String {
    outputs.iter().map(|o| o.text.as_str()).collect()
}
