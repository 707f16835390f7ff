use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    BatchStarted {
        member: Option<String>,
        batch_index: usize,
        batch_count: usize,
        first_page: u32,
        last_page: u32,
    },
    BatchFinished {
        member: Option<String>,
        batch_index: usize,
        batch_count: usize,
        ocr_pages: u32,
        unreadable_pages: u32,
    },
    MemberStarted {
        name: String,
        member_index: usize,
        member_count: usize,
    },
    MemberFinished {
        name: String,
        member_index: usize,
        member_count: usize,
        ok: bool,
    },
}

/// Receives progress between units of work. May be called from worker
/// threads when batches run in parallel.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn notify(&self, event: &ProgressEvent) {
        self(event)
    }
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn notify(&self, _event: &ProgressEvent) {}
}

/// Reports progress through `tracing`.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn notify(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::BatchStarted {
                member,
                batch_index,
                batch_count,
                first_page,
                last_page,
            } => info!(
                member = member.as_deref().unwrap_or("-"),
                "batch {}/{} pages {}-{}",
                batch_index + 1,
                batch_count,
                first_page,
                last_page
            ),
            ProgressEvent::BatchFinished {
                member,
                batch_index,
                batch_count,
                ocr_pages,
                unreadable_pages,
            } => info!(
                member = member.as_deref().unwrap_or("-"),
                ocr_pages,
                unreadable_pages,
                "batch {}/{} done",
                batch_index + 1,
                batch_count
            ),
            ProgressEvent::MemberStarted {
                name,
                member_index,
                member_count,
            } => info!("file {}/{} {}", member_index + 1, member_count, name),
            ProgressEvent::MemberFinished {
                name,
                member_index,
                member_count,
                ok,
            } => info!(ok, "file {}/{} {} done", member_index + 1, member_count, name),
        }
    }
}

/// Caller-held flag; checked between batches and archive members.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
