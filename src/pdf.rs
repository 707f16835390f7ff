use crate::error::{ExtractError, Result};
use crate::util::scratch_dir;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A PDF opened for one request.
///
/// The bytes are copied into a private temporary directory so subprocess
/// backends can read them by path. The directory, and everything backends
/// write beneath it, is removed when the handle drops.
pub struct OpenPdf {
    dir: TempDir,
    path: PathBuf,
    page_count: u32,
}

impl OpenPdf {
    pub fn open(bytes: &[u8], work_dir: &str) -> Result<Self> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ExtractError::CorruptDocument(e.to_string()))?;
        let page_count = doc.get_pages().len() as u32;

        let dir = scratch_dir(work_dir, "pdf-")?;
        let path = dir.path().join("input.pdf");
        std::fs::write(&path, bytes)?;
        debug!(pages = page_count, path = %path.display(), "opened pdf");

        Ok(Self {
            dir,
            path,
            page_count,
        })
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory backends may create per-call scratch space in.
    pub fn scratch_root(&self) -> &Path {
        self.dir.path()
    }

    pub fn page(&self, index: u32) -> Option<PageHandle<'_>> {
        (index < self.page_count).then_some(PageHandle { doc: self, index })
    }
}

/// Zero-based page of an [`OpenPdf`]; cannot outlive it.
#[derive(Clone, Copy)]
pub struct PageHandle<'a> {
    doc: &'a OpenPdf,
    index: u32,
}

impl<'a> PageHandle<'a> {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// 1-based page number, as external tools and markers expect.
    pub fn number(&self) -> u32 {
        self.index + 1
    }

    pub fn document(&self) -> &'a OpenPdf {
        self.doc
    }
}
