use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tempfile::TempDir;
use time::format_description::well_known::Rfc3339;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Fresh temporary directory under `work_dir` (system temp dir when empty).
pub fn scratch_dir(work_dir: &str, prefix: &str) -> std::io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix);
    if work_dir.is_empty() {
        builder.tempdir()
    } else {
        std::fs::create_dir_all(work_dir)?;
        builder.tempdir_in(work_dir)
    }
}

/// Fresh temporary directory nested inside an existing scratch root.
pub fn scratch_dir_in(root: &Path, prefix: &str) -> std::io::Result<TempDir> {
    tempfile::Builder::new().prefix(prefix).tempdir_in(root)
}
