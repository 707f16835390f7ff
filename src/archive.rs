use crate::{
    config::Limits,
    error::{ExtractError, Result},
    progress::{CancelToken, ProgressEvent, ProgressSink},
    report::MemberReport,
};
use std::io::{Cursor, Read, Write};
use tracing::{info, warn};
use zip::{write::SimpleFileOptions, CompressionMethod, DateTime, ZipArchive, ZipWriter};

pub const DOCUMENT_EXTENSION: &str = ".pdf";

#[derive(Debug, Clone)]
pub struct ArchiveMember {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Marker written before each member's text.
pub fn file_separator(name: &str) -> String {
    format!("\n\n============= FILE: {name} =============\n\n")
}

/// Case-insensitive name order, exact name as the tie-break.
pub fn member_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub struct ArchiveWalker<'a> {
    limits: &'a Limits,
}

impl<'a> ArchiveWalker<'a> {
    pub fn new(limits: &'a Limits) -> Self {
        Self { limits }
    }

    /// PDF members of a zip, in deterministic order.
    pub fn walk(&self, archive_bytes: &[u8]) -> Result<Vec<ArchiveMember>> {
        let mut archive = ZipArchive::new(Cursor::new(archive_bytes))
            .map_err(|e| ExtractError::Archive(e.to_string()))?;

        let mut members = Vec::new();
        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| ExtractError::Archive(e.to_string()))?;
            let name = entry.name().to_string();

            if entry.is_dir() || !name.to_lowercase().ends_with(DOCUMENT_EXTENSION) {
                continue;
            }
            if entry.encrypted() {
                warn!("skipping encrypted member {name}");
                continue;
            }
            if entry.size() > self.limits.max_member_bytes {
                warn!(
                    "skipping member {name}: {} bytes exceeds max_member_bytes",
                    entry.size()
                );
                continue;
            }
            if members.len() >= self.limits.max_archive_members {
                return Err(ExtractError::LimitExceeded(format!(
                    "max_archive_members ({})",
                    self.limits.max_archive_members
                )));
            }

            let mut bytes = Vec::with_capacity(entry.size() as usize);
            // size() comes from the header; bound the actual read as well
            entry
                .take(self.limits.max_member_bytes.saturating_add(1))
                .read_to_end(&mut bytes)?;
            if bytes.len() as u64 > self.limits.max_member_bytes {
                warn!("skipping member {name}: inflated past max_member_bytes");
                continue;
            }
            members.push(ArchiveMember { name, bytes });
        }

        if members.is_empty() {
            return Err(ExtractError::EmptyArchive);
        }

        members.sort_by(|a, b| member_order(&a.name, &b.name));
        info!("archive has {} document members", members.len());
        Ok(members)
    }

    /// Run `extract` over members in order and join the results behind file
    /// markers. A failing member contributes its marker and no text; only
    /// cancellation or the job timeout stops the walk.
    pub fn aggregate<F>(
        &self,
        members: &[ArchiveMember],
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
        mut extract: F,
    ) -> Result<(String, Vec<MemberReport>)>
    where
        F: FnMut(&ArchiveMember, &mut MemberReport) -> Result<String>,
    {
        let mut combined = String::new();
        let mut reports = Vec::with_capacity(members.len());
        let count = members.len();

        for (i, member) in members.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ExtractError::Cancelled);
            }
            progress.notify(&ProgressEvent::MemberStarted {
                name: member.name.clone(),
                member_index: i,
                member_count: count,
            });

            let mut report = MemberReport {
                name: member.name.clone(),
                ..Default::default()
            };
            combined.push_str(&file_separator(&member.name));
            match extract(member, &mut report) {
                Ok(text) => {
                    combined.push_str(&text);
                    report.ok = true;
                }
                Err(err) if err.is_job_level() => return Err(err),
                Err(err) => {
                    warn!("member {} failed: {err}", member.name);
                    report.ok = false;
                    report.error = Some(err.to_string());
                }
            }

            progress.notify(&ProgressEvent::MemberFinished {
                name: member.name.clone(),
                member_index: i,
                member_count: count,
                ok: report.ok,
            });
            reports.push(report);
        }

        Ok((combined, reports))
    }
}

/// Zip `entries` in the given order with fixed timestamps, so identical input
/// yields identical bytes.
pub fn bundle(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    for (name, bytes) in entries {
        zip.start_file(name.as_str(), options)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        zip.write_all(bytes)?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| ExtractError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}
