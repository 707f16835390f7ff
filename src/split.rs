use crate::{
    batch_plan::{plan, BatchSpec},
    error::{ExtractError, Result},
};
use lopdf::Document;
use tracing::debug;

pub struct SplitPart {
    pub label: String,
    pub spec: BatchSpec,
    pub bytes: Vec<u8>,
}

/// Split a PDF into standalone sub-documents on batch boundaries.
///
/// Boundaries come from [`plan`], so splitting and batch extraction with the
/// same `batch_size` always cover identical page ranges.
pub fn split(document: &[u8], batch_size: u32) -> Result<Vec<SplitPart>> {
    let doc = Document::load_mem(document)
        .map_err(|e| ExtractError::CorruptDocument(e.to_string()))?;
    let total = doc.get_pages().len() as u32;

    plan(total, batch_size)
        .into_iter()
        .map(|spec| {
            let bytes = extract_range(&doc, total, &spec)?;
            debug!(label = %spec.split_label(), bytes = bytes.len(), "split part");
            Ok(SplitPart {
                label: spec.split_label(),
                spec,
                bytes,
            })
        })
        .collect()
}

fn extract_range(doc: &Document, total: u32, spec: &BatchSpec) -> Result<Vec<u8>> {
    let mut part = doc.clone();
    // lopdf page numbers are 1-based
    let drop: Vec<u32> = (1..=total)
        .filter(|n| *n < spec.first_page() || *n > spec.last_page())
        .collect();
    part.delete_pages(&drop);
    part.prune_objects();
    part.renumber_objects();
    part.compress();

    let mut bytes = Vec::new();
    part.save_to(&mut bytes)?;
    Ok(bytes)
}
