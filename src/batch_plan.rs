use serde::{Deserialize, Serialize};

pub const MIN_BATCH_SIZE: u32 = 10;
pub const MAX_BATCH_SIZE: u32 = 100;

/// Half-open, zero-based page range processed as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSpec {
    pub start_index: u32, // inclusive
    pub end_index: u32,   // exclusive
    pub size: u32,
}

impl BatchSpec {
    pub fn first_page(&self) -> u32 {
        self.start_index + 1
    }

    pub fn last_page(&self) -> u32 {
        self.end_index
    }

    pub fn page_indices(&self) -> std::ops::Range<u32> {
        self.start_index..self.end_index
    }

    /// `split_<a>_to_<b>`, 1-based and inclusive.
    pub fn split_label(&self) -> String {
        format!("split_{}_to_{}", self.first_page(), self.last_page())
    }

    /// `text_batch_<a>_to_<b>`, 1-based and inclusive.
    pub fn text_label(&self) -> String {
        format!("text_batch_{}_to_{}", self.first_page(), self.last_page())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPlan {
    pub page_count: u32,
    pub batch_size: u32,
    pub batches: Vec<BatchSpec>,
}

impl BatchPlan {
    pub fn new(page_count: u32, batch_size: u32) -> Self {
        let batch_size = clamp_batch_size(batch_size);
        BatchPlan {
            page_count,
            batch_size,
            batches: plan(page_count, batch_size),
        }
    }
}

pub fn clamp_batch_size(batch_size: u32) -> u32 {
    batch_size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE)
}

/// Partition `[0, total_pages)` into consecutive batches of `batch_size`.
///
/// Only the last batch may be short. Both extraction and splitting go through
/// this function so their boundaries always agree.
pub fn plan(total_pages: u32, batch_size: u32) -> Vec<BatchSpec> {
    let step = batch_size.max(1);
    let mut batches = Vec::with_capacity(total_pages.div_ceil(step) as usize);
    let mut start = 0u32;

    while start < total_pages {
        let end = start.saturating_add(step).min(total_pages);
        batches.push(BatchSpec {
            start_index: start,
            end_index: end,
            size: end - start,
        });
        start = end;
    }

    batches
}

/// Page-boundary marker appended after page `page_number` (1-based).
pub fn page_separator(page_number: u32) -> String {
    format!("\n_________________________PAGE {page_number}____________________________\n")
}
