use crate::{
    kind::LanguageSelection,
    page::{PageResult, PageSource},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobReport {
    pub input_name: String,
    pub kind: String,
    pub language: Option<LanguageSelection>,
    pub batch_size: u32,
    pub page_count: u32,
    pub batch_reports: Vec<BatchReport>,
    pub member_reports: Vec<MemberReport>,
    pub warnings: Vec<String>,
}

impl JobReport {
    pub fn ocr_pages(&self) -> u32 {
        self.batch_reports.iter().map(|b| b.ocr_pages).sum::<u32>()
            + self
                .member_reports
                .iter()
                .flat_map(|m| &m.batch_reports)
                .map(|b| b.ocr_pages)
                .sum::<u32>()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_index: u32,
    pub start_page: u32, // 1-based inclusive
    pub end_page: u32,   // 1-based inclusive
    pub text_layer_pages: u32,
    pub ocr_pages: u32,
    pub unreadable_pages: u32,
    pub warnings: Vec<String>,
}

impl BatchReport {
    pub fn tally(&mut self, page: &PageResult) {
        match page.source {
            PageSource::TextLayer => self.text_layer_pages += 1,
            PageSource::Ocr => self.ocr_pages += 1,
            PageSource::Unreadable => self.unreadable_pages += 1,
        }
        if let Some(w) = &page.warning {
            self.warnings.push(w.clone());
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberReport {
    pub name: String,
    pub ok: bool,
    pub page_count: u32,
    pub batch_reports: Vec<BatchReport>,
    #[serde(default)]
    pub error: Option<String>,
}
