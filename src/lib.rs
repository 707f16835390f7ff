pub mod archive;
pub mod batch_plan;
pub mod cli;
pub mod config;
pub mod docx;
pub mod engine;
pub mod error;
pub mod kind;
pub mod orchestrator;
pub mod page;
pub mod pdf;
pub mod pipeline;
pub mod progress;
pub mod recognize;
pub mod report;
pub mod split;
pub mod util;

pub use error::{ExtractError, Result};
pub use kind::{DocumentKind, LanguageSelection, SourceDocument};
pub use orchestrator::{ExtractOptions, ExtractionOrchestrator, ExtractionResult, Outcome};
