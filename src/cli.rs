use crate::{
    batch_plan::BatchPlan,
    config::Config,
    engine::{doctor, poppler::PopplerBackend, tesseract::TesseractEngine},
    kind::{DocumentKind, LanguageSelection, SourceDocument},
    orchestrator::{ExtractOptions, ExtractionOrchestrator, Outcome},
    pdf::OpenPdf,
    progress::LogProgress,
    util::{ensure_dir, now_rfc3339, sha256_hex},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "guj-extract")]
#[command(
    about = "Extract Gujarati, Hindi and English text from PDFs, images, docx and zip archives"
)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./guj-extract.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check tesseract, poppler and installed language data.
    Doctor {},
    /// Show how a PDF (or a page count) would be batched and split.
    Plan {
        #[arg(long, conflicts_with = "pages")]
        input: Option<PathBuf>,
        #[arg(long)]
        pages: Option<u32>,
        #[arg(long)]
        batch_size: Option<u32>,
    },
    Run {
        #[arg(long)]
        input: PathBuf,
        /// Declared MIME type or extension; defaults to the input's extension.
        #[arg(long)]
        kind: Option<String>,
        /// gu, hi, en or mixed.
        #[arg(long)]
        language: Option<LanguageSelection>,
        #[arg(long)]
        batch_size: Option<u32>,
        /// Return the PDF split into per-batch PDFs.
        #[arg(long)]
        split: bool,
        /// Return one text file per batch in a zip.
        #[arg(long)]
        bundle: bool,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let cfg = match &cfg_path {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };

    match &args.cmd {
        Command::Doctor {} => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            run_doctor(&cfg)
        }
        Command::Plan {
            input,
            pages,
            batch_size,
        } => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            plan(&cfg, input.as_deref(), *pages, *batch_size)
        }
        Command::Run {
            input,
            kind,
            language,
            batch_size,
            split,
            bundle,
            out_dir,
        } => {
            let request = RunRequest {
                input,
                kind: kind.as_deref(),
                language: language.unwrap_or(cfg.extraction.language),
                options: ExtractOptions::new(batch_size.unwrap_or(cfg.extraction.batch_size))
                    .split(*split)
                    .bundled(*bundle),
                out_override: out_dir.as_deref(),
            };
            run(&args, &cfg, &request)
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["guj-extract.toml", "guj-extract.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn init_logging(
    args: &Args,
    cfg: &Config,
    file_path: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn run_doctor(cfg: &Config) -> Result<()> {
    let diag = doctor(cfg);
    if !diag.ok {
        warn!("doctor found problems; see report");
    }
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn plan(
    cfg: &Config,
    input: Option<&Path>,
    pages: Option<u32>,
    batch_size: Option<u32>,
) -> Result<()> {
    let batch_size = batch_size.unwrap_or(cfg.extraction.batch_size);
    let page_count = match (input, pages) {
        (Some(input), _) => {
            validate_input(cfg, input)?;
            let name = input.file_name().unwrap_or(input.as_os_str()).to_string_lossy();
            if DocumentKind::resolve(&name) != DocumentKind::Pdf {
                return Err(anyhow!("plan needs a PDF: {}", input.display()));
            }
            let bytes = std::fs::read(input)
                .with_context(|| format!("reading input: {}", input.display()))?;
            OpenPdf::open(&bytes, &cfg.paths.work_dir)?.page_count()
        }
        (None, Some(pages)) => pages,
        (None, None) => return Err(anyhow!("plan needs --input or --pages")),
    };

    let plan = BatchPlan::new(page_count, batch_size);
    let batches: Vec<_> = plan
        .batches
        .iter()
        .map(|b| {
            serde_json::json!({
                "start_index": b.start_index,
                "end_index": b.end_index,
                "size": b.size,
                "text_label": format!("{}.txt", b.text_label()),
                "split_label": format!("{}.pdf", b.split_label()),
            })
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "page_count": plan.page_count,
            "batch_size": plan.batch_size,
            "batches": batches,
        }))?
    );
    Ok(())
}

struct RunRequest<'a> {
    input: &'a Path,
    kind: Option<&'a str>,
    language: LanguageSelection,
    options: ExtractOptions,
    out_override: Option<&'a Path>,
}

fn run(args: &Args, cfg: &Config, req: &RunRequest<'_>) -> Result<()> {
    validate_input(cfg, req.input)?;

    let bytes = std::fs::read(req.input)
        .with_context(|| format!("reading input: {}", req.input.display()))?;
    let name = req
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| req.input.display().to_string());
    let declared = req.kind.map(str::to_string).unwrap_or_else(|| name.clone());
    let document = SourceDocument::new(name, &declared, bytes);

    let cfg_hash = sha256_hex(cfg.normalized_for_hash().as_bytes());
    let input_hash = sha256_hex(&document.bytes);
    let options_json = serde_json::to_string(&req.options)?;
    let job_id = sha256_hex(
        format!("{cfg_hash}:{input_hash}:{}:{options_json}", req.language).as_bytes(),
    );

    let out_root = req
        .out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
    let job_dir = out_root.join(&job_id);

    if job_dir.exists() && !cfg.global.overwrite {
        return Err(anyhow!(
            "job_dir already exists and overwrite=false: {}",
            job_dir.display()
        ));
    }

    ensure_dir(&job_dir)?;
    ensure_dir(&job_dir.join("final"))?;
    ensure_dir(&job_dir.join("logs"))?;

    let log_path = resolve_log_path(cfg, Some(&job_dir));
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    info!("job_id={job_id} out={}", job_dir.display());

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(job_dir.join("effective-config.toml"), raw)?;
    }

    let orchestrator =
        ExtractionOrchestrator::new(cfg, PopplerBackend::new(cfg), TesseractEngine::new(cfg))
            .with_progress(LogProgress);

    let started = now_rfc3339();
    let (outcome, report) = orchestrator.respond(&document, req.language, &req.options);

    if cfg.output.write_report_json {
        std::fs::write(
            job_dir.join("final").join(&cfg.output.report_filename),
            serde_json::to_string_pretty(&report)?,
        )?;
    }

    let result_path = match &outcome {
        Outcome::Text {
            value,
            suggested_filename,
        } => write_result(cfg, &job_dir, suggested_filename, value.as_bytes())?,
        Outcome::Archive {
            value,
            suggested_filename,
        } => write_result(cfg, &job_dir, suggested_filename, value)?,
        Outcome::Error { .. } => None,
    };

    if cfg.output.write_index_json {
        let index = serde_json::json!({
            "job_id": job_id,
            "input": document.name,
            "kind": document.kind.label(),
            "language": req.language,
            "options": req.options,
            "started": started,
            "finished": now_rfc3339(),
            "outcome": outcome,
            "result": result_path.as_ref().map(|p| format!("final/{p}")),
            "report": format!("final/{}", cfg.output.report_filename),
        });
        std::fs::write(job_dir.join("index.json"), serde_json::to_string_pretty(&index)?)?;
    }

    if let Outcome::Error { message } = &outcome {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Err(anyhow!("{message}"));
    }

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "job_id": job_id,
                "job_dir": job_dir,
                "result": result_path,
                "status": "ok"
            }))?
        );
    }

    Ok(())
}

/// Writes the outcome payload, even when it is empty.
fn write_result(
    cfg: &Config,
    job_dir: &Path,
    filename: &str,
    bytes: &[u8],
) -> Result<Option<String>> {
    if !cfg.output.write_result {
        return Ok(None);
    }
    let path = job_dir.join("final").join(filename);
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(Some(filename.to_string()))
}

fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    if input.extension().is_none() {
        warn!("input has no extension; pass --kind if detection fails: {}", input.display());
    }

    Ok(())
}

fn looks_like_url(s: &str) -> bool {
    let s = s.to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}

fn resolve_log_path(cfg: &Config, job_dir: Option<&Path>) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    // only runs get a log file by default
    job_dir.map(|d| d.join("logs").join("guj-extract.log"))
}
