use super::{process::run_tool, PageRasterizer, TextLayerReader};
use crate::{config::Config, pdf::PageHandle, util::scratch_dir_in};
use anyhow::{Context, Result};
use image::DynamicImage;
use std::ffi::OsString;
use tracing::debug;

/// Page rendering and text-layer reads through poppler's `pdftoppm` and
/// `pdftotext`.
///
/// Each call is an independent process reading the request's private copy of
/// the PDF, so concurrent calls on one document are safe.
pub struct PopplerBackend {
    pdftoppm_exe: String,
    pdftotext_exe: String,
    layout: bool,
    timeout_seconds: u64,
    keep_stderr: bool,
}

impl PopplerBackend {
    pub fn new(cfg: &Config) -> Self {
        Self {
            pdftoppm_exe: cfg.render.pdftoppm_exe.clone(),
            pdftotext_exe: cfg.render.pdftotext_exe.clone(),
            layout: cfg.render.text_layer_layout,
            timeout_seconds: cfg.render.timeout_seconds,
            keep_stderr: cfg.debug.keep_tool_stderr,
        }
    }
}

fn page_range_args(page: &PageHandle<'_>) -> [OsString; 4] {
    let n = page.number().to_string();
    ["-f".into(), n.clone().into(), "-l".into(), n.into()]
}

impl PageRasterizer for PopplerBackend {
    fn rasterize(&self, page: &PageHandle<'_>, dpi: u32) -> Result<DynamicImage> {
        let doc = page.document();
        let dir = scratch_dir_in(doc.scratch_root(), "render-")
            .with_context(|| "creating render scratch dir")?;
        let prefix = dir.path().join("page");

        let mut args: Vec<OsString> = vec!["-r".into(), dpi.to_string().into()];
        args.extend(page_range_args(page));
        args.push("-png".into());
        args.push("-singlefile".into());
        args.push(doc.path().into());
        args.push(prefix.clone().into());

        run_tool(&self.pdftoppm_exe, &args, self.timeout_seconds, self.keep_stderr)
            .with_context(|| format!("rendering page {}", page.number()))?;

        let png = prefix.with_extension("png");
        let img = image::open(&png)
            .with_context(|| format!("decoding rendered page {}", page.number()))?;
        debug!(
            page = page.number(),
            dpi,
            width = img.width(),
            height = img.height(),
            "rasterized"
        );
        Ok(img)
    }
}

impl TextLayerReader for PopplerBackend {
    fn text_layer(&self, page: &PageHandle<'_>) -> Result<String> {
        let mut args: Vec<OsString> = vec!["-enc".into(), "UTF-8".into(), "-nopgbrk".into()];
        if self.layout {
            args.push("-layout".into());
        }
        args.extend(page_range_args(page));
        args.push(page.document().path().into());
        args.push("-".into());

        let out = run_tool(&self.pdftotext_exe, &args, self.timeout_seconds, self.keep_stderr)
            .with_context(|| format!("reading text layer of page {}", page.number()))?;
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}
