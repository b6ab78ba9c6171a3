use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use glob::glob;
use tracing::{error, info};

use pdf_overlay::config::{StampConfig, TextAlign};
use pdf_overlay::{Compositor, LayoutPage, OverlayError, Result, Template, TextStamp, load_overlay};

/// Stamp an overlay page onto every page of one or more PDFs
#[derive(Parser, Debug)]
#[command(name = "pdf-overlay", about = "Stamp an overlay page onto every page of PDFs")]
struct Args {
    /// Target PDFs (glob patterns allowed)
    #[arg(required = true)]
    targets: Vec<String>,
    /// Overlay source: page 1 of a PDF, or an SVG
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    overlay: Option<PathBuf>,
    /// Stamp this text instead of a file
    #[arg(long)]
    text: Option<String>,
    /// Output directory (default: next to each target)
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Appended to each output file stem
    #[arg(long, default_value = ".stamped")]
    suffix: String,
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Characters per line for --text
    #[arg(long)]
    line_length: Option<usize>,
    /// Font size for --text
    #[arg(long)]
    font_size: Option<f32>,
    /// Alignment for --text
    #[arg(long, value_enum)]
    align: Option<TextAlign>,
    /// Resource name prefix of the overlay form
    #[arg(long)]
    prefix: Option<String>,
}

impl Args {
    /// Config file values, overridden by flags.
    fn stamp_config(&self) -> Result<StampConfig> {
        let mut config = match &self.config {
            Some(path) => StampConfig::load(path)?,
            None => StampConfig::default(),
        };
        if let Some(n) = self.line_length {
            config.text.line_length = n;
        }
        if let Some(size) = self.font_size {
            config.text.font_size = size;
            config.text.leading = size * 1.2;
        }
        if let Some(align) = self.align {
            config.text.align = align;
        }
        if let Some(prefix) = &self.prefix {
            config.form_name_prefix = prefix.clone();
        }
        Ok(config)
    }

    fn overlay(&self, config: &StampConfig) -> Result<LayoutPage> {
        match (&self.overlay, &self.text) {
            (Some(path), _) => load_overlay(path),
            (None, Some(text)) => {
                TextStamp::new(text.as_str(), config.text.clone(), config.page.to_rect())
                    .to_layout_page()
            }
            (None, None) => Err(OverlayError::MissingResource(PathBuf::from("<overlay>"))),
        }
    }

    fn expand_targets(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for pattern in &self.targets {
            let mut matched: Vec<PathBuf> = glob(pattern)?.filter_map(|e| e.ok()).collect();
            if matched.is_empty() {
                return Err(OverlayError::MissingResource(PathBuf::from(pattern)));
            }
            matched.sort();
            paths.extend(matched);
        }
        Ok(paths)
    }
}

fn output_path(target: &Path, out_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = target.file_stem().unwrap_or_default().to_string_lossy();
    let name = format!("{stem}{suffix}.pdf");
    match out_dir {
        Some(dir) => dir.join(name),
        None => target.with_file_name(name),
    }
}

/// Pairs each target with its output path. Two targets mapping to the same
/// output (same stem under `--out-dir`) is an error.
fn plan_outputs(
    targets: Vec<PathBuf>,
    out_dir: Option<&Path>,
    suffix: &str,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut seen = BTreeSet::new();
    let mut plan = Vec::with_capacity(targets.len());
    for target in targets {
        let out = output_path(&target, out_dir, suffix);
        if !seen.insert(out.clone()) {
            return Err(OverlayError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} would overwrite another output at {}", target.display(), out.display()),
            )));
        }
        plan.push((target, out));
    }
    Ok(plan)
}

fn run(args: &Args) -> Result<()> {
    let config = args.stamp_config()?;
    let overlay = args.overlay(&config)?;
    let compositor = Compositor::with_prefix(config.form_name_prefix.as_str());

    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir)?;
    }
    let plan = plan_outputs(args.expand_targets()?, args.out_dir.as_deref(), &args.suffix)?;
    for (target, out) in plan {
        Template::open(&target)?
            .with_compositor(compositor.clone())
            .overlay_layout(&overlay)?
            .save(&out)?;
        info!(target = %target.display(), out = %out.display(), "stamped");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_overlay=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
