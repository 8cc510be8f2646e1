use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use cardpress::{Compositor, CompositorOpts, FsFetcher, OutputFormat, RenderPayload};

#[derive(Parser, Debug)]
#[command(name = "cardpress", version)]
struct Cli {
    /// Log verbosity: -v for debug, -vv for trace.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a card payload to an image file.
    Render(RenderArgs),
    /// Print the render fingerprint of a card payload.
    Fingerprint(FingerprintArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input card JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image path.
    #[arg(long)]
    out: PathBuf,

    /// Compositor options JSON. Flags below override its values.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Root for relative asset references. Defaults to the payload's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Directory of font files.
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// Font used when a family has no match.
    #[arg(long)]
    fallback_font: Option<PathBuf>,

    /// Output format (`jpeg` or `png`). Defaults to the output extension.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// JPEG quality, 1..=100.
    #[arg(long)]
    quality: Option<u8>,
}

#[derive(Parser, Debug)]
struct FingerprintArgs {
    /// Input card JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Fingerprint(args) => cmd_fingerprint(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let payload = RenderPayload::from_path(&args.in_path)?;
    let opts = build_opts(&args)?;

    let assets_root = match &args.assets {
        Some(p) => p.clone(),
        None => args
            .in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };
    let compositor = Compositor::new(opts, Arc::new(FsFetcher::new(assets_root)))?;
    let out = compositor.render(&payload)?;
    for w in &out.warnings {
        tracing::warn!("{w}");
    }

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &out.buffer)
        .with_context(|| format!("write image '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({}x{}, {}, {})",
        args.out.display(),
        out.width,
        out.height,
        out.format.mime_type(),
        out.fingerprint
    );
    Ok(())
}

fn build_opts(args: &RenderArgs) -> anyhow::Result<CompositorOpts> {
    let mut opts = match &args.opts {
        Some(p) => CompositorOpts::from_path(p)?,
        None => CompositorOpts::default(),
    };
    if let Some(dir) = &args.font_dir {
        opts = opts.with_font_dir(dir);
    }
    if let Some(path) = &args.fallback_font {
        opts = opts.with_fallback_font(path);
    }
    if let Some(q) = args.quality {
        opts = opts.with_jpeg_quality(q);
    }
    let format = match args.format {
        Some(f) => Some(f),
        None => args
            .out
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse::<OutputFormat>().ok()),
    };
    if let Some(f) = format {
        opts = opts.with_output_format(f);
    }
    opts.validate()?;
    Ok(opts)
}

fn cmd_fingerprint(args: FingerprintArgs) -> anyhow::Result<()> {
    let payload = RenderPayload::from_path(&args.in_path)?;
    let fp = cardpress::fingerprint_payload(&payload)?;
    println!("{fp}");
    Ok(())
}
