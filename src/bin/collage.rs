use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use collagekit::{
    CollageDocument, EnvHomeDir, FsImageLoader, NullImageLoader, OutputFormat, ParseOptions,
    PathResolver, RenderSettings,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "collage", version, about = "Lay out and render .cxf photo collages")]
struct Cli {
    /// Log debug output (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render collages to image files.
    Render(RenderArgs),
    /// Print document metadata and resolved canvas size.
    Info(InfoArgs),
    /// Print the draw plan of one collage as JSON.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input `.cxf` files or `.picasalibrary` bundles.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output width in pixels (default 2100, or `COLLAGE_RENDER_WIDTH`).
    #[arg(long)]
    width: Option<f64>,

    /// Output directory. Defaults to the directory of each input.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    format: FormatChoice,

    /// JPEG quality 1-100 (default 90, or `COLLAGE_JPEG_QUALITY`).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Skip image loading and draw every node as an outline.
    #[arg(long)]
    no_images: bool,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input `.cxf` files or `.picasalibrary` bundles.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Input `.cxf` file.
    file: PathBuf,

    /// Canvas width in pixels.
    #[arg(long)]
    width: Option<f64>,

    /// Skip image loading; images are then reported as placeholders.
    #[arg(long)]
    no_images: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
}

impl From<FormatChoice> for OutputFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Png => OutputFormat::Png,
            FormatChoice::Jpeg => OutputFormat::Jpeg,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Info(args) => cmd_info(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(path: &Path) -> anyhow::Result<CollageDocument> {
    collagekit::load_collage(path, &ParseOptions::default())
        .with_context(|| format!("load collage '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut settings = RenderSettings::from_env();
    if let Some(width) = args.width {
        settings.target_width = width;
    }
    if let Some(quality) = args.quality {
        settings.jpeg_quality = quality;
    }
    settings.format = args.format.into();
    settings.load_images = !args.no_images;

    let files = expand_inputs(&args.files)?;
    let mut failed = 0usize;
    for file in &files {
        match render_one(file, args.out_dir.as_deref(), &settings) {
            Ok(out) => tracing::info!(input = %file.display(), output = %out.display(), "wrote"),
            Err(err) => {
                failed += 1;
                tracing::error!(input = %file.display(), "{err:#}");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} collages failed", files.len());
    }
    Ok(())
}

fn expand_inputs(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        let found = collagekit::collage_files(input)
            .with_context(|| format!("expand '{}'", input.display()))?;
        if found.is_empty() {
            tracing::warn!(library = %input.display(), "no collages in library");
        }
        files.extend(found);
    }
    Ok(files)
}

fn render_one(
    file: &Path,
    out_dir: Option<&Path>,
    settings: &RenderSettings,
) -> anyhow::Result<PathBuf> {
    let doc = load(file)?;
    let rendered = collagekit::render_collage(&doc, settings, &FsImageLoader)?;
    if rendered.placeholders > 0 {
        tracing::warn!(
            input = %file.display(),
            count = rendered.placeholders,
            "some images were unavailable"
        );
    }

    let stem = rendered.name.as_deref().unwrap_or("collage");
    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => doc.base_dir().to_path_buf(),
    };
    let out = dir.join(format!("{stem}.{}", settings.format.extension()));
    collagekit::write_frame_with_quality(
        &rendered.frame,
        &out,
        settings.format,
        settings.jpeg_quality,
    )
    .with_context(|| format!("write '{}'", out.display()))?;
    Ok(out)
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let settings = RenderSettings::from_env();
    let files = expand_inputs(&args.files)?;
    let mut failed = 0usize;
    for file in &files {
        if let Err(err) = print_info(file, &settings) {
            failed += 1;
            tracing::error!(input = %file.display(), "{err:#}");
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} collages failed", files.len());
    }
    Ok(())
}

fn print_info(file: &Path, settings: &RenderSettings) -> anyhow::Result<()> {
    let doc = load(file)?;
    let layout = collagekit::resolve_layout(&doc, settings.target_width)?;
    let resolver = PathResolver::for_document(&doc, EnvHomeDir);
    let (w, h) = layout.canvas.pixel_dims();

    println!("{}", file.display());
    println!("  name:        {}", doc.name().unwrap_or_default());
    println!("  version:     {}", doc.format_version);
    println!("  theme:       {}", doc.theme);
    println!("  format:      {} {:?}", doc.aspect_ratio, doc.orientation);
    println!("  canvas:      {w}x{h}");
    println!("  nodes:       {}", doc.nodes.len());
    println!("  album:       {}", doc.album_title().unwrap_or("-"));
    println!("  album date:  {}", doc.album_date().unwrap_or("-"));
    println!("  album id:    {}", doc.album_id().unwrap_or("-"));
    match collagekit::image_directory(&doc, &resolver) {
        Some(dir) => println!("  images in:   {}", dir.display()),
        None => println!("  images in:   -"),
    }
    Ok(())
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let doc = load(&args.file)?;
    let width = args
        .width
        .unwrap_or_else(|| RenderSettings::from_env().target_width);
    let layout = collagekit::resolve_layout(&doc, width)?;
    let resolver = PathResolver::for_document(&doc, EnvHomeDir);
    let plan = if args.no_images {
        collagekit::plan_composition(&doc, &layout, &resolver, &NullImageLoader)
    } else {
        collagekit::plan_composition(&doc, &layout, &resolver, &FsImageLoader)
    };

    let json = serde_json::to_string_pretty(&plan).context("serialize draw plan")?;
    println!("{json}");
    Ok(())
}
