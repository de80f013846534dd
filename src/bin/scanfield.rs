use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use scanfield::{
    BUNDLE_NAME, Canvas, CaptureInputs, DirectoryDownload, ExportConfig, ExportFormat,
    ExportOutcome, ExportRequest, ExportType, Exporter, FileStore, FrameInputs, FrameRenderer,
    NoShare, Placement, ProgressSink, RenderMode, SettingsManager, SourceImage, Theme,
    scene_for_viewport,
};

/// Store used when neither `--store` nor `SCANFIELD_STORE` is given.
const DEFAULT_STORE: &str = ".scanfield/store.json";

#[derive(Parser, Debug)]
#[command(name = "scanfield", version)]
struct Cli {
    /// Settings store file (defaults to $SCANFIELD_STORE, then .scanfield/store.json).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Export GIF/MP4 clips into a directory (MP4 requires `ffmpeg` on PATH).
    Export(ExportArgs),
    /// Inspect or change the persisted settings.
    #[command(subcommand)]
    Settings(SettingsCmd),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Timestamp in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    time_ms: f64,

    /// Background treatment.
    #[arg(long, value_enum, default_value_t = ModeChoice::Composite)]
    mode: ModeChoice,

    /// Output width (defaults to the image width).
    #[arg(long)]
    width: Option<u32>,

    /// Output height (defaults to the image height).
    #[arg(long)]
    height: Option<u32>,

    /// Palette name (cyan, crimson, matrix) or a #rrggbb color.
    #[arg(long, default_value = "matrix")]
    theme: String,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the export is saved into.
    #[arg(long)]
    out_dir: PathBuf,

    /// Formats to produce.
    #[arg(long = "format", value_enum, value_delimiter = ',', default_value = "gif")]
    formats: Vec<FormatChoice>,

    /// Clip kinds to produce.
    #[arg(long = "type", value_enum, value_delimiter = ',', default_value = "overlay")]
    types: Vec<TypeChoice>,

    /// Clip length in seconds.
    #[arg(long, default_value_t = 3.0)]
    seconds: f64,

    /// Longest output side in pixels.
    #[arg(long, default_value_t = 1920)]
    max_side: u32,

    /// Preview width the scene is sampled at.
    #[arg(long, default_value_t = 960)]
    preview_width: u32,

    /// Preview height the scene is sampled at.
    #[arg(long, default_value_t = 540)]
    preview_height: u32,

    /// Reference time for the loop search, in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    now_ms: f64,

    /// Palette name (cyan, crimson, matrix) or a #rrggbb color.
    #[arg(long, default_value = "matrix")]
    theme: String,
}

#[derive(Subcommand, Debug)]
enum SettingsCmd {
    /// Print the current settings as JSON.
    Show,
    /// Set one field (camelCase key) and save.
    Set {
        /// Field name, e.g. `blockSize`.
        key: String,
        /// New value; clamped into range.
        value: String,
    },
    /// Restore the defaults.
    Reset,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeChoice {
    Overlay,
    Composite,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Gif,
    Mp4,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TypeChoice {
    Overlay,
    Render,
}

/// Logs progress every ten percent.
#[derive(Default)]
struct LogProgress {
    last: Option<u32>,
}

impl ProgressSink for LogProgress {
    fn progress(&mut self, percent: u32) {
        let bucket = percent / 10;
        if self.last != Some(bucket) {
            self.last = Some(bucket);
            tracing::info!(percent, "export progress");
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let store_path = cli
        .store
        .or_else(|| std::env::var_os("SCANFIELD_STORE").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE));
    let mut settings = SettingsManager::new(FileStore::new(store_path));

    match cli.cmd {
        Command::Frame(args) => cmd_frame(args, &settings),
        Command::Export(args) => cmd_export(args, &settings),
        Command::Settings(cmd) => cmd_settings(cmd, &mut settings),
    }
}

fn cmd_frame(args: FrameArgs, store: &SettingsManager<FileStore>) -> anyhow::Result<()> {
    let settings = store.load();
    let theme: Theme = args.theme.parse().unwrap_or_default();
    let source = SourceImage::open(&args.in_path)
        .with_context(|| format!("load image '{}'", args.in_path.display()))?;

    let canvas = Canvas {
        width: args.width.unwrap_or(source.width),
        height: args.height.unwrap_or(source.height),
    };
    let scene = scene_for_viewport(&source, canvas, settings.block_size)?
        .context("output size leaves no room for the image")?;
    let placement = Placement {
        img_w: scene.img_w,
        img_h: scene.img_h,
        offset_x: scene.offset_x,
        offset_y: scene.offset_y,
    };
    let mode = match args.mode {
        ModeChoice::Overlay => RenderMode::Overlay,
        ModeChoice::Composite => RenderMode::Composite,
    };

    let renderer = FrameRenderer::new(FrameInputs {
        source: &source,
        scene: &scene,
        settings: &settings,
        theme: theme.rgb(),
        mode,
        canvas,
        placement,
    })?;
    renderer.render(args.time_ms).save_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs, store: &SettingsManager<FileStore>) -> anyhow::Result<()> {
    let settings = store.load();
    let theme: Theme = args.theme.parse().unwrap_or_default();
    let source = SourceImage::open(&args.in_path)
        .with_context(|| format!("load image '{}'", args.in_path.display()))?;
    let preview = Canvas {
        width: args.preview_width,
        height: args.preview_height,
    };
    let scene = scene_for_viewport(&source, preview, settings.block_size)?;

    let request = ExportRequest {
        formats: args
            .formats
            .iter()
            .map(|f| match f {
                FormatChoice::Gif => ExportFormat::Gif,
                FormatChoice::Mp4 => ExportFormat::Mp4,
            })
            .collect(),
        types: args
            .types
            .iter()
            .map(|t| match t {
                TypeChoice::Overlay => ExportType::Overlay,
                TypeChoice::Render => ExportType::Render,
            })
            .collect(),
    };
    let config = ExportConfig {
        seconds: args.seconds,
        max_side: args.max_side,
        ..ExportConfig::default()
    };

    let inputs = CaptureInputs {
        source: Some(&source),
        scene: scene.as_ref(),
        settings: &settings,
        theme: theme.rgb(),
        now_ms: args.now_ms,
    };
    let mut exporter = Exporter::system(config);
    let mut download = DirectoryDownload::new(&args.out_dir);
    let outcome = exporter.run(
        inputs,
        &request,
        &mut NoShare,
        &mut download,
        &mut LogProgress::default(),
    );

    let bundled = download.written().iter().any(|p| p.ends_with(BUNDLE_NAME));
    eprintln!("{}", outcome.note(bundled));
    match outcome {
        ExportOutcome::Failed(reason) => anyhow::bail!("export failed: {reason}"),
        ExportOutcome::Invalid(reason) => anyhow::bail!("{reason}"),
        _ => {
            for p in download.written() {
                eprintln!("wrote {}", p.display());
            }
            Ok(())
        }
    }
}

fn cmd_settings(cmd: SettingsCmd, store: &mut SettingsManager<FileStore>) -> anyhow::Result<()> {
    let settings = match cmd {
        SettingsCmd::Show => store.load(),
        SettingsCmd::Set { key, value } => {
            let next = store.load().with_field(&key, &value)?;
            store.save(&next);
            next
        }
        SettingsCmd::Reset => {
            let next = scanfield::Settings::default();
            store.save(&next);
            next
        }
    };
    let json = serde_json::to_string_pretty(&settings).context("serialize settings")?;
    println!("{json}");
    Ok(())
}
