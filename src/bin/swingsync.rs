use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "swingsync", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a side-by-side matchup MP4 from a pitch and a swing clip
    /// (requires `ffmpeg`/`ffprobe` on PATH).
    Build(BuildArgs),
    /// Extract one frame from a clip as a JPEG.
    Frame(FrameArgs),
    /// Trim a raw upload to an exact frame range, re-encoded all-intra.
    Trim(TrimArgs),
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Pitch clip (pitcher's delivery).
    #[arg(long)]
    pitch: PathBuf,

    /// Swing clip (hitter's swing).
    #[arg(long)]
    swing: PathBuf,

    /// Decision frame index, relative to the swing clip's start.
    #[arg(long)]
    decision: usize,

    /// Free-text description shown on the title card.
    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, default_value = "Pitcher")]
    pitcher: String,

    #[arg(long, default_value = "")]
    pitcher_team: String,

    #[arg(long, default_value = "Hitter")]
    hitter: String,

    #[arg(long, default_value = "")]
    hitter_team: String,

    /// Output MP4 path; the thumbnail lands next to it as .jpg.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input clip.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    index: u64,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct TrimArgs {
    /// Raw uploaded clip.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// First frame to keep (inclusive).
    #[arg(long)]
    start: usize,

    /// Last frame to keep (inclusive).
    #[arg(long)]
    end: usize,

    /// Decision frame tagged against the raw clip; re-based onto the
    /// trimmed clip and printed.
    #[arg(long)]
    decision: Option<usize>,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Trim(args) => cmd_trim(args),
    }
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let pitch = swingsync::source::decode_all(&args.pitch)
        .with_context(|| format!("decode pitch clip '{}'", args.pitch.display()))?;
    let swing = swingsync::source::decode_all(&args.swing)
        .with_context(|| format!("decode swing clip '{}'", args.swing.display()))?;

    let card = swingsync::TitleCard {
        pitcher_name: args.pitcher,
        pitcher_team: args.pitcher_team,
        hitter_name: args.hitter,
        hitter_team: args.hitter_team,
        description: args.description,
        swing_duration_sec: swingsync::pipeline::swing_duration_sec(
            swing.frame_count(),
            swing.fps,
        ),
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
    };

    let rendered = swingsync::render_matchup(
        &pitch,
        &swing,
        args.decision,
        &card,
        &swingsync::BuildOptions::default(),
    )?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &rendered.video)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());

    if let Some(thumb) = rendered.thumbnail {
        let thumb_path = args.out.with_extension("jpg");
        std::fs::write(&thumb_path, &thumb)
            .with_context(|| format!("write '{}'", thumb_path.display()))?;
        eprintln!("wrote {}", thumb_path.display());
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let frame = swingsync::source::extract_frame(&args.in_path, args.index)
        .with_context(|| format!("extract frame {} from '{}'", args.index, args.in_path.display()))?;

    // Frames are BGR; image wants RGB.
    let mut rgb = frame.data;
    for px in rgb.chunks_exact_mut(3) {
        px.swap(0, 2);
    }

    ensure_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &rgb,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Jpeg,
    )
    .with_context(|| format!("write jpeg '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_trim(args: TrimArgs) -> anyhow::Result<()> {
    let raw = std::fs::read(&args.in_path)
        .with_context(|| format!("read '{}'", args.in_path.display()))?;

    let trimmed = swingsync::clip::trim_clip(&raw, args.start, args.end)?;

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, &trimmed.bytes)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    eprintln!(
        "wrote {} ({} frames @ {} fps)",
        args.out.display(),
        trimmed.frame_count,
        trimmed.fps
    );

    if let Some(decision) = args.decision {
        let rebased = swingsync::clip::rebase_decision_frame(decision, args.start);
        println!("decision_frame={rebased}");
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    Ok(())
}
