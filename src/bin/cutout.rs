use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cutout", version)]
struct Cli {
    /// Editor configuration JSON (defaults apply when omitted).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an image to the background-removal service and save the cutout.
    Remove(RemoveArgs),
    /// Auto-remove, paint a mask from a stroke script, then refine.
    Refine(RefineArgs),
    /// Composite an image with a stroke script locally, without any network.
    Preview(PreviewArgs),
    /// Shrink an image to fit an upload budget.
    Compress(CompressArgs),
    /// Run a contact-form submission through the mail relay.
    Contact(ContactArgs),
}

#[derive(Parser, Debug)]
struct RemoveArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RefineArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Stroke script JSON, in image pixel coordinates.
    #[arg(long)]
    strokes: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Optional stroke script JSON.
    #[arg(long)]
    strokes: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct CompressArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path; the bytes are written as produced (JPEG when recompressed).
    #[arg(long)]
    out: PathBuf,

    /// Byte budget (defaults to the configured upload limit).
    #[arg(long)]
    max_bytes: Option<u64>,
}

#[derive(Parser, Debug)]
struct ContactArgs {
    /// Submission JSON body.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Remove(args) => cmd_remove(config, args),
        Command::Refine(args) => cmd_refine(config, args),
        Command::Preview(args) => cmd_preview(config, args),
        Command::Compress(args) => cmd_compress(config, args),
        Command::Contact(args) => cmd_contact(config, args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<cutout::EditorConfig> {
    let mut config = match path {
        Some(p) => cutout::EditorConfig::from_json_path(p)?,
        None => cutout::EditorConfig::default(),
    };
    config.apply_env();
    config.validate().with_context(|| "invalid configuration")?;
    Ok(config)
}

fn make_pipeline(
    config: &cutout::EditorConfig,
) -> anyhow::Result<cutout::RemoteRefinePipeline<cutout::HttpTransport>> {
    let transport = cutout::HttpTransport::new(config.endpoints.clone())?;
    Ok(cutout::RemoteRefinePipeline::new(transport, config.size))
}

/// Lay the edit surface out 1:1 with the loaded image.
fn lay_out(session: &mut cutout::EditorSession) {
    let (w, h) = session.layers().size();
    session.resize_container(cutout::Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));
}

fn cmd_remove(config: cutout::EditorConfig, args: RemoveArgs) -> anyhow::Result<()> {
    let mut pipeline = make_pipeline(&config)?;
    let file = cutout::SourceFile::from_path(&args.in_path)?;
    let mut session = cutout::EditorSession::new(config);

    session.load_and_auto_remove(file, &mut pipeline)?;
    let png = session
        .result_png()
        .context("service returned no image")?;
    write_output(&args.out, png)
}

fn cmd_refine(config: cutout::EditorConfig, args: RefineArgs) -> anyhow::Result<()> {
    let script = cutout::StrokeScript::from_json_path(&args.strokes)?;
    let mut pipeline = make_pipeline(&config)?;
    let file = cutout::SourceFile::from_path(&args.in_path)?;
    let mut session = cutout::EditorSession::new(config);

    if let Err(alert) = session.load_and_auto_remove(file, &mut pipeline) {
        // Refine works from the uploaded original as well.
        tracing::warn!(%alert, "continuing without an auto-removed base");
    }
    lay_out(&mut session);
    script.replay(&mut session)?;
    session.refine_with(&mut pipeline)?;

    let png = session
        .result_png()
        .context("service returned no image")?;
    write_output(&args.out, png)
}

fn cmd_preview(config: cutout::EditorConfig, args: PreviewArgs) -> anyhow::Result<()> {
    let file = cutout::SourceFile::from_path(&args.in_path)?;
    let mut session = cutout::EditorSession::new(config);
    session.load_local(file)?;
    lay_out(&mut session);

    if let Some(path) = &args.strokes {
        cutout::StrokeScript::from_json_path(path)?.replay(&mut session)?;
    }
    session.on_animation_frame();
    let png = session.display_png()?;
    write_output(&args.out, &png)
}

fn cmd_compress(config: cutout::EditorConfig, args: CompressArgs) -> anyhow::Result<()> {
    let file = cutout::SourceFile::from_path(&args.in_path)?;
    let budget = args.max_bytes.unwrap_or(config.size.max_upload_bytes);
    let adapter = cutout::ImageSizeAdapter::new(config.size);

    let out = adapter.adapt(&file, budget);
    write_output(&args.out, out.bytes())?;
    eprintln!(
        "{} -> {} bytes ({}), budget {budget}",
        file.size(),
        out.size(),
        out.content_type
    );
    Ok(())
}

fn cmd_contact(config: cutout::EditorConfig, args: ContactArgs) -> anyhow::Result<()> {
    let body = std::fs::read(&args.in_path)
        .with_context(|| format!("read submission '{}'", args.in_path.display()))?;
    let mailer = cutout::HttpMailTransport::new(config.endpoints.timeout_secs)?;
    let mut relay = cutout::ContactRelay::new(cutout::MailConfig::from_env(), mailer);

    let reply = relay.handle(&body);
    println!("{} {}", reply.status, reply.body_json()?);
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
