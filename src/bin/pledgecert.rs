use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use pledgecert::{
    CameraSession, CampaignConfig, CertificateStyle, Compositor, Dialog, EncodedImage, FileSource,
    PixelSize, PledgeWizard, StillFrameDevices, Step, TracingSink,
};

#[derive(Parser, Debug)]
#[command(name = "pledgecert", version)]
struct Cli {
    /// Log pipeline stages to stderr.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full pledge through the wizard and write the certificate.
    Compose(ComposeArgs),
    /// Print resolved anchor geometry for a template size as JSON.
    Anchors(AnchorsArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Certificate template image. Defaults to `final_template` from the config.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Photo served by the still-frame camera.
    #[arg(long)]
    photo: PathBuf,

    /// Signature PNG with a transparent background.
    #[arg(long)]
    signature: PathBuf,

    /// Name to put on the certificate.
    #[arg(long)]
    name: String,

    /// TrueType/OpenType font for the name. Defaults to `name_font` from the config, then to
    /// the installed fonts matching `name_font_family`.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Campaign config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct AnchorsArgs {
    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    /// Campaign config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.cmd {
        Command::Compose(args) => cmd_compose(args).await,
        Command::Anchors(args) => cmd_anchors(args),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<CampaignConfig> {
    Ok(match path {
        Some(p) => CampaignConfig::load(p)?,
        None => CampaignConfig::default(),
    })
}

async fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let config = Arc::new(load_config(args.config.as_ref())?);
    let template = args
        .template
        .clone()
        .or_else(|| config.final_template.clone())
        .context("no template: pass --template or set final_template in the config")?;

    let photo = image::open(&args.photo)
        .with_context(|| format!("open photo '{}'", args.photo.display()))?
        .to_rgba8();
    let devices = StillFrameDevices::new(photo);

    let mut wizard = PledgeWizard::new(config.clone()).with_analytics(Arc::new(TracingSink));
    if wizard.step() == Step::Intro {
        wizard.start()?;
    }

    wizard.open_dialog(Dialog::Name)?;
    wizard.set_name_draft(&args.name)?;
    wizard.confirm_name()?;

    wizard.open_dialog(Dialog::Photo)?;
    let ticket = wizard.request_camera()?;
    let session = CameraSession::open(&devices, ticket.facing(), &config.camera).await;
    wizard.camera_opened(ticket, session)?;
    wizard.capture_photo()?;

    wizard.open_dialog(Dialog::Signature)?;
    let signature = std::fs::read(&args.signature)
        .with_context(|| format!("read signature '{}'", args.signature.display()))?;
    wizard.confirm_signature_image(EncodedImage::png(signature))?;

    let mut style = CertificateStyle::from_config(&config)?;
    if let Some(font) = &args.font {
        let bytes =
            std::fs::read(font).with_context(|| format!("read font '{}'", font.display()))?;
        style = style.with_font(bytes);
    }
    let compositor = Compositor::new(Arc::new(FileSource::new(template)), style);

    let ticket = wizard.submit()?;
    let result = compositor.compose(wizard.record()).await;
    if let Err(e) = &result {
        eprintln!("{}", e.user_message());
    }
    wizard.finish_compose(ticket, result)?;

    let download = wizard.download()?;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    let out_path = args.out.join(&download.file_name);
    std::fs::write(&out_path, download.bytes.as_slice())
        .with_context(|| format!("write certificate '{}'", out_path.display()))?;

    eprintln!("wrote {}", out_path.display());
    Ok(())
}

fn cmd_anchors(args: AnchorsArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let resolved = config
        .anchors
        .resolve(PixelSize::new(args.width, args.height));
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
