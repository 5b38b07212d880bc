use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ytte::config::API_URL_ENV;
use ytte::error::YtteError;
use ytte::{
    Config, Download, DownloadKind, DownloadRequest, HttpService, InfoView, Selection, Session,
};

const VERSION: &str = const_str::concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    git_version::git_version!(fallback = "unknown"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "ytte",
    version = VERSION,
    about = "Fetch available formats for a video and download a chosen combination",
    long_about = "Talks to a YT-TE service: fetches title, thumbnail and formats for a video URL,\n\
    then downloads one video quality muxed with one audio quality, or an audio stream alone.\n\n\
    Examples:\n\
      ytte https://youtu.be/VIDEO                          # List available formats\n\
      ytte -i https://youtu.be/VIDEO                       # Show title and thumbnail only\n\
      ytte --video 137 --audio 140 https://youtu.be/VIDEO  # Video with audio\n\
      ytte --audio-only --audio 251 https://youtu.be/VIDEO # Audio only\n\
      ytte --print-url --audio-only --audio 251 URL        # Print the download link\n\
      ytte --api http://host:8000 URL                      # Use another service"
)]
struct Args {
    /// Video URL
    #[arg(help = "Video URL to fetch formats for")]
    url: String,

    /// Base URL of the metadata/download service
    #[arg(long = "api", env = API_URL_ENV, help = "Base URL of the YT-TE service")]
    api: Option<String>,

    /// Request timeout in seconds
    #[arg(long = "timeout", help = "Request timeout in seconds")]
    timeout: Option<u64>,

    #[arg(
        short = 'F',
        long = "list-formats",
        help = "List available video and audio options without downloading"
    )]
    list_formats: bool,

    #[arg(
        short = 'i',
        long = "info-only",
        help = "Show title and thumbnail only"
    )]
    info_only: bool,

    #[arg(long = "video", help = "Video format id to download")]
    video: Option<String>,

    #[arg(long = "audio", help = "Audio format id to download or combine")]
    audio: Option<String>,

    #[arg(long = "audio-only", help = "Download the selected audio stream alone")]
    audio_only: bool,

    #[arg(short = 'd', long = "dir", help = "Download to specified directory")]
    output_dir: Option<PathBuf>,

    #[arg(short = 'o', long = "output", help = "Output filename")]
    output_name: Option<String>,

    #[arg(long = "print-url", help = "Print the download link instead of downloading")]
    print_url: bool,

    #[arg(short = 'v', long = "verbose", help = "Verbose logging")]
    verbose: bool,
}

impl Args {
    fn selection(&self) -> Selection {
        Selection::new(self.video.as_deref(), self.audio.as_deref())
    }

    fn wants_download(&self) -> bool {
        self.video.is_some() || self.audio.is_some() || self.audio_only
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "ytte=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.api {
        Some(api) => Config::with_base_url(api)?,
        None => Config::default(),
    };
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn display_info(view: &InfoView) {
    println!("Title: {}", view.title);
    if let Some(thumbnail) = &view.thumbnail {
        println!("Thumbnail: {}", thumbnail);
    }
}

fn list_options(view: &InfoView) {
    println!();
    println!("== Video with audio ==");
    println!("Video quality:");
    if view.video_tab.video.is_empty() {
        println!("  (none)");
    }
    for option in &view.video_tab.video {
        println!("  {}", option);
    }
    println!("Audio quality (to combine):");
    if view.video_tab.audio.is_empty() {
        println!("  (none)");
    }
    for option in &view.video_tab.audio {
        println!("  {}", option);
    }

    println!();
    println!("== Audio only ==");
    if view.audio_tab.audio.is_empty() {
        println!("  (none)");
    }
    for option in &view.audio_tab.audio {
        println!("  {}", option);
    }
}

fn get_filename(
    suggested: Option<&str>,
    title: &str,
    kind: DownloadKind,
    output_name: &Option<String>,
) -> String {
    if let Some(name) = output_name {
        // Keep the user's stem, the service decides the container
        let base_name = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("download");
        return format!("{}{}", base_name, kind.extension());
    }
    if let Some(name) = suggested {
        return name.to_string();
    }
    let title = sanitize_filename::sanitize(title);
    let stem = if title.trim().is_empty() {
        "download"
    } else {
        title.trim()
    };
    format!("{}{}", stem, kind.extension())
}

async fn download(
    service: &HttpService,
    request: &DownloadRequest,
    title: &str,
    args: &Args,
) -> anyhow::Result<PathBuf> {
    let download = service.open_download(request).await?;
    let filename = get_filename(
        download.file_name.as_deref(),
        title,
        request.kind(),
        &args.output_name,
    );
    let path = match &args.output_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
            dir.join(&filename)
        }
        None => Path::new(".").join(&filename),
    };

    let expected = download.content_length;
    // Stream into a sibling so a broken transfer never looks like a finished file
    let part = path.with_file_name(format!("{}.part", filename));
    let written = match write_stream(download, &part).await {
        Ok(written) => written,
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }
    };
    tokio::fs::rename(&part, &path)
        .await
        .with_context(|| format!("moving {} into place", part.display()))?;

    info!(path = %path.display(), bytes = written, expected = ?expected, "download finished");
    Ok(path)
}

async fn write_stream(download: Download, path: &Path) -> anyhow::Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("creating {}", path.display()))?;
    let mut written: u64 = 0;
    let mut stream = Box::pin(download.bytes_stream());
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(YtteError::from)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(YtteError::from)?;
    Ok(written)
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = build_config(&args)?;
    let service = HttpService::new(config)?;
    let mut session = Session::new();

    println!("Fetching information for: {}", args.url.trim());
    if let Err(e) = session.fetch(&service, &args.url).await {
        if !e.is_user_input() {
            eprintln!("✗ Could not fetch video information [{}]", session.status());
        }
        return Err(e.into());
    }
    let view = session.view().ok_or(YtteError::NoMetadata)?;

    display_info(&view);
    if args.info_only {
        return Ok(());
    }

    if args.list_formats || !args.wants_download() {
        list_options(&view);
        return Ok(());
    }

    let selection = args.selection();
    let request = if args.audio_only {
        session.audio_request(&selection)?
    } else {
        session.combined_request(&selection)?
    };

    if args.print_url {
        println!("{}", service.download_url(&request)?);
        return Ok(());
    }

    println!("Downloading {}...", request.kind());
    let path = download(&service, &request, &view.title, &args).await?;
    println!("✓ Saved to: {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e.downcast_ref::<YtteError>() {
                Some(err) if err.is_user_input() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
