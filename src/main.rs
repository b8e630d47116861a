//! framecast CLI: stream a video file to a Frame device

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use framecast::{StreamConfig, VideoStreamer};

#[derive(Parser)]
#[command(name = "framecast")]
#[command(about = "Stream video to Brilliant Labs Frame glasses over BLE")]
#[command(version)]
struct Cli {
    /// Path to the video file to stream
    video_file: PathBuf,

    /// Width to resize the video to
    #[arg(long, default_value = "128")]
    width: u16,

    /// Height to resize the video to
    #[arg(long, default_value = "80")]
    height: u16,

    /// Target frames per second
    #[arg(long, default_value = "14")]
    fps: u32,

    /// Advertised name prefix of the device to connect to
    #[arg(long, default_value = "Frame")]
    device_name: String,

    /// Skip re-uploading the receiver app (assume a previous run left it installed)
    #[arg(long)]
    keep_app: bool,

    /// Render sprite lines as they arrive instead of per complete frame
    #[arg(long)]
    progressive: bool,

    /// Path to the ffmpeg binary (default: search PATH)
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Path to the ffprobe binary (default: search PATH)
    #[arg(long)]
    ffprobe: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "framecast=debug" } else { "framecast=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if !cli.video_file.is_file() {
        error!("Video file not found: {}", cli.video_file.display());
        return ExitCode::FAILURE;
    }

    let mut config = StreamConfig::default()
        .dimensions(cli.width, cli.height)
        .fps_limit(cli.fps)
        .device_name(cli.device_name);
    if cli.keep_app {
        config = config.keep_app();
    }
    if cli.progressive {
        config = config.progressive();
    }
    config.ffmpeg_path = cli.ffmpeg;
    config.ffprobe_path = cli.ffprobe;

    let (mut streamer, mut events) = VideoStreamer::new(&cli.video_file, config);

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                framecast::StreamEvent::Progress(p) => {
                    info!(
                        frames = p.frames_sent,
                        fps = p.fps,
                        kbps = p.bitrate / 1000,
                        "Streaming"
                    );
                }
                other => info!("{:?}", other),
            }
        }
    });

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Interrupted");
    };

    match streamer.run_until(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
