//! Fidget Sentinel CLI
//!
//! Runs the fusion loop over a recorded pose stream and an optional frame
//! directory, talking to a live emotion service.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossbeam_channel::bounded;
use fidget_sentinel::{
    config::Config,
    emotion_client::{EmotionClient, EmotionDispatcher, SubscribeRequest},
    face::{FacePipeline, NoopFaceDetector},
    fusion::{FusionLoop, LoopChannels, StopReason},
    source::{DirectoryFrameSource, FrameSource, NoopFrameSource, ReplayConfig, ReplayLandmarkSource},
    stats::{create_shared_stats, SharedSessionStats},
    TerminalRenderer, SESSION_NOTICE, VERSION,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fidget-sentinel")]
#[command(version = VERSION)]
#[command(about = "Real-time fidgeting alerts and facial-expression display", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fusion loop
    Run {
        /// Pose recording to replay (JSON lines, one landmark list per frame)
        #[arg(long)]
        landmarks: PathBuf,

        /// Directory of still frames to use as the video feed
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Emotion service WebSocket URL
        #[arg(long)]
        service_url: Option<String>,

        /// Pose replay rate in frames per second
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Restart the pose recording when it ends
        #[arg(long)]
        loop_replay: bool,
    },

    /// Show the effective configuration
    Config,

    /// Print a sample emotion service request
    Protocol,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            landmarks,
            frames,
            service_url,
            fps,
            loop_replay,
        } => cmd_run(landmarks, frames, service_url, fps, loop_replay),
        Commands::Config => cmd_config(),
        Commands::Protocol => cmd_protocol(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn cmd_run(
    landmarks: PathBuf,
    frames: Option<PathBuf>,
    service_url: Option<String>,
    fps: f64,
    loop_replay: bool,
) -> anyhow::Result<()> {
    println!("Fidget Sentinel v{VERSION}");
    println!("{SESSION_NOTICE}");

    let mut config = Config::default();
    if let Some(url) = service_url {
        config.emotion_service.url = url;
    }
    config.validate()?;

    println!("  Pose recording: {}", landmarks.display());
    match &frames {
        Some(dir) => println!("  Frames: {}", dir.display()),
        None => println!("  Frames: none (face path idle)"),
    }
    println!("  Emotion service: {}", config.emotion_service.url);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let stats = create_shared_stats();
    tracing::info!("Session {}", stats.session_id());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("emotion-client")
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    let (reply_tx, reply_rx) = crossbeam_channel::unbounded();
    let client = EmotionClient::new(config.emotion_service.clone())?;
    let dispatcher = EmotionDispatcher::new(client, runtime.handle().clone(), reply_tx);

    let mut source = ReplayLandmarkSource::new(ReplayConfig {
        path: landmarks,
        fps,
        repeat: loop_replay,
    });
    source.start().context("Failed to start pose replay")?;

    let (shutdown_tx, shutdown_rx) = bounded(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("Error setting Ctrl+C handler")?;

    let channels = LoopChannels {
        poses: source.receiver().clone(),
        predictions: reply_rx,
        shutdown: shutdown_rx,
    };

    let reason = match frames {
        Some(dir) => {
            let frames = DirectoryFrameSource::new(&dir, config.capture.width, config.capture.height)
                .context("Failed to open frame directory")?;
            run_loop(&config, frames, dispatcher, &channels, stats.clone())
        }
        None => run_loop(&config, NoopFrameSource::new(), dispatcher, &channels, stats.clone()),
    };

    println!();
    match reason {
        StopReason::Shutdown => println!("Stopping..."),
        StopReason::LandmarksEnded => println!("Pose recording finished."),
    }
    source.stop();
    // In-flight requests are abandoned; their replies have nowhere to go.
    runtime.shutdown_timeout(Duration::from_secs(1));

    println!();
    println!("{}", stats.report());
    Ok(())
}

fn run_loop<F: FrameSource>(
    config: &Config,
    frames: F,
    dispatcher: EmotionDispatcher,
    channels: &LoopChannels,
    stats: SharedSessionStats,
) -> StopReason {
    let pipeline = FacePipeline::new(frames, NoopFaceDetector, dispatcher);
    let mut fusion = FusionLoop::new(config, pipeline, TerminalRenderer::stdout(), stats);
    fusion.run(channels)
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("{}", config.to_json()?);
    Ok(())
}

fn cmd_protocol() -> anyhow::Result<()> {
    let request = SubscribeRequest::new("data:image/jpeg;base64,<frame>");
    println!("Request:");
    println!("{}", serde_json::to_string_pretty(&request)?);
    println!();
    println!("Expected reply:");
    println!(
        r#"{{"predictions": {{"angry": 0.8, "neutral": 0.1, "happy": 0.0, "fear": 0.0, "surprise": 0.05, "sad": 0.05, "disgust": 0.0}}, "emotion": "angry"}}"#
    );
    println!("or");
    println!(r#"{{"error": "No face detected"}}"#);
    Ok(())
}
