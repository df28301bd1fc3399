//! Interview Proctor - Replay Runner
//!
//! Replays a recorded JSON-lines session script against the monitoring core
//! and prints the disposition.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use proctor_core::constants;
use proctor_core::logic::config::MonitoringConfig;
use proctor_core::logic::enforcement::LoggingHost;
use proctor_core::logic::face::SyntheticFrameSource;
use proctor_core::logic::replay::ReplayScript;
use proctor_core::logic::report::{DispositionSink, FlagClient, FlagConfig, LogSink};
use proctor_core::logic::session::{Collaborators, Session};

#[derive(Debug, Parser)]
#[command(name = "proctor-replay", version, about = "Replay a recorded proctoring session")]
struct Args {
    /// JSON-lines session script
    script: PathBuf,

    /// Monitoring config file (JSON); defaults plus PROCTOR_* env otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the earlier 8 / 10 threshold policy
    #[arg(long, conflicts_with = "config")]
    legacy: bool,

    #[arg(long, default_value = "replay")]
    interview_id: String,

    /// POST non-completed dispositions to the interview backend
    #[arg(long)]
    report: bool,

    /// Overrides PROCTOR_BACKEND_URL
    #[arg(long)]
    backend_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting {} v{} (replay)...", constants::APP_NAME, constants::APP_VERSION);

    let script = ReplayScript::load(&args.script)?;
    log::info!("Loaded {} script steps from {}", script.len(), args.script.display());

    let mut config = match (&args.config, args.legacy) {
        (Some(path), _) => MonitoringConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, true) => MonitoringConfig::legacy(),
        (None, false) => MonitoringConfig::from_env(),
    };
    config.detector = script.detector_config(&config.detector);

    let sink: Arc<dyn DispositionSink> = if args.report {
        let flag_config = FlagConfig {
            backend_url: args.backend_url.clone().unwrap_or_else(constants::get_backend_url),
            ..Default::default()
        };
        Arc::new(FlagClient::new(flag_config)?)
    } else {
        Arc::new(LogSink)
    };

    let session = Session::spawn(
        args.interview_id.clone(),
        config,
        Collaborators {
            host: Arc::new(LoggingHost),
            detector: None,
            frames: Box::new(SyntheticFrameSource::new(320, 240)),
            // delivered below so the process outlives the request
            sink: None,
        },
    )?;

    let disposition = script.run(&session).await?;
    if let Err(e) = sink.deliver(&disposition).await {
        log::error!("Disposition delivery via '{}' failed: {}", sink.name(), e);
    }

    println!("{}", serde_json::to_string_pretty(&disposition)?);
    Ok(())
}
