// src/main.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};

use mirror_pk::application::commands::*;
use mirror_pk::application::dto::ChooseOpponentDto;
use mirror_pk::application::state::AppState;
use mirror_pk::config::ClientConfig;
use mirror_pk::events::{MatchResolved, ProgressUpdated};
use mirror_pk::integrations::StillFrameCamera;
use mirror_pk::services::{CameraDevice, Identity, InMemorySession};

#[derive(Parser)]
#[command(name = "mirror-pk", version, about = "Score a photo and challenge ranked users")]
struct Cli {
    /// Bearer token for the API
    #[arg(long, env = "MIRROR_PK_TOKEN", global = true)]
    token: Option<String>,

    /// Your user id, used to refuse matches against yourself
    #[arg(long, env = "MIRROR_PK_USER_ID", global = true)]
    user_id: Option<i64>,

    /// Do not publish the score to the ranking
    #[arg(long, global = true)]
    private: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args)]
struct PhotoSource {
    /// JPEG or PNG file to score
    #[arg(required_unless_present = "camera", conflicts_with = "camera")]
    image: Option<PathBuf>,

    /// Treat an image file as a camera feed and capture a framed portrait from it
    #[arg(long, value_name = "FEED")]
    camera: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Score a photo
    Score {
        #[command(flatten)]
        source: PhotoSource,
    },

    /// Score a photo, then play a match against a ranked opponent
    Match {
        #[command(flatten)]
        source: PhotoSource,

        #[arg(long)]
        opponent_id: i64,

        /// Score record the ranking list shows for the opponent
        #[arg(long)]
        opponent_score_id: i64,

        #[arg(long, default_value = "opponent")]
        opponent_name: String,

        #[arg(long, default_value_t = 0.0)]
        opponent_score: f64,

        #[arg(long, default_value_t = 0)]
        opponent_rank: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,mirror_pk=debug"),
    )
    .init();

    let cli = Cli::parse();

    // 1. CONFIGURATION
    let mut config = ClientConfig::from_env();
    if cli.private {
        config.publish_scores = false;
    }

    // 2. SESSION
    let session = Arc::new(match cli.user_id {
        Some(user_id) => InMemorySession::signed_in(
            Identity {
                user_id,
                display_name: format!("user-{}", user_id),
            },
            cli.token.clone(),
        ),
        None => InMemorySession::anonymous(),
    });
    if cli.user_id.is_none() && cli.token.is_some() {
        log::warn!("--token ignored without --user-id");
    }

    // 3. APPLICATION STATE
    let source = match &cli.cmd {
        Command::Score { source } | Command::Match { source, .. } => source,
    };
    let mut state = AppState::new(config, session).context("failed to build API client")?;
    if let Some(feed) = &source.camera {
        let camera = StillFrameCamera::from_path(feed)
            .with_context(|| format!("failed to load camera feed {}", feed.display()))?;
        state = state.with_camera(CameraDevice::new("still-feed", Arc::new(camera)));
    }

    // 4. EVENT WIRING
    let progress_log = state
        .event_bus
        .subscribe::<ProgressUpdated, _>(|event| log::info!("{}: {}%", event.stage, event.percent));
    state.event_bus.subscribe::<MatchResolved, _>(|event| {
        log::info!("Match against {} resolved: {}", event.opponent_id, event.result)
    });

    // 5. RUN
    let acquired = match &source.image {
        Some(path) => select_image(&state, &path.to_string_lossy()),
        None => capture_photo(&state).await,
    };
    acquired.map_err(|e| anyhow!(e))?;

    let score = submit_score(&state).await.map_err(|e| anyhow!(e))?;
    log::info!("Face score {}", score.face_score);

    if let Command::Match {
        opponent_id,
        opponent_score_id,
        opponent_name,
        opponent_score,
        opponent_rank,
        ..
    } = &cli.cmd
    {
        choose_opponent(
            &state,
            ChooseOpponentDto {
                opponent_id: *opponent_id,
                display_name: opponent_name.clone(),
                score: *opponent_score,
                rank: *opponent_rank,
                score_id: *opponent_score_id,
                avatar_ref: None,
                image_url: None,
            },
        )
        .map_err(|e| anyhow!(e))?;

        start_match(&state).await.map_err(|e| anyhow!(e))?;
    }

    state.event_bus.unsubscribe(progress_log);
    println!("{}", serde_json::to_string_pretty(&get_workflow(&state))?);
    Ok(())
}
