//! Feed Walker CLI
//!
//! Walks a scene feed through the navigator and prints every scene it lands
//! on. Useful for checking paging against a live API or a fixture file.
//!
//! Usage:
//!   cargo run --features cli --bin feed_walk -- --feed global --steps 10
//!
//! Examples:
//!   # Walk a handle's timeline, then step back three scenes
//!   cargo run --features cli --bin feed_walk -- --feed handle:nasa --steps 8 --back 3
//!
//!   # Offline, against a JSON fixture
//!   cargo run --features cli --bin feed_walk -- --fixture demos/feed.json --feed nearby:64f1

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use constellations_nav::{
    HttpSceneBackend, InProcessBackend, Navigator, NavigatorConfig, Scene, SceneBackend, SceneId,
};

/// Where to start walking
#[derive(Debug, Clone)]
enum StartFeed {
    Global,
    Handle(String),
    Nearby(SceneId),
    Scene(SceneId),
}

fn parse_feed(s: &str) -> std::result::Result<StartFeed, String> {
    match s.split_once(':') {
        None if s == "global" => Ok(StartFeed::Global),
        Some(("handle", h)) if !h.is_empty() => Ok(StartFeed::Handle(h.to_string())),
        Some(("nearby", id)) if !id.is_empty() => Ok(StartFeed::Nearby(SceneId::from(id))),
        Some(("scene", id)) if !id.is_empty() => Ok(StartFeed::Scene(SceneId::from(id))),
        _ => Err(format!(
            "unknown feed {s:?}: expected global, handle:<name>, nearby:<id> or scene:<id>"
        )),
    }
}

/// Walk a Constellations scene feed
#[derive(Parser, Debug)]
#[command(name = "feed_walk")]
#[command(about = "Step through a scene feed and print each scene")]
struct Args {
    /// Feed to walk: global, handle:<name>, nearby:<scene-id> or scene:<scene-id>
    #[arg(long, short = 'f', default_value = "global", value_parser = parse_feed)]
    feed: StartFeed,

    /// Scenes to step forward
    #[arg(long, short = 's', default_value_t = 5)]
    steps: usize,

    /// Scenes to step back afterwards
    #[arg(long, short = 'b', default_value_t = 0)]
    back: usize,

    /// Navigator config (YAML); defaults come from CONSTELLATIONS_* env vars
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Serve scenes from a JSON fixture instead of the API
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Print scenes as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "constellations_nav=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => NavigatorConfig::from_file(path)?,
        None => NavigatorConfig::from_env()?,
    };

    let backend: Arc<dyn SceneBackend> = match &args.fixture {
        Some(path) => Arc::new(InProcessBackend::from_fixture_file(path)?),
        None => Arc::new(HttpSceneBackend::new(&config)?),
    };

    tracing::info!(api_url = %config.api_url, feed = ?args.feed, "starting feed walk");
    let nav = Navigator::new(backend.clone(), config);

    match &args.feed {
        StartFeed::Global => {
            nav.use_global_timeline().await?;
        }
        StartFeed::Handle(handle) => {
            nav.use_handle_timeline(handle).await?;
        }
        StartFeed::Nearby(base) => {
            nav.use_nearby_timeline(base).await?;
        }
        StartFeed::Scene(id) => {
            let scene = backend
                .scene(id)
                .await
                .with_context(|| format!("fetching scene {id}"))?;
            let Some(scene) = scene else {
                bail!("scene {id} not found");
            };
            nav.setup_for_single_scene(scene).await?;
            if let Some(scene) = nav.current_scene() {
                print_scene(&scene, args.json)?;
            }
        }
    }

    for _ in 0..args.steps {
        if nav.move_forward(1).await? == 0 {
            tracing::info!("end of feed");
            break;
        }
        if let Some(scene) = nav.current_scene() {
            print_scene(&scene, args.json)?;
        }
    }

    for _ in 0..args.back {
        if nav.move_back(1) == 0 {
            break;
        }
        if let Some(scene) = nav.current_scene() {
            print_scene(&scene, args.json)?;
        }
    }

    let cursor = nav.cursor_state();
    tracing::info!(
        position = ?cursor.position,
        history = cursor.len,
        cached = nav.cache_len(),
        buffered = nav.buffered_ids().len(),
        "walk finished"
    );
    Ok(())
}

fn print_scene(scene: &Scene, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(scene)?);
    } else {
        println!(
            "{:<26} @{:<16} ra={:>8.4} dec={:>8.4}  {}",
            scene.id,
            scene.handle.handle,
            scene.place.ra_rad,
            scene.place.dec_rad,
            scene.text.lines().next().unwrap_or_default()
        );
    }
    Ok(())
}
